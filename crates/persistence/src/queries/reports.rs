// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report store queries.

use crate::data_models::{ReportRow, format_date};
use crate::diesel_schema::reports;
use crate::error::PersistenceError;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;
use sitecost_domain::{AggregateLevel, AggregateRef, DayReport, StalenessState};

/// Fetches a report row by its aggregate reference.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_report(
    conn: &mut SqliteConnection,
    aggregate: &AggregateRef,
) -> Result<Option<ReportRow>, PersistenceError> {
    Ok(reports::table
        .filter(reports::level.eq(aggregate.level.as_str()))
        .filter(reports::jobsite_id.eq(aggregate.jobsite_id))
        .filter(reports::period_start.eq(format_date(aggregate.period_start)))
        .first::<ReportRow>(conn)
        .optional()?)
}

/// Fetches a report row by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn report_by_id(
    conn: &mut SqliteConnection,
    report_id: i64,
) -> Result<Option<ReportRow>, PersistenceError> {
    Ok(reports::table
        .filter(reports::report_id.eq(report_id))
        .first::<ReportRow>(conn)
        .optional()?)
}

/// Lists `Requested` aggregates at one level, oldest period first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn requested_reports(
    conn: &mut SqliteConnection,
    level: AggregateLevel,
    limit: i64,
) -> Result<Vec<ReportRow>, PersistenceError> {
    Ok(reports::table
        .filter(reports::level.eq(level.as_str()))
        .filter(reports::staleness_state.eq(StalenessState::Requested.as_str()))
        .order(reports::period_start.asc())
        .limit(limit)
        .load::<ReportRow>(conn)?)
}

/// Fetches built day reports for one jobsite with days in `[start, end)`.
///
/// Rows without a document (placeholders that have never been built) are
/// skipped; their days contribute nothing until their rebuild lands.
///
/// # Errors
///
/// Returns an error if the query fails or a stored document is corrupt.
pub fn day_reports_in_period(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(i64, DayReport)>, PersistenceError> {
    let rows: Vec<ReportRow> = reports::table
        .filter(reports::level.eq(AggregateLevel::Day.as_str()))
        .filter(reports::jobsite_id.eq(jobsite_id))
        .filter(reports::period_start.ge(format_date(start)))
        .filter(reports::period_start.lt(format_date(end)))
        .filter(reports::document_json.is_not_null())
        .order(reports::period_start.asc())
        .load::<ReportRow>(conn)?;

    rows.iter()
        .map(|row| Ok((row.report_id, row.document::<DayReport>()?)))
        .collect()
}

/// Fetches `(jobsite_id, report_id)` pairs for year report rows of one
/// fiscal year, placeholders included.
///
/// The master report references year rows by id, so a still-queued
/// placeholder is a valid reference; its figures land when its rebuild
/// does.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn year_report_refs(
    conn: &mut SqliteConnection,
    fiscal_year_start: NaiveDate,
) -> Result<Vec<(i64, i64)>, PersistenceError> {
    Ok(reports::table
        .filter(reports::level.eq(AggregateLevel::Year.as_str()))
        .filter(reports::period_start.eq(format_date(fiscal_year_start)))
        .order(reports::jobsite_id.asc())
        .select((reports::jobsite_id, reports::report_id))
        .load::<(i64, i64)>(conn)?)
}

/// Lists the jobsites with any day-level report row in `[start, end)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn active_day_jobsites(
    conn: &mut SqliteConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(reports::table
        .filter(reports::level.eq(AggregateLevel::Day.as_str()))
        .filter(reports::period_start.ge(format_date(start)))
        .filter(reports::period_start.lt(format_date(end)))
        .order(reports::jobsite_id.asc())
        .select(reports::jobsite_id)
        .distinct()
        .load::<i64>(conn)?)
}

/// Counts report rows currently in a given staleness state.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_in_state(
    conn: &mut SqliteConnection,
    state: StalenessState,
) -> Result<i64, PersistenceError> {
    Ok(reports::table
        .filter(reports::staleness_state.eq(state.as_str()))
        .count()
        .get_result::<i64>(conn)?)
}
