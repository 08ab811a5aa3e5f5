// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Staleness propagation.
//!
//! Data changes mark the narrowest affected aggregate; the wider levels
//! are marked only when a child rebuild actually lands. The cascade is:
//!
//! - raw record change -> owning day report(s)
//! - invoice change -> owning month and year reports (invoices skip days)
//! - day rebuilt -> owning month and year reports
//! - year rebuilt -> master report
//!
//! A moved record (timestamp or jobsite edit) touches two days; callers
//! pass both the before and after coordinates and each affected day is
//! marked.

use crate::error::EngineError;
use crate::{Db, lock_db};
use chrono::{DateTime, NaiveDate, Utc};
use sitecost_domain::{AggregateRef, normalize_day};
use tracing::info;

/// Marks the day reports owning the given UTC instants stale.
///
/// Each instant is normalized to its calendar day in the organization
/// timezone. For a moved record, pass both the old and new `(jobsite,
/// instant)` pairs through separate calls or a combined slice.
///
/// # Errors
///
/// Returns an error if the organization timezone is missing or a store
/// write fails.
pub fn note_raw_change(
    db: &Db,
    changes: &[(i64, DateTime<Utc>)],
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut persistence = lock_db(db)?;
    let timezone = persistence.org_config()?.parsed_timezone()?;

    let mut marked: Vec<(i64, NaiveDate)> = Vec::with_capacity(changes.len());
    for (jobsite_id, instant) in changes {
        let day: NaiveDate = normalize_day(*instant, timezone);
        if marked.contains(&(*jobsite_id, day)) {
            continue;
        }
        persistence.mark_requested(&AggregateRef::day(*jobsite_id, day), now)?;
        info!(jobsite_id, %day, "day report marked stale");
        marked.push((*jobsite_id, day));
    }
    Ok(())
}

/// Marks the month and year reports owning the given invoice dates stale.
///
/// Invoices never flow through the day level, so a date change marks the
/// periods directly. For a re-dated invoice, pass both the old and new
/// dates.
///
/// # Errors
///
/// Returns an error if a store write fails.
pub fn note_invoice_change(
    db: &Db,
    changes: &[(i64, NaiveDate)],
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut persistence = lock_db(db)?;
    for (jobsite_id, invoice_date) in changes {
        persistence.mark_requested(&AggregateRef::month(*jobsite_id, *invoice_date), now)?;
        persistence.mark_requested(&AggregateRef::year(*jobsite_id, *invoice_date), now)?;
        info!(jobsite_id, %invoice_date, "period reports marked stale for invoice change");
    }
    Ok(())
}

/// Cascades a landed day rebuild to the owning month and year reports.
///
/// # Errors
///
/// Returns an error if a store write fails.
pub fn after_day_rebuilt(
    db: &Db,
    jobsite_id: i64,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut persistence = lock_db(db)?;
    persistence.mark_requested(&AggregateRef::month(jobsite_id, day), now)?;
    persistence.mark_requested(&AggregateRef::year(jobsite_id, day), now)?;
    Ok(())
}

/// Cascades a landed year rebuild to the master report.
///
/// # Errors
///
/// Returns an error if a store write fails.
pub fn after_year_rebuilt(
    db: &Db,
    fiscal_year: i32,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut persistence = lock_db(db)?;
    persistence.mark_requested(&AggregateRef::master(fiscal_year), now)?;
    Ok(())
}

/// Marks a single aggregate stale on explicit operator request.
///
/// # Errors
///
/// Returns an error if a store write fails.
pub fn request_rebuild(
    db: &Db,
    aggregate: &AggregateRef,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let mut persistence = lock_db(db)?;
    persistence.mark_requested(aggregate, now)?;
    info!(level = %aggregate.level, jobsite_id = aggregate.jobsite_id,
        period_start = %aggregate.period_start, "rebuild requested");
    Ok(())
}
