// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read and notification facade over the report store.
//!
//! Reads never block on rebuilds: a stale aggregate returns its last
//! built document together with the staleness state, and a never-built
//! aggregate returns `None`. Writers go through the [`propagator`]
//! functions so every data change lands as a staleness mark.

use crate::error::EngineError;
use crate::{Db, lock_db, propagator};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sitecost_domain::{
    AggregateRef, DayReport, Granularity, MasterReport, PeriodReport, StalenessState,
};
use sitecost_persistence::{PersistenceError, ReportRow};

/// A stored report document together with its freshness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatus<T> {
    /// Current staleness state of the aggregate.
    pub staleness: StalenessState,
    /// When the returned document was built, if one has landed.
    pub built_at: Option<DateTime<Utc>>,
    /// The last built document. Stale documents are still returned.
    pub document: Option<T>,
}

/// Facade the HTTP layer and the notification endpoints talk to.
#[derive(Clone)]
pub struct ReportService {
    db: Db,
}

impl ReportService {
    /// Creates a service over the shared persistence handle.
    #[must_use]
    pub const fn new(db: Db) -> Self {
        Self { db }
    }

    /// Fetches the day report for a `(jobsite, day)` pair.
    ///
    /// Returns `None` if the aggregate has never been marked or built.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is corrupt.
    pub fn get_day_report(
        &self,
        jobsite_id: i64,
        day: NaiveDate,
    ) -> Result<Option<ReportStatus<DayReport>>, EngineError> {
        self.fetch(&AggregateRef::day(jobsite_id, day))
    }

    /// Fetches the month or year report containing the given day.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is corrupt.
    pub fn get_period_report(
        &self,
        jobsite_id: i64,
        granularity: Granularity,
        day: NaiveDate,
    ) -> Result<Option<ReportStatus<PeriodReport>>, EngineError> {
        self.fetch(&AggregateRef::period(jobsite_id, granularity, day))
    }

    /// Fetches the cross-jobsite master report for a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is corrupt.
    pub fn get_master_report(
        &self,
        fiscal_year: i32,
    ) -> Result<Option<ReportStatus<MasterReport>>, EngineError> {
        self.fetch(&AggregateRef::master(fiscal_year))
    }

    /// Marks the day reports owning the given UTC instants stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization timezone is missing or a
    /// store write fails.
    pub fn notify_raw_change(
        &self,
        changes: &[(i64, DateTime<Utc>)],
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        propagator::note_raw_change(&self.db, changes, now)
    }

    /// Marks the month and year reports owning the given invoice dates
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns an error if a store write fails.
    pub fn notify_invoice_change(
        &self,
        changes: &[(i64, NaiveDate)],
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        propagator::note_invoice_change(&self.db, changes, now)
    }

    /// Marks a single aggregate stale on explicit operator request.
    ///
    /// # Errors
    ///
    /// Returns an error if a store write fails.
    pub fn request_rebuild(
        &self,
        aggregate: &AggregateRef,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        propagator::request_rebuild(&self.db, aggregate, now)
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        aggregate: &AggregateRef,
    ) -> Result<Option<ReportStatus<T>>, EngineError> {
        let row: Option<ReportRow> = {
            let mut persistence = lock_db(&self.db)?;
            persistence.find_report(aggregate)?
        };
        row.map(status_from_row).transpose()
    }
}

fn status_from_row<T: DeserializeOwned>(row: ReportRow) -> Result<ReportStatus<T>, EngineError> {
    let staleness: StalenessState = row.staleness()?;
    let built_at: Option<DateTime<Utc>> = row
        .built_at
        .as_deref()
        .map(parse_built_at)
        .transpose()?;
    let document: Option<T> = match row.document_json {
        Some(ref json) => Some(serde_json::from_str(json)?),
        None => None,
    };
    Ok(ReportStatus {
        staleness,
        built_at,
        document,
    })
}

fn parse_built_at(value: &str) -> Result<DateTime<Utc>, EngineError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            EngineError::Persistence(PersistenceError::InvalidStoredValue(format!(
                "invalid built_at timestamp '{value}': {err}"
            )))
        })
}
