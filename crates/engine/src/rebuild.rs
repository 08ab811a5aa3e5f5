// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Single-aggregate rebuild execution.
//!
//! A rebuild is claim -> assemble inputs -> run the pure builder -> settle.
//! The builders are deterministic, so a rebuild that runs twice (retry,
//! reclaim) writes the same document. A failed build releases the claim and
//! leaves the previous document in place.

use crate::error::EngineError;
use crate::{Db, lock_db, propagator};
use chrono::{DateTime, NaiveDate, Utc};
use sitecost_core::{
    DayInputs, PeriodBuildOutcome, build_day_report, build_master_report, build_period_report,
};
use sitecost_domain::{
    AggregateLevel, AggregateRef, ConfigSnapshot, Granularity, OrgConfig, day_bounds_utc,
    normalize_day, period_end,
};
use sitecost_persistence::{CompleteOutcome, Persistence};
use tracing::info;

/// The result of attempting one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The document was rebuilt and the aggregate settled in this state.
    Settled(sitecost_domain::StalenessState),
    /// Another worker holds or won the claim; nothing was done.
    ClaimLost,
}

/// Claims and rebuilds one aggregate by report id.
///
/// Every attempt fires the staleness cascade: a day rebuild marks its
/// month and year stale, a year rebuild marks the master stale. Failed
/// attempts cascade too, since the attempt itself signals the wider
/// periods may be out of date.
///
/// # Errors
///
/// Returns an error if input assembly or the build fails; the claim is
/// released first so the aggregate stays queued.
pub fn rebuild_one(
    db: &Db,
    report_id: i64,
    now: DateTime<Utc>,
) -> Result<RebuildOutcome, EngineError> {
    let (aggregate, claim_token): (AggregateRef, String) = {
        let mut persistence = lock_db(db)?;
        let Some(row) = persistence.report_by_id(report_id)? else {
            return Ok(RebuildOutcome::ClaimLost);
        };
        let aggregate: AggregateRef = row.aggregate_ref()?;
        match persistence.claim(report_id, now)? {
            Some(token) => (aggregate, token),
            None => return Ok(RebuildOutcome::ClaimLost),
        }
    };

    let built = {
        let mut persistence = lock_db(db)?;
        assemble_and_build(&mut persistence, &aggregate, now)
    };

    let (document_json, orphan_ids) = match built {
        Ok(result) => result,
        Err(err) => {
            {
                let mut persistence = lock_db(db)?;
                persistence.fail_rebuild(report_id, &claim_token)?;
            }
            // Inputs may have shifted under the failed attempt, so the
            // owning periods are marked stale even though nothing landed.
            cascade(db, &aggregate, now)?;
            return Err(err);
        }
    };

    let outcome: CompleteOutcome = {
        let mut persistence = lock_db(db)?;
        persistence.delete_reports(&orphan_ids)?;
        persistence.complete_rebuild(report_id, &claim_token, &document_json, now)?
    };

    match outcome {
        CompleteOutcome::Settled(state) => {
            info!(level = %aggregate.level, jobsite_id = aggregate.jobsite_id,
                period_start = %aggregate.period_start, state = %state, "rebuild landed");
            cascade(db, &aggregate, now)?;
            Ok(RebuildOutcome::Settled(state))
        }
        CompleteOutcome::ClaimLost => Ok(RebuildOutcome::ClaimLost),
    }
}

/// Fires the upward staleness cascade for a landed rebuild.
fn cascade(db: &Db, aggregate: &AggregateRef, now: DateTime<Utc>) -> Result<(), EngineError> {
    match aggregate.level {
        AggregateLevel::Day => {
            propagator::after_day_rebuilt(db, aggregate.jobsite_id, aggregate.period_start, now)
        }
        AggregateLevel::Year => propagator::after_year_rebuilt(db, aggregate.fiscal_year(), now),
        AggregateLevel::Month | AggregateLevel::Master => Ok(()),
    }
}

/// Assembles inputs and runs the builder for one aggregate.
///
/// Returns the serialized document plus orphan day-report ids to delete
/// (period builds only).
fn assemble_and_build(
    persistence: &mut Persistence,
    aggregate: &AggregateRef,
    now: DateTime<Utc>,
) -> Result<(String, Vec<i64>), EngineError> {
    match aggregate.level {
        AggregateLevel::Day => build_day(persistence, aggregate),
        AggregateLevel::Month => build_period(persistence, aggregate, Granularity::Month, now),
        AggregateLevel::Year => build_period(persistence, aggregate, Granularity::Year, now),
        AggregateLevel::Master => build_master(persistence, aggregate, now),
    }
}

fn build_day(
    persistence: &mut Persistence,
    aggregate: &AggregateRef,
) -> Result<(String, Vec<i64>), EngineError> {
    let config: OrgConfig = persistence.org_config()?;
    let timezone = config.parsed_timezone()?;
    let day: NaiveDate = aggregate.period_start;
    let (start, end) = day_bounds_utc(day, timezone)?;

    let employee_work = persistence.employee_work_between(aggregate.jobsite_id, start, end)?;
    let vehicle_work = persistence.vehicle_work_between(aggregate.jobsite_id, start, end)?;
    let shipments = persistence.shipments_between(aggregate.jobsite_id, start, end)?;
    let production = persistence.production_between(aggregate.jobsite_id, start, end)?;

    let employee_ids: Vec<i64> = distinct(employee_work.iter().map(|r| r.employee_id));
    let vehicle_ids: Vec<i64> = distinct(vehicle_work.iter().map(|r| r.vehicle_id));
    let material_ids: Vec<i64> = distinct(shipments.iter().map(|s| s.jobsite_material_id));
    let inputs: DayInputs = DayInputs {
        employee_rates: persistence.employee_rate_tables(&employee_ids)?,
        vehicle_rates: persistence.vehicle_rate_tables(&vehicle_ids)?,
        materials: persistence.materials_by_ids(&material_ids)?,
        employee_work,
        vehicle_work,
        shipments,
        production,
    };

    let report = build_day_report(aggregate.jobsite_id, day, &inputs)?;
    Ok((serde_json::to_string(&report)?, Vec::new()))
}

fn build_period(
    persistence: &mut Persistence,
    aggregate: &AggregateRef,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Result<(String, Vec<i64>), EngineError> {
    let config: OrgConfig = persistence.org_config()?;
    let snapshot: ConfigSnapshot = config.snapshot_as_of(aggregate.period_start)?;
    let end: NaiveDate = period_end(aggregate.level, aggregate.period_start)?;

    let day_reports =
        persistence.day_reports_in_period(aggregate.jobsite_id, aggregate.period_start, end)?;
    let invoices =
        persistence.invoices_between(aggregate.jobsite_id, aggregate.period_start, end)?;
    let as_of: NaiveDate = normalize_day(now, snapshot.timezone);

    let outcome: PeriodBuildOutcome = build_period_report(
        aggregate.jobsite_id,
        granularity,
        aggregate.period_start,
        &day_reports,
        &invoices,
        &snapshot,
        as_of,
    )?;
    Ok((
        serde_json::to_string(&outcome.report)?,
        outcome.orphan_day_report_ids,
    ))
}

fn build_master(
    persistence: &mut Persistence,
    aggregate: &AggregateRef,
    now: DateTime<Utc>,
) -> Result<(String, Vec<i64>), EngineError> {
    let year_end: NaiveDate = period_end(AggregateLevel::Year, aggregate.period_start)?;

    // A jobsite with day activity in the fiscal year gets a year report row
    // even if no change has reached the year level yet; the placeholder is
    // queued and its figures land through the normal rebuild path.
    let jobsite_ids: Vec<i64> =
        persistence.active_day_jobsites(aggregate.period_start, year_end)?;
    for jobsite_id in jobsite_ids {
        persistence.ensure_report(&AggregateRef::year(jobsite_id, aggregate.period_start), now)?;
    }

    let year_reports: Vec<(i64, i64)> = persistence.year_report_refs(aggregate.period_start)?;
    let report = build_master_report(aggregate.fiscal_year(), &year_reports);
    Ok((serde_json::to_string(&report)?, Vec::new()))
}

fn distinct<I: Iterator<Item = i64>>(ids: I) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
