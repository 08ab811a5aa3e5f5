// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report store mutations: staleness transitions and document writes.
//!
//! Every transition is a conditional UPDATE filtered on the current state,
//! so concurrent workers race safely through the database instead of
//! through in-process locks. A claim stamps `claimed_at`; that stamp acts
//! as a claim token, and completion is guarded on it so a worker that lost
//! its claim to a stall reclaim can never clobber a newer rebuild.

use crate::data_models::{NewReportRow, format_date, format_datetime};
use crate::diesel_schema::reports;
use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use sitecost_domain::{AggregateRef, StalenessState};

/// The result of completing a claimed rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// The document was stored and the aggregate settled in this state.
    Settled(StalenessState),
    /// The claim was lost (stall reclaim) and nothing was written.
    ClaimLost,
}

/// Ensures a placeholder row exists for an aggregate.
///
/// New rows start `Requested`; an existing row is left untouched. The
/// unique key on `(level, jobsite, period_start)` makes this race-free
/// under concurrent callers.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn ensure_report(
    conn: &mut SqliteConnection,
    aggregate: &AggregateRef,
    now: DateTime<Utc>,
) -> Result<(), PersistenceError> {
    let row: NewReportRow = NewReportRow {
        level: aggregate.level.as_str().to_string(),
        jobsite_id: aggregate.jobsite_id,
        period_start: format_date(aggregate.period_start),
        staleness_state: StalenessState::Requested.as_str().to_string(),
        requested_while_pending: 0,
        created_at: format_datetime(now),
    };
    diesel::insert_into(reports::table)
        .values(&row)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

/// Marks an aggregate stale, creating its row if needed.
///
/// - No row: a `Requested` placeholder is inserted.
/// - `Current`: flips to `Requested`.
/// - `Pending`: the re-request flag is set so the in-flight rebuild
///   requeues itself on completion instead of going `Current`.
/// - `Requested`: already queued, nothing to do.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn mark_requested(
    conn: &mut SqliteConnection,
    aggregate: &AggregateRef,
    now: DateTime<Utc>,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        ensure_report(conn, aggregate, now)?;

        let level: &str = aggregate.level.as_str();
        let period_start: String = format_date(aggregate.period_start);

        diesel::update(
            reports::table
                .filter(reports::level.eq(level))
                .filter(reports::jobsite_id.eq(aggregate.jobsite_id))
                .filter(reports::period_start.eq(&period_start))
                .filter(reports::staleness_state.eq(StalenessState::Current.as_str())),
        )
        .set(reports::staleness_state.eq(StalenessState::Requested.as_str()))
        .execute(conn)?;

        diesel::update(
            reports::table
                .filter(reports::level.eq(level))
                .filter(reports::jobsite_id.eq(aggregate.jobsite_id))
                .filter(reports::period_start.eq(&period_start))
                .filter(reports::staleness_state.eq(StalenessState::Pending.as_str())),
        )
        .set(reports::requested_while_pending.eq(1))
        .execute(conn)?;

        Ok(())
    })
}

/// Atomically claims a `Requested` aggregate for rebuild.
///
/// Returns the claim token (the stamped `claimed_at` value) on success, or
/// `None` if another worker won the race or the row was not `Requested`.
/// A fresh claim clears the re-request flag: the rebuild about to run will
/// observe all data written so far.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn claim(
    conn: &mut SqliteConnection,
    report_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<String>, PersistenceError> {
    let token: String = format_datetime(now);
    let updated: usize = diesel::update(
        reports::table
            .filter(reports::report_id.eq(report_id))
            .filter(reports::staleness_state.eq(StalenessState::Requested.as_str())),
    )
    .set((
        reports::staleness_state.eq(StalenessState::Pending.as_str()),
        reports::claimed_at.eq(Some(token.clone())),
        reports::requested_while_pending.eq(0),
    ))
    .execute(conn)?;

    Ok((updated == 1).then_some(token))
}

/// Stores a rebuilt document and settles the claim.
///
/// The document write and the state flip happen in one transaction. If a
/// re-request arrived mid-rebuild the aggregate goes back to `Requested`
/// (the document is still stored; it is simply already stale). If the
/// claim token no longer matches, the claim was reclaimed and nothing is
/// written.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn complete_rebuild(
    conn: &mut SqliteConnection,
    report_id: i64,
    claim_token: &str,
    document_json: &str,
    built_at: DateTime<Utc>,
) -> Result<CompleteOutcome, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let built: String = format_datetime(built_at);

        // Re-requested mid-rebuild: store the document but requeue.
        let requeued: usize = diesel::update(
            reports::table
                .filter(reports::report_id.eq(report_id))
                .filter(reports::staleness_state.eq(StalenessState::Pending.as_str()))
                .filter(reports::claimed_at.eq(Some(claim_token)))
                .filter(reports::requested_while_pending.eq(1)),
        )
        .set((
            reports::staleness_state.eq(StalenessState::Requested.as_str()),
            reports::requested_while_pending.eq(0),
            reports::claimed_at.eq(None::<String>),
            reports::document_json.eq(Some(document_json)),
            reports::built_at.eq(Some(built.clone())),
        ))
        .execute(conn)?;
        if requeued == 1 {
            return Ok(CompleteOutcome::Settled(StalenessState::Requested));
        }

        let settled: usize = diesel::update(
            reports::table
                .filter(reports::report_id.eq(report_id))
                .filter(reports::staleness_state.eq(StalenessState::Pending.as_str()))
                .filter(reports::claimed_at.eq(Some(claim_token))),
        )
        .set((
            reports::staleness_state.eq(StalenessState::Current.as_str()),
            reports::claimed_at.eq(None::<String>),
            reports::document_json.eq(Some(document_json)),
            reports::built_at.eq(Some(built)),
        ))
        .execute(conn)?;
        if settled == 1 {
            Ok(CompleteOutcome::Settled(StalenessState::Current))
        } else {
            Ok(CompleteOutcome::ClaimLost)
        }
    })
}

/// Releases a claim after a failed rebuild, requeueing the aggregate.
///
/// The previous document (if any) is left in place.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn fail_rebuild(
    conn: &mut SqliteConnection,
    report_id: i64,
    claim_token: &str,
) -> Result<(), PersistenceError> {
    diesel::update(
        reports::table
            .filter(reports::report_id.eq(report_id))
            .filter(reports::staleness_state.eq(StalenessState::Pending.as_str()))
            .filter(reports::claimed_at.eq(Some(claim_token))),
    )
    .set((
        reports::staleness_state.eq(StalenessState::Requested.as_str()),
        reports::requested_while_pending.eq(0),
        reports::claimed_at.eq(None::<String>),
    ))
    .execute(conn)?;
    Ok(())
}

/// Requeues `Pending` claims older than the cutoff (crashed workers).
///
/// Returns the number of reclaimed aggregates.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn reclaim_stalled(
    conn: &mut SqliteConnection,
    cutoff: DateTime<Utc>,
) -> Result<usize, PersistenceError> {
    let cutoff_text: String = format_datetime(cutoff);
    Ok(diesel::update(
        reports::table
            .filter(reports::staleness_state.eq(StalenessState::Pending.as_str()))
            .filter(reports::claimed_at.lt(Some(cutoff_text))),
    )
    .set((
        reports::staleness_state.eq(StalenessState::Requested.as_str()),
        reports::requested_while_pending.eq(0),
        reports::claimed_at.eq(None::<String>),
    ))
    .execute(conn)?)
}

/// Deletes report rows by id (duplicate-day orphans).
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_reports(
    conn: &mut SqliteConnection,
    report_ids: &[i64],
) -> Result<(), PersistenceError> {
    if report_ids.is_empty() {
        return Ok(());
    }
    diesel::delete(reports::table.filter(reports::report_id.eq_any(report_ids.iter().copied())))
        .execute(conn)?;
    Ok(())
}
