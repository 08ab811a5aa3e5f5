// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{CompleteOutcome, Persistence};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sitecost_domain::{AggregateLevel, AggregateRef, StalenessState};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn day_ref() -> AggregateRef {
    AggregateRef::day(7, date(2026, 6, 1))
}

/// Runs a full request->claim->complete cycle, leaving the aggregate
/// `Current` with a stored document.
fn settle_current(persistence: &mut Persistence, aggregate: &AggregateRef, doc: &str) -> i64 {
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(aggregate, now).unwrap();
    let row = persistence.find_report(aggregate).unwrap().unwrap();
    let token: String = persistence.claim(row.report_id, now).unwrap().unwrap();
    let outcome: CompleteOutcome = persistence
        .complete_rebuild(row.report_id, &token, doc, now)
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::Settled(StalenessState::Current));
    row.report_id
}

#[test]
fn test_mark_requested_creates_placeholder_row() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence
        .mark_requested(&day_ref(), utc("2026-06-02T00:00:00Z"))
        .unwrap();

    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    assert!(row.document_json.is_none());
}

#[test]
fn test_mark_requested_is_idempotent_for_requested_rows() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    persistence.mark_requested(&day_ref(), now).unwrap();

    assert_eq!(
        persistence.count_in_state(StalenessState::Requested).unwrap(),
        1
    );
}

#[test]
fn test_mark_requested_flips_current_back_to_requested() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    settle_current(&mut persistence, &day_ref(), "{}");

    persistence
        .mark_requested(&day_ref(), utc("2026-06-03T00:00:00Z"))
        .unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    // The stale document remains readable until the rebuild lands.
    assert_eq!(row.document_json.as_deref(), Some("{}"));
}

#[test]
fn test_claim_is_exclusive() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();

    let first: Option<String> = persistence.claim(row.report_id, now).unwrap();
    let second: Option<String> = persistence.claim(row.report_id, now).unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
}

#[test]
fn test_complete_rebuild_stores_document_and_goes_current() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let report_id: i64 = settle_current(&mut persistence, &day_ref(), "{\"x\":1}");

    let row = persistence.report_by_id(report_id).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Current);
    assert_eq!(row.document_json.as_deref(), Some("{\"x\":1}"));
    assert!(row.claimed_at.is_none());
    assert!(row.built_at.is_some());
}

#[test]
fn test_request_during_pending_requeues_on_completion() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    let token: String = persistence.claim(row.report_id, now).unwrap().unwrap();

    // New data arrives while the rebuild is in flight.
    persistence.mark_requested(&day_ref(), now).unwrap();

    let outcome: CompleteOutcome = persistence
        .complete_rebuild(row.report_id, &token, "{}", now)
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::Settled(StalenessState::Requested));

    // The document landed, but the aggregate is queued again.
    let row = persistence.report_by_id(row.report_id).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    assert_eq!(row.document_json.as_deref(), Some("{}"));
}

#[test]
fn test_fresh_claim_clears_rerequest_flag() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    let token: String = persistence.claim(row.report_id, now).unwrap().unwrap();
    persistence.mark_requested(&day_ref(), now).unwrap();
    persistence
        .complete_rebuild(row.report_id, &token, "{}", now)
        .unwrap();

    // Second cycle with no interleaved request settles Current.
    let token: String = persistence.claim(row.report_id, now).unwrap().unwrap();
    let outcome: CompleteOutcome = persistence
        .complete_rebuild(row.report_id, &token, "{}", now)
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::Settled(StalenessState::Current));
}

#[test]
fn test_fail_rebuild_requeues_and_keeps_old_document() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    settle_current(&mut persistence, &day_ref(), "{\"old\":true}");
    let now: DateTime<Utc> = utc("2026-06-03T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    let token: String = persistence.claim(row.report_id, now).unwrap().unwrap();

    persistence.fail_rebuild(row.report_id, &token).unwrap();

    let row = persistence.report_by_id(row.report_id).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    assert_eq!(row.document_json.as_deref(), Some("{\"old\":true}"));
}

#[test]
fn test_reclaim_stalled_requeues_old_claims_only() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let stale_claim: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    let fresh_claim: DateTime<Utc> = utc("2026-06-02T01:00:00Z");

    let stalled: AggregateRef = AggregateRef::day(7, date(2026, 6, 1));
    let healthy: AggregateRef = AggregateRef::day(7, date(2026, 6, 2));
    persistence.mark_requested(&stalled, stale_claim).unwrap();
    persistence.mark_requested(&healthy, stale_claim).unwrap();

    let stalled_row = persistence.find_report(&stalled).unwrap().unwrap();
    let healthy_row = persistence.find_report(&healthy).unwrap().unwrap();
    persistence.claim(stalled_row.report_id, stale_claim).unwrap().unwrap();
    persistence.claim(healthy_row.report_id, fresh_claim).unwrap().unwrap();

    let cutoff: DateTime<Utc> = stale_claim + Duration::minutes(30);
    let reclaimed: usize = persistence.reclaim_stalled(cutoff).unwrap();

    assert_eq!(reclaimed, 1);
    let stalled_row = persistence.report_by_id(stalled_row.report_id).unwrap().unwrap();
    let healthy_row = persistence.report_by_id(healthy_row.report_id).unwrap().unwrap();
    assert_eq!(stalled_row.staleness().unwrap(), StalenessState::Requested);
    assert_eq!(healthy_row.staleness().unwrap(), StalenessState::Pending);
}

#[test]
fn test_reclaimed_worker_cannot_clobber_with_stale_token() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let old: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), old).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();
    let stale_token: String = persistence.claim(row.report_id, old).unwrap().unwrap();

    // The claim stalls out and is reclaimed, then claimed by another worker.
    persistence
        .reclaim_stalled(old + Duration::hours(1))
        .unwrap();
    let new_token: String = persistence
        .claim(row.report_id, old + Duration::hours(2))
        .unwrap()
        .unwrap();

    // The original worker finally finishes: its write must be rejected.
    let outcome: CompleteOutcome = persistence
        .complete_rebuild(row.report_id, &stale_token, "{\"stale\":true}", old)
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::ClaimLost);

    // The live claim settles normally.
    let outcome: CompleteOutcome = persistence
        .complete_rebuild(row.report_id, &new_token, "{\"fresh\":true}", old)
        .unwrap();
    assert_eq!(outcome, CompleteOutcome::Settled(StalenessState::Current));
    let row = persistence.report_by_id(row.report_id).unwrap().unwrap();
    assert_eq!(row.document_json.as_deref(), Some("{\"fresh\":true}"));
}

#[test]
fn test_requested_reports_filters_by_level_and_orders_by_period() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence
        .mark_requested(&AggregateRef::day(7, date(2026, 6, 2)), now)
        .unwrap();
    persistence
        .mark_requested(&AggregateRef::day(7, date(2026, 6, 1)), now)
        .unwrap();
    persistence
        .mark_requested(&AggregateRef::month(7, date(2026, 6, 1)), now)
        .unwrap();

    let rows = persistence
        .requested_reports(AggregateLevel::Day, 10)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].period_start, "2026-06-01");
    assert_eq!(rows[1].period_start, "2026-06-02");
}

#[test]
fn test_day_reports_in_period_skips_unbuilt_placeholders() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");

    // One built day, one placeholder that was requested but never rebuilt.
    let built: AggregateRef = AggregateRef::day(7, date(2026, 6, 1));
    let doc: String = serde_json::to_string(&sitecost_domain::DayReport {
        jobsite_id: 7,
        day: date(2026, 6, 1),
        employee_lines: Vec::new(),
        vehicle_lines: Vec::new(),
        material_lines: Vec::new(),
        production_lines: Vec::new(),
        crew_buckets: Vec::new(),
        summary: sitecost_domain::DaySummary {
            labor_cost: rust_decimal::Decimal::ZERO,
            labor_hours: rust_decimal::Decimal::ZERO,
            equipment_cost: rust_decimal::Decimal::ZERO,
            equipment_hours: rust_decimal::Decimal::ZERO,
            material_cost: rust_decimal::Decimal::ZERO,
            trucking_cost: rust_decimal::Decimal::ZERO,
            total_cost: rust_decimal::Decimal::ZERO,
        },
        issues: Vec::new(),
    })
    .unwrap();
    settle_current(&mut persistence, &built, &doc);
    persistence
        .mark_requested(&AggregateRef::day(7, date(2026, 6, 2)), now)
        .unwrap();

    let reports = persistence
        .day_reports_in_period(7, date(2026, 6, 1), date(2026, 7, 1))
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].1.day, date(2026, 6, 1));
}

#[test]
fn test_delete_reports_removes_orphans() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let now: DateTime<Utc> = utc("2026-06-02T00:00:00Z");
    persistence.mark_requested(&day_ref(), now).unwrap();
    let row = persistence.find_report(&day_ref()).unwrap().unwrap();

    persistence.delete_reports(&[row.report_id]).unwrap();
    assert!(persistence.find_report(&day_ref()).unwrap().is_none());
}

#[test]
fn test_master_rows_use_sentinel_jobsite() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let master: AggregateRef = AggregateRef::master(2026);
    persistence
        .mark_requested(&master, utc("2026-06-02T00:00:00Z"))
        .unwrap();

    let row = persistence.find_report(&master).unwrap().unwrap();
    assert_eq!(row.jobsite_id, sitecost_domain::MASTER_JOBSITE_ID);
    assert_eq!(row.aggregate_ref().unwrap(), master);
}
