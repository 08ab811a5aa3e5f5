// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{date, new_db, seed_org, utc};
use crate::workers::{scan_level, scan_stalled};
use crate::{Db, RebuildOutcome, ReportService, propagator, rebuild::rebuild_one};
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use sitecost_domain::{
    AggregateLevel, AggregateRef, CrewType, DayReport, Issue, MasterReport, PeriodReport,
    StalenessState,
};

/// Seeds one jobsite with one employee shift: 8 hours at 50/h, worked at
/// noon Denver time on 2026-06-01. Returns the jobsite id.
fn seed_one_shift(db: &Db) -> i64 {
    seed_org(db);
    let mut persistence = db.lock().unwrap();
    let jobsite_id: i64 = persistence.insert_jobsite("North Quarry").unwrap();
    let employee_id: i64 = persistence.insert_employee("Dana Reyes").unwrap();
    persistence
        .insert_employee_rate(employee_id, date(2020, 1, 1), dec!(50.00))
        .unwrap();
    persistence
        .insert_employee_work(
            jobsite_id,
            employee_id,
            &CrewType::new("PAVING"),
            utc("2026-06-01T18:00:00Z"),
            dec!(8),
        )
        .unwrap();
    jobsite_id
}

#[test]
fn test_raw_change_cascades_through_all_levels() {
    let db: Db = new_db();
    let jobsite_id: i64 = seed_one_shift(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let service: ReportService = ReportService::new(db.clone());

    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now).unwrap();

    // Only the day is stale so far.
    assert_eq!(scan_level(&db, AggregateLevel::Month, 10, now).unwrap(), 0);
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    let day = service
        .get_day_report(jobsite_id, date(2026, 6, 1))
        .unwrap()
        .unwrap();
    assert_eq!(day.staleness, StalenessState::Current);
    let day_doc: DayReport = day.document.unwrap();
    assert_eq!(day_doc.summary.labor_cost, dec!(400.00));

    // The landed day rebuild marked its month and year.
    assert_eq!(scan_level(&db, AggregateLevel::Month, 10, now).unwrap(), 1);
    assert_eq!(scan_level(&db, AggregateLevel::Year, 10, now).unwrap(), 1);

    let month = service
        .get_period_report(jobsite_id, sitecost_domain::Granularity::Month, date(2026, 6, 1))
        .unwrap()
        .unwrap();
    assert_eq!(month.staleness, StalenessState::Current);
    let month_doc: PeriodReport = month.document.unwrap();
    assert_eq!(month_doc.summary.onsite_cost, dec!(400.00));
    // 400 * 1.10 overhead, no invoices.
    assert_eq!(month_doc.summary.total_expenses, dec!(440.0000));

    // The landed year rebuild marked the master.
    assert_eq!(scan_level(&db, AggregateLevel::Master, 10, now).unwrap(), 1);
    let master = service.get_master_report(2026).unwrap().unwrap();
    assert_eq!(master.staleness, StalenessState::Current);
    let master_doc: MasterReport = master.document.unwrap();
    assert_eq!(master_doc.fiscal_year, 2026);
    assert_eq!(master_doc.entries.len(), 1);
    assert_eq!(master_doc.entries[0].jobsite_id, jobsite_id);
}

#[test]
fn test_deleted_vehicle_costs_zero_and_reports_issue() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let (jobsite_id, vehicle_id): (i64, i64) = {
        let mut persistence = db.lock().unwrap();
        let jobsite_id: i64 = persistence.insert_jobsite("North Quarry").unwrap();
        let vehicle_id: i64 = persistence.insert_vehicle("Loader 12").unwrap();
        persistence
            .insert_vehicle_rate(vehicle_id, date(2020, 1, 1), dec!(75.00))
            .unwrap();
        persistence
            .insert_vehicle_work(
                jobsite_id,
                vehicle_id,
                &CrewType::new("GRADING"),
                utc("2026-06-01T18:00:00Z"),
                dec!(4),
            )
            .unwrap();
        persistence.delete_vehicle(vehicle_id).unwrap();
        (jobsite_id, vehicle_id)
    };

    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now).unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    let service: ReportService = ReportService::new(db);
    let day_doc: DayReport = service
        .get_day_report(jobsite_id, date(2026, 6, 1))
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(day_doc.summary.equipment_cost, dec!(0));
    assert!(day_doc.issues.contains(&Issue::MissingVehicle {
        vehicle_id,
        day: date(2026, 6, 1),
    }));
}

#[test]
fn test_same_day_shipments_fold_into_one_day_report() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let jobsite_id: i64 = {
        let mut persistence = db.lock().unwrap();
        let jobsite_id: i64 = persistence.insert_jobsite("North Quarry").unwrap();
        let material_id: i64 = persistence
            .insert_jobsite_material(jobsite_id, "Gravel", dec!(12.00), dec!(3.00), false)
            .unwrap();
        persistence
            .insert_material_shipment(
                jobsite_id,
                material_id,
                &CrewType::new("HAULING"),
                utc("2026-06-01T14:00:00Z"),
                dec!(10),
            )
            .unwrap();
        persistence
            .insert_material_shipment(
                jobsite_id,
                material_id,
                &CrewType::new("HAULING"),
                utc("2026-06-01T20:00:00Z"),
                dec!(5),
            )
            .unwrap();
        persistence
            .insert_production_entry(
                jobsite_id,
                utc("2026-06-01T22:00:00Z"),
                dec!(120),
                Some("tonnage placed"),
            )
            .unwrap();
        jobsite_id
    };

    propagator::note_raw_change(
        &db,
        &[
            (jobsite_id, utc("2026-06-01T14:00:00Z")),
            (jobsite_id, utc("2026-06-01T20:00:00Z")),
        ],
        now,
    )
    .unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    let service: ReportService = ReportService::new(db);
    let day_doc: DayReport = service
        .get_day_report(jobsite_id, date(2026, 6, 1))
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(day_doc.material_lines.len(), 2);
    assert_eq!(day_doc.production_lines.len(), 1);
    assert_eq!(day_doc.production_lines[0].quantity, dec!(120));
    // 15 units at 12.00 plus trucking at 3.00.
    assert_eq!(day_doc.summary.material_cost, dec!(180.00));
    assert_eq!(day_doc.summary.trucking_cost, dec!(45.00));
    assert_eq!(day_doc.summary.total_cost, dec!(225.00));
}

#[test]
fn test_moved_record_rebuilds_both_days() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let (jobsite_id, record_id): (i64, i64) = {
        let mut persistence = db.lock().unwrap();
        let jobsite_id: i64 = persistence.insert_jobsite("North Quarry").unwrap();
        let employee_id: i64 = persistence.insert_employee("Dana Reyes").unwrap();
        persistence
            .insert_employee_rate(employee_id, date(2020, 1, 1), dec!(50.00))
            .unwrap();
        let record_id: i64 = persistence
            .insert_employee_work(
                jobsite_id,
                employee_id,
                &CrewType::new("PAVING"),
                utc("2026-06-01T18:00:00Z"),
                dec!(8),
            )
            .unwrap();
        (jobsite_id, record_id)
    };

    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now).unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    // The shift actually happened the next day; move the record and notify
    // both coordinates.
    {
        let mut persistence = db.lock().unwrap();
        persistence
            .update_employee_work(record_id, jobsite_id, utc("2026-06-02T18:00:00Z"), dec!(8))
            .unwrap();
    }
    propagator::note_raw_change(
        &db,
        &[
            (jobsite_id, utc("2026-06-01T18:00:00Z")),
            (jobsite_id, utc("2026-06-02T18:00:00Z")),
        ],
        now,
    )
    .unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 2);

    let service: ReportService = ReportService::new(db);
    let old_day: DayReport = service
        .get_day_report(jobsite_id, date(2026, 6, 1))
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(old_day.summary.labor_cost, dec!(0));
    assert!(old_day.employee_lines.is_empty());

    let new_day: DayReport = service
        .get_day_report(jobsite_id, date(2026, 6, 2))
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(new_day.summary.labor_cost, dec!(400.00));
}

#[test]
fn test_invoice_change_skips_day_level() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let jobsite_id: i64 = {
        let mut persistence = db.lock().unwrap();
        let jobsite_id: i64 = persistence.insert_jobsite("North Quarry").unwrap();
        persistence
            .insert_invoice(
                jobsite_id,
                date(2026, 6, 10),
                dec!(1000.00),
                false,
                false,
                false,
                Some("Subcontract haul"),
            )
            .unwrap();
        jobsite_id
    };

    propagator::note_invoice_change(&db, &[(jobsite_id, date(2026, 6, 10))], now).unwrap();

    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 0);
    assert_eq!(scan_level(&db, AggregateLevel::Month, 10, now).unwrap(), 1);
    assert_eq!(scan_level(&db, AggregateLevel::Year, 10, now).unwrap(), 1);

    let service: ReportService = ReportService::new(db);
    let month_doc: PeriodReport = service
        .get_period_report(jobsite_id, sitecost_domain::Granularity::Month, date(2026, 6, 1))
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(month_doc.summary.external_expense_invoices, dec!(1000.00));
    // 1000 * 1.03 surcharge, no on-site cost.
    assert_eq!(month_doc.summary.total_expenses, dec!(1030.0000));
}

#[test]
fn test_rebuild_one_loses_race_to_existing_claim() {
    let db: Db = new_db();
    let jobsite_id: i64 = seed_one_shift(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now).unwrap();

    let report_id: i64 = {
        let mut persistence = db.lock().unwrap();
        let row = persistence
            .find_report(&AggregateRef::day(jobsite_id, date(2026, 6, 1)))
            .unwrap()
            .unwrap();
        // Another worker wins the claim first.
        persistence.claim(row.report_id, now).unwrap().unwrap();
        row.report_id
    };

    let outcome: RebuildOutcome = rebuild_one(&db, report_id, now).unwrap();
    assert_eq!(outcome, RebuildOutcome::ClaimLost);
}

#[test]
fn test_failed_rebuild_stays_queued() {
    let db: Db = new_db();
    // No organization config: day input assembly fails.
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    let aggregate: AggregateRef = AggregateRef::day(7, date(2026, 6, 1));
    propagator::request_rebuild(&db, &aggregate, now).unwrap();

    // The scan logs the failure and leaves the aggregate queued.
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 0);

    let mut persistence = db.lock().unwrap();
    let row = persistence.find_report(&aggregate).unwrap().unwrap();
    assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    assert!(row.claimed_at.is_none());

    // Even a failed attempt marks the owning periods.
    let month = persistence
        .find_report(&AggregateRef::month(7, date(2026, 6, 1)))
        .unwrap()
        .unwrap();
    assert_eq!(month.staleness().unwrap(), StalenessState::Requested);
}

#[test]
fn test_stalled_claim_is_reclaimed_then_rebuilt() {
    let db: Db = new_db();
    let jobsite_id: i64 = seed_one_shift(&db);
    let claim_time: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], claim_time)
        .unwrap();
    {
        let mut persistence = db.lock().unwrap();
        let row = persistence
            .find_report(&AggregateRef::day(jobsite_id, date(2026, 6, 1)))
            .unwrap()
            .unwrap();
        persistence.claim(row.report_id, claim_time).unwrap().unwrap();
    }

    let later: DateTime<Utc> = claim_time + Duration::hours(1);
    assert_eq!(
        scan_stalled(&db, Duration::minutes(5), later).unwrap(),
        1
    );
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, later).unwrap(), 1);
}

#[test]
fn test_master_build_queues_missing_year_reports() {
    let db: Db = new_db();
    let jobsite_id: i64 = seed_one_shift(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    propagator::note_raw_change(&db, &[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now).unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    // Wipe the year row the day cascade created, then rebuild the master
    // directly. The master build must queue the year report back.
    {
        let mut persistence = db.lock().unwrap();
        let year_row = persistence
            .find_report(&AggregateRef::year(jobsite_id, date(2026, 6, 1)))
            .unwrap()
            .unwrap();
        persistence.delete_reports(&[year_row.report_id]).unwrap();
    }

    propagator::request_rebuild(&db, &AggregateRef::master(2026), now).unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Master, 10, now).unwrap(), 1);

    let service: ReportService = ReportService::new(db.clone());
    let master_doc: MasterReport = service
        .get_master_report(2026)
        .unwrap()
        .unwrap()
        .document
        .unwrap();
    assert_eq!(master_doc.entries.len(), 1);
    assert_eq!(master_doc.entries[0].jobsite_id, jobsite_id);

    let mut persistence = db.lock().unwrap();
    let year_row = persistence
        .find_report(&AggregateRef::year(jobsite_id, date(2026, 1, 1)))
        .unwrap()
        .unwrap();
    assert_eq!(year_row.staleness().unwrap(), StalenessState::Requested);
    assert_eq!(master_doc.entries[0].year_report_id, year_row.report_id);
}

#[test]
fn test_duplicate_change_notifications_mark_once() {
    let db: Db = new_db();
    let jobsite_id: i64 = seed_one_shift(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    // Two instants inside the same Denver day collapse to one mark.
    propagator::note_raw_change(
        &db,
        &[
            (jobsite_id, utc("2026-06-01T18:00:00Z")),
            (jobsite_id, utc("2026-06-01T23:00:00Z")),
        ],
        now,
    )
    .unwrap();

    let mut persistence = db.lock().unwrap();
    assert_eq!(
        persistence.count_in_state(StalenessState::Requested).unwrap(),
        1
    );
}
