// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{date, new_db, seed_org, utc};
use crate::workers::scan_level;
use crate::{Db, ReportService};
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use sitecost_domain::{AggregateLevel, AggregateRef, CrewType, DayReport, StalenessState};

fn seeded_service(db: &Db) -> (ReportService, i64) {
    seed_org(db);
    let jobsite_id: i64 = {
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
    };
    (ReportService::new(db.clone()), jobsite_id)
}

#[test]
fn test_unknown_aggregate_reads_as_none() {
    let db: Db = new_db();
    let service: ReportService = ReportService::new(db);
    assert!(
        service
            .get_day_report(7, date(2026, 6, 1))
            .unwrap()
            .is_none()
    );
    assert!(service.get_master_report(2026).unwrap().is_none());
}

#[test]
fn test_requested_placeholder_reads_without_document() {
    let db: Db = new_db();
    let (service, _) = seeded_service(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");
    service
        .request_rebuild(&AggregateRef::day(7, date(2026, 6, 1)), now)
        .unwrap();

    let status = service.get_day_report(7, date(2026, 6, 1)).unwrap().unwrap();
    assert_eq!(status.staleness, StalenessState::Requested);
    assert!(status.built_at.is_none());
    assert!(status.document.is_none());
}

#[test]
fn test_stale_report_still_serves_last_document() {
    let db: Db = new_db();
    let (service, jobsite_id) = seeded_service(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    service
        .notify_raw_change(&[(jobsite_id, utc("2026-06-01T18:00:00Z"))], now)
        .unwrap();
    assert_eq!(scan_level(&db, AggregateLevel::Day, 10, now).unwrap(), 1);

    // New data arrives; the day goes stale but keeps its document.
    let later: DateTime<Utc> = utc("2026-06-16T00:00:00Z");
    service
        .notify_raw_change(&[(jobsite_id, utc("2026-06-01T20:00:00Z"))], later)
        .unwrap();

    let status = service
        .get_day_report(jobsite_id, date(2026, 6, 1))
        .unwrap()
        .unwrap();
    assert_eq!(status.staleness, StalenessState::Requested);
    assert_eq!(status.built_at, Some(now));
    let doc: DayReport = status.document.unwrap();
    assert_eq!(doc.summary.labor_cost, dec!(400.00));
}

#[test]
fn test_notify_invoice_change_routes_to_periods() {
    let db: Db = new_db();
    let (service, jobsite_id) = seeded_service(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    service
        .notify_invoice_change(&[(jobsite_id, date(2026, 6, 10))], now)
        .unwrap();

    let mut persistence = db.lock().unwrap();
    assert_eq!(
        persistence.count_in_state(StalenessState::Requested).unwrap(),
        2
    );
}
