// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{date, new_db, seed_org, utc};
use crate::{Db, propagator};
use chrono::{DateTime, Utc};
use sitecost_domain::{AggregateRef, MASTER_JOBSITE_ID, StalenessState};

#[test]
fn test_raw_change_normalizes_to_org_timezone_day() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-02T06:00:00Z");

    // 04:00 UTC on June 2nd is still June 1st in Denver.
    propagator::note_raw_change(&db, &[(7, utc("2026-06-02T04:00:00Z"))], now).unwrap();

    let mut persistence = db.lock().unwrap();
    let row = persistence
        .find_report(&AggregateRef::day(7, date(2026, 6, 1)))
        .unwrap();
    assert!(row.is_some());
    assert!(
        persistence
            .find_report(&AggregateRef::day(7, date(2026, 6, 2)))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_moved_record_marks_both_days() {
    let db: Db = new_db();
    seed_org(&db);
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    // A record re-dated from June 1st to June 3rd touches both days.
    propagator::note_raw_change(
        &db,
        &[
            (7, utc("2026-06-01T18:00:00Z")),
            (7, utc("2026-06-03T18:00:00Z")),
        ],
        now,
    )
    .unwrap();

    let mut persistence = db.lock().unwrap();
    for day in [date(2026, 6, 1), date(2026, 6, 3)] {
        let row = persistence
            .find_report(&AggregateRef::day(7, day))
            .unwrap()
            .unwrap();
        assert_eq!(row.staleness().unwrap(), StalenessState::Requested);
    }
}

#[test]
fn test_invoice_change_marks_month_and_year_only() {
    let db: Db = new_db();
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    propagator::note_invoice_change(&db, &[(7, date(2026, 6, 10))], now).unwrap();

    let mut persistence = db.lock().unwrap();
    assert!(
        persistence
            .find_report(&AggregateRef::month(7, date(2026, 6, 10)))
            .unwrap()
            .is_some()
    );
    assert!(
        persistence
            .find_report(&AggregateRef::year(7, date(2026, 6, 10)))
            .unwrap()
            .is_some()
    );
    assert!(
        persistence
            .find_report(&AggregateRef::day(7, date(2026, 6, 10)))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_after_day_rebuilt_marks_owning_periods() {
    let db: Db = new_db();
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    propagator::after_day_rebuilt(&db, 7, date(2026, 6, 14), now).unwrap();

    let mut persistence = db.lock().unwrap();
    let month = persistence
        .find_report(&AggregateRef::month(7, date(2026, 6, 14)))
        .unwrap()
        .unwrap();
    let year = persistence
        .find_report(&AggregateRef::year(7, date(2026, 6, 14)))
        .unwrap()
        .unwrap();
    assert_eq!(month.period_start, "2026-06-01");
    assert_eq!(year.period_start, "2026-01-01");
}

#[test]
fn test_after_year_rebuilt_marks_master() {
    let db: Db = new_db();
    let now: DateTime<Utc> = utc("2026-06-15T00:00:00Z");

    propagator::after_year_rebuilt(&db, 2026, now).unwrap();

    let mut persistence = db.lock().unwrap();
    let master = persistence
        .find_report(&AggregateRef::master(2026))
        .unwrap()
        .unwrap();
    assert_eq!(master.jobsite_id, MASTER_JOBSITE_ID);
    assert_eq!(master.staleness().unwrap(), StalenessState::Requested);
}
