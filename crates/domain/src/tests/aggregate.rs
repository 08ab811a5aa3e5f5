// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AggregateLevel, AggregateRef, Granularity, MASTER_JOBSITE_ID};
use chrono::NaiveDate;
use std::str::FromStr;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn test_aggregate_level_round_trips_through_strings() {
    for level in [
        AggregateLevel::Day,
        AggregateLevel::Month,
        AggregateLevel::Year,
        AggregateLevel::Master,
    ] {
        let parsed: AggregateLevel = AggregateLevel::from_str(level.as_str()).unwrap();
        assert_eq!(parsed, level);
    }
}

#[test]
fn test_aggregate_level_from_str_rejects_unknown() {
    assert!(AggregateLevel::from_str("Week").is_err());
}

#[test]
fn test_granularity_maps_to_level() {
    assert_eq!(Granularity::Month.level(), AggregateLevel::Month);
    assert_eq!(Granularity::Year.level(), AggregateLevel::Year);
}

#[test]
fn test_day_ref_keeps_the_day() {
    let aggregate: AggregateRef = AggregateRef::day(7, date(2026, 6, 17));
    assert_eq!(aggregate.level, AggregateLevel::Day);
    assert_eq!(aggregate.jobsite_id, 7);
    assert_eq!(aggregate.period_start, date(2026, 6, 17));
}

#[test]
fn test_month_ref_normalizes_to_first_of_month() {
    let aggregate: AggregateRef = AggregateRef::month(7, date(2026, 6, 17));
    assert_eq!(aggregate.period_start, date(2026, 6, 1));
}

#[test]
fn test_year_ref_normalizes_to_january_first() {
    let aggregate: AggregateRef = AggregateRef::year(7, date(2026, 6, 17));
    assert_eq!(aggregate.period_start, date(2026, 1, 1));
}

#[test]
fn test_master_ref_uses_sentinel_jobsite() {
    let aggregate: AggregateRef = AggregateRef::master(2026);
    assert_eq!(aggregate.level, AggregateLevel::Master);
    assert_eq!(aggregate.jobsite_id, MASTER_JOBSITE_ID);
    assert_eq!(aggregate.period_start, date(2026, 1, 1));
    assert_eq!(aggregate.fiscal_year(), 2026);
}

#[test]
fn test_period_ref_dispatches_on_granularity() {
    let month: AggregateRef = AggregateRef::period(7, Granularity::Month, date(2026, 6, 17));
    let year: AggregateRef = AggregateRef::period(7, Granularity::Year, date(2026, 6, 17));
    assert_eq!(month, AggregateRef::month(7, date(2026, 6, 17)));
    assert_eq!(year, AggregateRef::year(7, date(2026, 6, 17)));
}
