// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ConfigSnapshot, DomainError, OrgConfig, RateEntry};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn test_config() -> OrgConfig {
    OrgConfig {
        timezone: String::from("America/Denver"),
        overhead_rates: vec![
            RateEntry {
                effective_date: date(2025, 1, 1),
                rate: dec!(0.08),
            },
            RateEntry {
                effective_date: date(2026, 1, 1),
                rate: dec!(0.10),
            },
        ],
        external_surcharges: vec![RateEntry {
            effective_date: date(2025, 1, 1),
            rate: dec!(0.03),
        }],
    }
}

#[test]
fn test_snapshot_resolves_rates_as_of_date() {
    let snapshot: ConfigSnapshot = test_config().snapshot_as_of(date(2026, 6, 1)).unwrap();
    assert_eq!(snapshot.overhead_rate, dec!(0.10));
    assert_eq!(snapshot.external_surcharge, dec!(0.03));
    assert_eq!(snapshot.timezone.name(), "America/Denver");
}

#[test]
fn test_snapshot_uses_older_rate_before_change() {
    let snapshot: ConfigSnapshot = test_config().snapshot_as_of(date(2025, 6, 1)).unwrap();
    assert_eq!(snapshot.overhead_rate, dec!(0.08));
}

#[test]
fn test_snapshot_fails_before_any_overhead_entry() {
    let result = test_config().snapshot_as_of(date(2024, 6, 1));
    assert!(matches!(
        result,
        Err(DomainError::MissingOverheadRate { .. })
    ));
}

#[test]
fn test_snapshot_fails_on_missing_timezone() {
    let mut config: OrgConfig = test_config();
    config.timezone = String::new();
    let result = config.snapshot_as_of(date(2026, 6, 1));
    assert!(matches!(result, Err(DomainError::MissingTimezone)));
}

#[test]
fn test_snapshot_fails_on_invalid_timezone() {
    let mut config: OrgConfig = test_config();
    config.timezone = String::from("Mars/Olympus");
    let result = config.snapshot_as_of(date(2026, 6, 1));
    assert!(matches!(result, Err(DomainError::InvalidTimezone(_))));
}

#[test]
fn test_parsed_timezone_does_not_require_rates() {
    let config: OrgConfig = OrgConfig {
        timezone: String::from("America/Denver"),
        overhead_rates: Vec::new(),
        external_surcharges: Vec::new(),
    };
    assert!(config.parsed_timezone().is_ok());
}
