// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Timezone-anchored period normalization.
//!
//! Raw records store UTC timestamps; rollups are keyed by calendar periods
//! in the organization's configured timezone. Two records belong to the
//! same day only if they fall on the same date *after* conversion to that
//! timezone.
//!
//! ## Invariants
//!
//! - Period starts are always normalized: first of month for months,
//!   January 1st for years.
//! - Period windows are half-open: `[start, end)`.
//! - A day report is owned by exactly one month report and one year report.

use crate::aggregate::AggregateLevel;
use crate::error::DomainError;
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parses an IANA timezone string (e.g., `America/Denver`).
///
/// # Errors
///
/// Returns an error if the string is not a known timezone.
pub fn parse_timezone(timezone: &str) -> Result<Tz, DomainError> {
    timezone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))
}

/// Normalizes a UTC timestamp to its calendar day in the given timezone.
#[must_use]
pub fn normalize_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Returns the first day of the month containing the given day.
#[must_use]
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Returns January 1st of the year containing the given day.
#[must_use]
pub fn year_start(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day)
}

/// Returns the exclusive end date of the period starting at `period_start`.
///
/// `Master` periods span a fiscal year and share the `Year` length.
///
/// # Errors
///
/// Returns an error if date arithmetic overflows the calendar range.
pub fn period_end(level: AggregateLevel, period_start: NaiveDate) -> Result<NaiveDate, DomainError> {
    let end: Option<NaiveDate> = match level {
        AggregateLevel::Day => period_start.succ_opt(),
        AggregateLevel::Month => period_start.checked_add_months(Months::new(1)),
        AggregateLevel::Year | AggregateLevel::Master => {
            period_start.checked_add_months(Months::new(12))
        }
    };
    end.ok_or_else(|| DomainError::DateArithmeticOverflow {
        operation: format!("computing the end of the {level} period starting {period_start}"),
    })
}

/// Checks whether a normalized day falls inside `[period_start, period_end)`.
#[must_use]
pub fn period_contains(period_start: NaiveDate, period_end: NaiveDate, day: NaiveDate) -> bool {
    day >= period_start && day < period_end
}

/// Resolves local midnight of a calendar day to a UTC instant.
///
/// Under a DST transition local midnight may not exist; the earliest valid
/// local time is used so the window never drops records.
fn local_midnight_utc(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, DomainError> {
    tz.from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| DomainError::DayBoundsUnresolvable {
            day,
            timezone: tz.name().to_string(),
        })
}

/// Returns the UTC window `[start, end)` covering one calendar day.
///
/// # Errors
///
/// Returns an error if local midnight cannot be resolved in the timezone
/// or the day has no successor.
pub fn day_bounds_utc(day: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), DomainError> {
    let next: NaiveDate = period_end(AggregateLevel::Day, day)?;
    Ok((local_midnight_utc(day, tz)?, local_midnight_utc(next, tz)?))
}
