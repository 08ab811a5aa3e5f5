// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;

/// Errors that can occur during domain validation and period normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The configured timezone string could not be parsed.
    InvalidTimezone(String),
    /// No organization timezone is configured.
    MissingTimezone,
    /// No overhead rate entry is effective on or before the given date.
    MissingOverheadRate {
        /// The date the lookup was performed as of.
        as_of: NaiveDate,
    },
    /// No external surcharge entry is effective on or before the given date.
    MissingExternalSurcharge {
        /// The date the lookup was performed as of.
        as_of: NaiveDate,
    },
    /// An aggregate level string is not recognized.
    InvalidAggregateLevel(String),
    /// A granularity string is not recognized.
    InvalidGranularity(String),
    /// A staleness state string is not recognized.
    InvalidStalenessState(String),
    /// Local midnight could not be resolved for a day in the given timezone.
    DayBoundsUnresolvable {
        /// The calendar day that failed to resolve.
        day: NaiveDate,
        /// The timezone the resolution was attempted in.
        timezone: String,
    },
    /// Date arithmetic overflowed.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: '{tz}'"),
            Self::MissingTimezone => write!(f, "No organization timezone is configured"),
            Self::MissingOverheadRate { as_of } => {
                write!(f, "No overhead rate is effective on or before {as_of}")
            }
            Self::MissingExternalSurcharge { as_of } => {
                write!(
                    f,
                    "No external surcharge rate is effective on or before {as_of}"
                )
            }
            Self::InvalidAggregateLevel(s) => write!(f, "Invalid aggregate level: '{s}'"),
            Self::InvalidGranularity(s) => write!(f, "Invalid granularity: '{s}'"),
            Self::InvalidStalenessState(s) => write!(f, "Invalid staleness state: '{s}'"),
            Self::DayBoundsUnresolvable { day, timezone } => {
                write!(
                    f,
                    "Could not resolve local midnight for {day} in timezone {timezone}"
                )
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
