// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;
use sitecost_domain::DomainError;

/// Errors that can occur while building a report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// A day report handed to a period build falls outside the period.
    DayReportOutsidePeriod {
        /// The day report's day.
        day: NaiveDate,
        /// The period start it was handed to.
        period_start: NaiveDate,
    },
    /// A day report handed to a period build belongs to another jobsite.
    MismatchedJobsite {
        /// The jobsite the period belongs to.
        expected: i64,
        /// The jobsite found on the day report.
        found: i64,
    },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::DayReportOutsidePeriod { day, period_start } => write!(
                f,
                "Day report for {day} does not belong to the period starting {period_start}"
            ),
            Self::MismatchedJobsite { expected, found } => write!(
                f,
                "Day report belongs to jobsite {found}, expected jobsite {expected}"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
