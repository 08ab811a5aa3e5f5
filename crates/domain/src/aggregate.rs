// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::period::{month_start, year_start};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sentinel jobsite id used by master-level aggregates ("all jobsites").
pub const MASTER_JOBSITE_ID: i64 = 0;

/// The level of a materialized rollup in the report hierarchy.
///
/// Levels form a strict DAG: day reports feed month and year reports,
/// year reports feed the master report. Each level is rebuilt by its own
/// worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateLevel {
    /// One jobsite, one calendar day.
    Day,
    /// One jobsite, one calendar month.
    Month,
    /// One jobsite, one calendar year.
    Year,
    /// All jobsites, one fiscal year.
    Master,
}

impl FromStr for AggregateLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Day" => Ok(Self::Day),
            "Month" => Ok(Self::Month),
            "Year" => Ok(Self::Year),
            "Master" => Ok(Self::Master),
            _ => Err(DomainError::InvalidAggregateLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for AggregateLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AggregateLevel {
    /// Converts this level to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::Master => "Master",
        }
    }
}

/// The period granularity of a jobsite period report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// One calendar month.
    Month,
    /// One calendar year.
    Year,
}

impl FromStr for Granularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Month" => Ok(Self::Month),
            "Year" => Ok(Self::Year),
            _ => Err(DomainError::InvalidGranularity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Granularity {
    /// Converts this granularity to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    /// Returns the aggregate level this granularity is rebuilt at.
    #[must_use]
    pub const fn level(&self) -> AggregateLevel {
        match self {
            Self::Month => AggregateLevel::Month,
            Self::Year => AggregateLevel::Year,
        }
    }
}

/// Identifies one materialized rollup by `(level, jobsite, period start)`.
///
/// The period start is always normalized: a day for `Day`, the first of the
/// month for `Month`, January 1st for `Year` and `Master`. Master-level
/// references use [`MASTER_JOBSITE_ID`] as their jobsite id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateRef {
    /// The level of the referenced rollup.
    pub level: AggregateLevel,
    /// The owning jobsite, or [`MASTER_JOBSITE_ID`] for master rollups.
    pub jobsite_id: i64,
    /// The normalized period start date.
    pub period_start: NaiveDate,
}

impl AggregateRef {
    /// References the day report for a `(jobsite, day)` pair.
    #[must_use]
    pub const fn day(jobsite_id: i64, day: NaiveDate) -> Self {
        Self {
            level: AggregateLevel::Day,
            jobsite_id,
            period_start: day,
        }
    }

    /// References the month report containing the given day.
    ///
    /// Any day within the month may be passed; the period start is
    /// normalized to the first of the month.
    #[must_use]
    pub fn month(jobsite_id: i64, day: NaiveDate) -> Self {
        Self {
            level: AggregateLevel::Month,
            jobsite_id,
            period_start: month_start(day),
        }
    }

    /// References the year report containing the given day.
    #[must_use]
    pub fn year(jobsite_id: i64, day: NaiveDate) -> Self {
        Self {
            level: AggregateLevel::Year,
            jobsite_id,
            period_start: year_start(day),
        }
    }

    /// References the cross-jobsite master report for a fiscal year.
    ///
    /// Falls back to year 1 if the fiscal year is outside the supported
    /// calendar range, which cannot happen for real data.
    #[must_use]
    pub fn master(fiscal_year: i32) -> Self {
        let period_start: NaiveDate = NaiveDate::from_ymd_opt(fiscal_year, 1, 1)
            .unwrap_or(NaiveDate::MIN);
        Self {
            level: AggregateLevel::Master,
            jobsite_id: MASTER_JOBSITE_ID,
            period_start,
        }
    }

    /// References the period report for a granularity and any day inside it.
    #[must_use]
    pub fn period(jobsite_id: i64, granularity: Granularity, day: NaiveDate) -> Self {
        match granularity {
            Granularity::Month => Self::month(jobsite_id, day),
            Granularity::Year => Self::year(jobsite_id, day),
        }
    }

    /// Returns the fiscal year of this reference's period start.
    #[must_use]
    pub fn fiscal_year(&self) -> i32 {
        self.period_start.year()
    }
}
