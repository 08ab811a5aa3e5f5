// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod aggregate;
mod config;
mod error;
mod issue;
mod period;
mod records;
mod report;
mod staleness;

#[cfg(test)]
mod tests;

pub use aggregate::{AggregateLevel, AggregateRef, Granularity, MASTER_JOBSITE_ID};
pub use config::{ConfigSnapshot, OrgConfig};
pub use error::DomainError;
pub use issue::Issue;
pub use period::{
    day_bounds_utc, month_start, normalize_day, parse_timezone, period_contains, period_end,
    year_start,
};
pub use records::{
    EmployeeWorkRecord, Invoice, InvoiceClass, JobsiteMaterial, MaterialShipment, ProductionEntry,
    RateEntry, VehicleWorkRecord, effective_rate,
};
pub use report::{
    CrewBucket, CrewType, DayReport, DaySummary, EmployeeLine, MasterEntry, MasterReport,
    MaterialLine, PeriodReport, PeriodSummary, ProductionLine, VehicleLine,
};
pub use staleness::StalenessState;
