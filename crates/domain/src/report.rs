// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Materialized report documents.
//!
//! These are the persisted aggregate bodies. Each document is fully
//! replaced on rebuild; the staleness state lives next to the document in
//! the report store, not inside it.

use crate::aggregate::Granularity;
use crate::issue::Issue;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A crew type bucket identifier (e.g., "PAVING", "GRADING").
///
/// Normalized to uppercase so bucketing is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CrewType {
    /// The normalized crew type value.
    value: String,
}

impl CrewType {
    /// Creates a new `CrewType`, normalizing to uppercase.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_uppercase(),
        }
    }

    /// Returns the crew type value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for CrewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A costed employee work line inside a day report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeLine {
    /// The raw record this line was built from.
    pub record_id: i64,
    /// The employee.
    pub employee_id: i64,
    /// The crew type bucket.
    pub crew_type: CrewType,
    /// Hours worked.
    pub hours: Decimal,
    /// The hourly rate resolved as of the record date.
    pub rate: Decimal,
    /// `hours * rate`.
    pub cost: Decimal,
}

/// A costed vehicle work line inside a day report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLine {
    /// The raw record this line was built from.
    pub record_id: i64,
    /// The vehicle.
    pub vehicle_id: i64,
    /// The crew type bucket.
    pub crew_type: CrewType,
    /// Hours of usage.
    pub hours: Decimal,
    /// The hourly rate resolved as of the record date.
    pub rate: Decimal,
    /// `hours * rate`.
    pub cost: Decimal,
}

/// A costed material shipment line inside a day report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// The raw shipment this line was built from.
    pub shipment_id: i64,
    /// The jobsite material.
    pub jobsite_material_id: i64,
    /// The crew type bucket.
    pub crew_type: CrewType,
    /// Quantity delivered.
    pub quantity: Decimal,
    /// Unit rate at build time.
    pub unit_rate: Decimal,
    /// Trucking rate at build time.
    pub trucking_rate: Decimal,
    /// `quantity * unit_rate`.
    pub material_cost: Decimal,
    /// `quantity * trucking_rate`.
    pub trucking_cost: Decimal,
    /// Whether the unit rate was still an estimate at build time.
    pub rate_estimated: bool,
}

/// A production line inside a day report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    /// The raw entry this line was built from.
    pub entry_id: i64,
    /// Quantity produced.
    pub quantity: Decimal,
    /// Optional note carried over from the raw entry.
    pub note: Option<String>,
}

/// Per-crew-type cost totals for one jobsite-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewBucket {
    /// The crew type this bucket sums.
    pub crew_type: CrewType,
    /// Employee cost in this bucket.
    pub labor_cost: Decimal,
    /// Employee hours in this bucket.
    pub labor_hours: Decimal,
    /// Vehicle cost in this bucket.
    pub equipment_cost: Decimal,
    /// Vehicle hours in this bucket.
    pub equipment_hours: Decimal,
    /// Material cost in this bucket.
    pub material_cost: Decimal,
    /// Trucking cost in this bucket.
    pub trucking_cost: Decimal,
}

impl CrewBucket {
    /// Creates an empty bucket for a crew type.
    #[must_use]
    pub const fn empty(crew_type: CrewType) -> Self {
        Self {
            crew_type,
            labor_cost: Decimal::ZERO,
            labor_hours: Decimal::ZERO,
            equipment_cost: Decimal::ZERO,
            equipment_hours: Decimal::ZERO,
            material_cost: Decimal::ZERO,
            trucking_cost: Decimal::ZERO,
        }
    }
}

/// Cost and hours totals for one jobsite-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Total employee cost.
    pub labor_cost: Decimal,
    /// Total employee hours.
    pub labor_hours: Decimal,
    /// Total vehicle cost.
    pub equipment_cost: Decimal,
    /// Total vehicle hours.
    pub equipment_hours: Decimal,
    /// Total material cost.
    pub material_cost: Decimal,
    /// Total trucking cost.
    pub trucking_cost: Decimal,
    /// Sum of all cost categories (the on-site cost of the day).
    pub total_cost: Decimal,
}

/// The materialized rollup for one `(jobsite, day)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    /// The owning jobsite.
    pub jobsite_id: i64,
    /// The normalized calendar day.
    pub day: NaiveDate,
    /// Costed employee work lines, ordered by record id.
    pub employee_lines: Vec<EmployeeLine>,
    /// Costed vehicle work lines, ordered by record id.
    pub vehicle_lines: Vec<VehicleLine>,
    /// Costed material shipment lines, ordered by shipment id.
    pub material_lines: Vec<MaterialLine>,
    /// Production lines, ordered by entry id.
    pub production_lines: Vec<ProductionLine>,
    /// Per-crew-type totals, ordered by crew type.
    pub crew_buckets: Vec<CrewBucket>,
    /// Day totals.
    pub summary: DaySummary,
    /// Issues detected during the build.
    pub issues: Vec<Issue>,
}

/// Financial totals for one `(jobsite, month|year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Sum of owned day reports' total cost (internal on-site cost).
    pub onsite_cost: Decimal,
    /// Overhead rate applied, as of period start.
    pub overhead_rate: Decimal,
    /// External surcharge applied, as of period start.
    pub external_surcharge: Decimal,
    /// Sum of external expense invoices (before surcharge).
    pub external_expense_invoices: Decimal,
    /// Sum of internal expense invoices.
    pub internal_expense_invoices: Decimal,
    /// Sum of accrual expense invoices.
    pub accrual_expense_invoices: Decimal,
    /// Sum of external revenue invoices.
    pub external_revenue: Decimal,
    /// Sum of internal revenue invoices.
    pub internal_revenue: Decimal,
    /// Sum of accrual revenue invoices.
    pub accrual_revenue: Decimal,
    /// Total revenue across all classes.
    pub total_revenue: Decimal,
    /// Total expenses with overhead and surcharge applied.
    pub total_expenses: Decimal,
    /// `total_revenue - total_expenses`.
    pub net_income: Decimal,
    /// `net_income / total_expenses`, or zero when expenses are zero.
    pub margin: Decimal,
}

/// The materialized rollup for one `(jobsite, month|year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    /// The owning jobsite.
    pub jobsite_id: i64,
    /// Month or year.
    pub granularity: Granularity,
    /// The normalized period start.
    pub period_start: NaiveDate,
    /// Report-store ids of the owned day reports, ordered by day.
    pub day_report_ids: Vec<i64>,
    /// Period totals.
    pub summary: PeriodSummary,
    /// Union of owned day issues plus period-level checks.
    pub issues: Vec<Issue>,
}

/// One jobsite's entry in the master report.
///
/// Entries reference the jobsite's year report by id rather than copying
/// its figures, so the master never drifts from its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterEntry {
    /// The jobsite.
    pub jobsite_id: i64,
    /// Report-store id of the jobsite's year report.
    pub year_report_id: i64,
}

/// The cross-jobsite rollup for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterReport {
    /// The fiscal year.
    pub fiscal_year: i32,
    /// One entry per jobsite with activity in the year, ordered by jobsite.
    pub entries: Vec<MasterEntry>,
}
