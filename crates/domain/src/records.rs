// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Raw operational record types consumed by the aggregate builders.
//!
//! These records are persisted by the surrounding application's CRUD paths;
//! the engine only reads them. All timestamps are UTC; day ownership is
//! decided by timezone normalization, never by the raw timestamp alone.

use crate::report::CrewType;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single entry in a time-versioned rate table.
///
/// Rate tables are effective-dated: the rate in force on a given day is the
/// entry with the latest effective date on or before that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    /// The first day this rate is in force.
    pub effective_date: NaiveDate,
    /// The rate value.
    pub rate: Decimal,
}

/// Resolves the effective rate from a rate table as of a given day.
///
/// Entries need not be sorted. Returns `None` when no entry is effective on
/// or before `as_of`; callers surface that as a zero-rate issue rather than
/// failing the build.
#[must_use]
pub fn effective_rate(entries: &[RateEntry], as_of: NaiveDate) -> Option<Decimal> {
    entries
        .iter()
        .filter(|entry| entry.effective_date <= as_of)
        .max_by_key(|entry| entry.effective_date)
        .map(|entry| entry.rate)
}

/// One employee's hours on a jobsite for part of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeWorkRecord {
    /// Record identifier.
    pub record_id: i64,
    /// The jobsite the work was performed on.
    pub jobsite_id: i64,
    /// The employee who performed the work.
    pub employee_id: i64,
    /// The crew type the work is costed under.
    pub crew_type: CrewType,
    /// When the work started (UTC).
    pub worked_at: DateTime<Utc>,
    /// Hours worked.
    pub hours: Decimal,
}

/// One vehicle's usage on a jobsite for part of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleWorkRecord {
    /// Record identifier.
    pub record_id: i64,
    /// The jobsite the vehicle was used on.
    pub jobsite_id: i64,
    /// The vehicle that was used.
    pub vehicle_id: i64,
    /// The crew type the usage is costed under.
    pub crew_type: CrewType,
    /// When the usage started (UTC).
    pub worked_at: DateTime<Utc>,
    /// Hours of usage.
    pub hours: Decimal,
}

/// One delivery of a jobsite material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialShipment {
    /// Shipment identifier.
    pub shipment_id: i64,
    /// The receiving jobsite.
    pub jobsite_id: i64,
    /// The jobsite material delivered.
    pub jobsite_material_id: i64,
    /// The crew type the delivery is costed under.
    pub crew_type: CrewType,
    /// When the delivery arrived (UTC).
    pub delivered_at: DateTime<Utc>,
    /// Quantity delivered, in the material's unit.
    pub quantity: Decimal,
}

/// A material priced for a specific jobsite.
///
/// Rates may be flagged estimated while a supplier quote is outstanding;
/// estimated rates are surfaced as issues on every rollup that uses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsiteMaterial {
    /// Jobsite material identifier.
    pub jobsite_material_id: i64,
    /// The jobsite this pricing belongs to.
    pub jobsite_id: i64,
    /// Display name.
    pub name: String,
    /// Cost per unit.
    pub unit_rate: Decimal,
    /// Trucking cost per unit.
    pub trucking_rate: Decimal,
    /// Whether the unit rate is still an estimate.
    pub rate_estimated: bool,
}

/// A production quantity recorded against a jobsite-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEntry {
    /// Entry identifier.
    pub entry_id: i64,
    /// The jobsite the production was recorded on.
    pub jobsite_id: i64,
    /// When the production was recorded (UTC).
    pub produced_at: DateTime<Utc>,
    /// Quantity produced.
    pub quantity: Decimal,
    /// Optional free-form note.
    pub note: Option<String>,
}

/// The mutually exclusive cost classification of an invoice.
///
/// Checked in priority order: accrual, then internal, then external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceClass {
    /// Accrued cost or revenue, no surcharge applied.
    Accrual,
    /// Internal (inter-company) cost or revenue, no surcharge applied.
    Internal,
    /// External cost or revenue; expenses carry the configured surcharge.
    External,
}

/// An invoice dated against a jobsite.
///
/// Invoices are matched to period reports purely by their date falling
/// within `[period_start, period_end)`; they never flow through the day
/// level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier.
    pub invoice_id: i64,
    /// The jobsite the invoice is costed against.
    pub jobsite_id: i64,
    /// The invoice date (already a calendar date, no normalization needed).
    pub invoice_date: NaiveDate,
    /// The invoice amount.
    pub amount: Decimal,
    /// Whether this is revenue (otherwise an expense).
    pub is_revenue: bool,
    /// Internal classification flag.
    pub is_internal: bool,
    /// Accrual classification flag. Takes priority over `is_internal`.
    pub is_accrual: bool,
    /// Optional description.
    pub description: Option<String>,
}

impl Invoice {
    /// Returns the invoice's mutually exclusive classification.
    ///
    /// Priority order: accrual, then internal, then external.
    #[must_use]
    pub const fn classification(&self) -> InvoiceClass {
        if self.is_accrual {
            InvoiceClass::Accrual
        } else if self.is_internal {
            InvoiceClass::Internal
        } else {
            InvoiceClass::External
        }
    }
}
