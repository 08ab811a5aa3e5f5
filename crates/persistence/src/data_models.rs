// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row structs and text codecs for the `SQLite` schema.
//!
//! Money and quantities are stored as decimal strings, never floats, so
//! totals survive round-trips exactly. UTC timestamps are stored as RFC3339
//! with a fixed `Z` offset, which keeps lexicographic and chronological
//! order identical; dates are `YYYY-MM-DD`.

use crate::diesel_schema::{
    employee_rates, employee_work, invoices, jobsite_materials, material_shipments,
    production_entries, reports, vehicle_rates, vehicle_work,
};
use crate::error::PersistenceError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use sitecost_domain::{
    AggregateLevel, AggregateRef, CrewType, EmployeeWorkRecord, Invoice, JobsiteMaterial,
    MaterialShipment, ProductionEntry, RateEntry, StalenessState, VehicleWorkRecord,
};
use std::str::FromStr;

/// Formats a UTC instant for storage.
#[must_use]
pub fn format_datetime(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a stored UTC instant.
///
/// # Errors
///
/// Returns an error if the stored value is not RFC3339.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::InvalidStoredValue(format!("timestamp '{value}': {e}")))
}

/// Formats a calendar date for storage.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a stored calendar date.
///
/// # Errors
///
/// Returns an error if the stored value is not `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Result<NaiveDate, PersistenceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidStoredValue(format!("date '{value}': {e}")))
}

/// Formats a decimal for storage.
#[must_use]
pub fn format_decimal(value: Decimal) -> String {
    value.to_string()
}

/// Parses a stored decimal.
///
/// # Errors
///
/// Returns an error if the stored value is not a decimal string.
pub fn parse_decimal(value: &str) -> Result<Decimal, PersistenceError> {
    Decimal::from_str(value)
        .map_err(|e| PersistenceError::InvalidStoredValue(format!("decimal '{value}': {e}")))
}

/// Queryable rate table row (shared shape across all rate tables).
#[derive(Debug, Clone, Queryable)]
pub struct RateRow {
    pub rate_id: i64,
    pub owner_id: i64,
    pub effective_date: String,
    pub rate: String,
}

impl RateRow {
    /// Decodes this row into a domain rate entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_entry(self) -> Result<RateEntry, PersistenceError> {
        Ok(RateEntry {
            effective_date: parse_date(&self.effective_date)?,
            rate: parse_decimal(&self.rate)?,
        })
    }
}

/// Queryable org-level rate row (no owner column).
#[derive(Debug, Clone, Queryable)]
pub struct OrgRateRow {
    pub rate_id: i64,
    pub effective_date: String,
    pub rate: String,
}

impl OrgRateRow {
    /// Decodes this row into a domain rate entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_entry(self) -> Result<RateEntry, PersistenceError> {
        Ok(RateEntry {
            effective_date: parse_date(&self.effective_date)?,
            rate: parse_decimal(&self.rate)?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employee_rates)]
pub struct NewEmployeeRate {
    pub employee_id: i64,
    pub effective_date: String,
    pub rate: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vehicle_rates)]
pub struct NewVehicleRate {
    pub vehicle_id: i64,
    pub effective_date: String,
    pub rate: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct EmployeeWorkRow {
    pub record_id: i64,
    pub jobsite_id: i64,
    pub employee_id: i64,
    pub crew_type: String,
    pub worked_at: String,
    pub hours: String,
}

impl EmployeeWorkRow {
    /// Decodes this row into a domain work record.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<EmployeeWorkRecord, PersistenceError> {
        Ok(EmployeeWorkRecord {
            record_id: self.record_id,
            jobsite_id: self.jobsite_id,
            employee_id: self.employee_id,
            crew_type: CrewType::new(&self.crew_type),
            worked_at: parse_datetime(&self.worked_at)?,
            hours: parse_decimal(&self.hours)?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employee_work)]
pub struct NewEmployeeWork {
    pub jobsite_id: i64,
    pub employee_id: i64,
    pub crew_type: String,
    pub worked_at: String,
    pub hours: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct VehicleWorkRow {
    pub record_id: i64,
    pub jobsite_id: i64,
    pub vehicle_id: i64,
    pub crew_type: String,
    pub worked_at: String,
    pub hours: String,
}

impl VehicleWorkRow {
    /// Decodes this row into a domain work record.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<VehicleWorkRecord, PersistenceError> {
        Ok(VehicleWorkRecord {
            record_id: self.record_id,
            jobsite_id: self.jobsite_id,
            vehicle_id: self.vehicle_id,
            crew_type: CrewType::new(&self.crew_type),
            worked_at: parse_datetime(&self.worked_at)?,
            hours: parse_decimal(&self.hours)?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vehicle_work)]
pub struct NewVehicleWork {
    pub jobsite_id: i64,
    pub vehicle_id: i64,
    pub crew_type: String,
    pub worked_at: String,
    pub hours: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct MaterialShipmentRow {
    pub shipment_id: i64,
    pub jobsite_id: i64,
    pub jobsite_material_id: i64,
    pub crew_type: String,
    pub delivered_at: String,
    pub quantity: String,
}

impl MaterialShipmentRow {
    /// Decodes this row into a domain shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<MaterialShipment, PersistenceError> {
        Ok(MaterialShipment {
            shipment_id: self.shipment_id,
            jobsite_id: self.jobsite_id,
            jobsite_material_id: self.jobsite_material_id,
            crew_type: CrewType::new(&self.crew_type),
            delivered_at: parse_datetime(&self.delivered_at)?,
            quantity: parse_decimal(&self.quantity)?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = material_shipments)]
pub struct NewMaterialShipment {
    pub jobsite_id: i64,
    pub jobsite_material_id: i64,
    pub crew_type: String,
    pub delivered_at: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct JobsiteMaterialRow {
    pub jobsite_material_id: i64,
    pub jobsite_id: i64,
    pub name: String,
    pub unit_rate: String,
    pub trucking_rate: String,
    pub rate_estimated: i32,
}

impl JobsiteMaterialRow {
    /// Decodes this row into a domain jobsite material.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<JobsiteMaterial, PersistenceError> {
        Ok(JobsiteMaterial {
            jobsite_material_id: self.jobsite_material_id,
            jobsite_id: self.jobsite_id,
            name: self.name,
            unit_rate: parse_decimal(&self.unit_rate)?,
            trucking_rate: parse_decimal(&self.trucking_rate)?,
            rate_estimated: self.rate_estimated != 0,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobsite_materials)]
pub struct NewJobsiteMaterial {
    pub jobsite_id: i64,
    pub name: String,
    pub unit_rate: String,
    pub trucking_rate: String,
    pub rate_estimated: i32,
}

#[derive(Debug, Clone, Queryable)]
pub struct ProductionEntryRow {
    pub entry_id: i64,
    pub jobsite_id: i64,
    pub produced_at: String,
    pub quantity: String,
    pub note: Option<String>,
}

impl ProductionEntryRow {
    /// Decodes this row into a domain production entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<ProductionEntry, PersistenceError> {
        Ok(ProductionEntry {
            entry_id: self.entry_id,
            jobsite_id: self.jobsite_id,
            produced_at: parse_datetime(&self.produced_at)?,
            quantity: parse_decimal(&self.quantity)?,
            note: self.note,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = production_entries)]
pub struct NewProductionEntry {
    pub jobsite_id: i64,
    pub produced_at: String,
    pub quantity: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Queryable)]
pub struct InvoiceRow {
    pub invoice_id: i64,
    pub jobsite_id: i64,
    pub invoice_date: String,
    pub amount: String,
    pub is_revenue: i32,
    pub is_internal: i32,
    pub is_accrual: i32,
    pub description: Option<String>,
}

impl InvoiceRow {
    /// Decodes this row into a domain invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is corrupt.
    pub fn into_record(self) -> Result<Invoice, PersistenceError> {
        Ok(Invoice {
            invoice_id: self.invoice_id,
            jobsite_id: self.jobsite_id,
            invoice_date: parse_date(&self.invoice_date)?,
            amount: parse_decimal(&self.amount)?,
            is_revenue: self.is_revenue != 0,
            is_internal: self.is_internal != 0,
            is_accrual: self.is_accrual != 0,
            description: self.description,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = invoices)]
pub struct NewInvoice {
    pub jobsite_id: i64,
    pub invoice_date: String,
    pub amount: String,
    pub is_revenue: i32,
    pub is_internal: i32,
    pub is_accrual: i32,
    pub description: Option<String>,
}

/// One row of the materialized report store.
#[derive(Debug, Clone, Queryable)]
pub struct ReportRow {
    pub report_id: i64,
    pub level: String,
    pub jobsite_id: i64,
    pub period_start: String,
    pub staleness_state: String,
    pub requested_while_pending: i32,
    pub claimed_at: Option<String>,
    pub document_json: Option<String>,
    pub built_at: Option<String>,
    pub created_at: String,
}

impl ReportRow {
    /// Decodes the stored staleness state.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state string is corrupt.
    pub fn staleness(&self) -> Result<StalenessState, PersistenceError> {
        Ok(StalenessState::from_str(&self.staleness_state)?)
    }

    /// Decodes the aggregate reference this row is keyed by.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored level or period start is corrupt.
    pub fn aggregate_ref(&self) -> Result<AggregateRef, PersistenceError> {
        Ok(AggregateRef {
            level: AggregateLevel::from_str(&self.level)?,
            jobsite_id: self.jobsite_id,
            period_start: parse_date(&self.period_start)?,
        })
    }

    /// Deserializes the stored document body.
    ///
    /// # Errors
    ///
    /// Returns an error if the row has no document or it fails to decode.
    pub fn document<T: serde::de::DeserializeOwned>(&self) -> Result<T, PersistenceError> {
        let json: &str = self.document_json.as_deref().ok_or_else(|| {
            PersistenceError::InvalidStoredValue(format!(
                "report {} has no document body",
                self.report_id
            ))
        })?;
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReportRow {
    pub level: String,
    pub jobsite_id: i64,
    pub period_start: String,
    pub staleness_state: String,
    pub requested_while_pending: i32,
    pub created_at: String,
}
