// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Raw record queries used to assemble rebuild inputs.
//!
//! Window queries take pre-computed UTC bounds; the caller resolves them
//! from the organization timezone. The fixed RFC3339 storage format keeps
//! string range filters chronologically correct.

use crate::data_models::{
    EmployeeWorkRow, InvoiceRow, JobsiteMaterialRow, MaterialShipmentRow, OrgRateRow,
    ProductionEntryRow, RateRow, VehicleWorkRow, format_date, format_datetime,
};
use crate::diesel_schema::{
    employee_rates, employee_work, employees, invoices, jobsite_materials, jobsites,
    material_shipments, org_overhead_rates, org_settings, org_surcharge_rates,
    production_entries, vehicle_rates, vehicle_work, vehicles,
};
use crate::error::PersistenceError;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use sitecost_domain::{
    EmployeeWorkRecord, Invoice, JobsiteMaterial, MaterialShipment, OrgConfig, ProductionEntry,
    RateEntry, VehicleWorkRecord,
};
use std::collections::HashMap;

/// Fetches employee work for one jobsite inside a UTC window.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn employee_work_between(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<EmployeeWorkRecord>, PersistenceError> {
    let rows: Vec<EmployeeWorkRow> = employee_work::table
        .filter(employee_work::jobsite_id.eq(jobsite_id))
        .filter(employee_work::worked_at.ge(format_datetime(start)))
        .filter(employee_work::worked_at.lt(format_datetime(end)))
        .order(employee_work::record_id.asc())
        .load::<EmployeeWorkRow>(conn)?;
    rows.into_iter().map(EmployeeWorkRow::into_record).collect()
}

/// Fetches vehicle work for one jobsite inside a UTC window.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn vehicle_work_between(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<VehicleWorkRecord>, PersistenceError> {
    let rows: Vec<VehicleWorkRow> = vehicle_work::table
        .filter(vehicle_work::jobsite_id.eq(jobsite_id))
        .filter(vehicle_work::worked_at.ge(format_datetime(start)))
        .filter(vehicle_work::worked_at.lt(format_datetime(end)))
        .order(vehicle_work::record_id.asc())
        .load::<VehicleWorkRow>(conn)?;
    rows.into_iter().map(VehicleWorkRow::into_record).collect()
}

/// Fetches material shipments for one jobsite inside a UTC window.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn shipments_between(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<MaterialShipment>, PersistenceError> {
    let rows: Vec<MaterialShipmentRow> = material_shipments::table
        .filter(material_shipments::jobsite_id.eq(jobsite_id))
        .filter(material_shipments::delivered_at.ge(format_datetime(start)))
        .filter(material_shipments::delivered_at.lt(format_datetime(end)))
        .order(material_shipments::shipment_id.asc())
        .load::<MaterialShipmentRow>(conn)?;
    rows.into_iter()
        .map(MaterialShipmentRow::into_record)
        .collect()
}

/// Fetches production entries for one jobsite inside a UTC window.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn production_between(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ProductionEntry>, PersistenceError> {
    let rows: Vec<ProductionEntryRow> = production_entries::table
        .filter(production_entries::jobsite_id.eq(jobsite_id))
        .filter(production_entries::produced_at.ge(format_datetime(start)))
        .filter(production_entries::produced_at.lt(format_datetime(end)))
        .order(production_entries::entry_id.asc())
        .load::<ProductionEntryRow>(conn)?;
    rows.into_iter()
        .map(ProductionEntryRow::into_record)
        .collect()
}

/// Fetches rate tables for the given employees, keyed by employee id.
///
/// Only employees that still exist appear in the map; a referenced id with
/// no entry is how the builders detect a deleted employee.
///
/// # Errors
///
/// Returns an error if a query fails or a row is corrupt.
pub fn employee_rate_tables(
    conn: &mut SqliteConnection,
    employee_ids: &[i64],
) -> Result<HashMap<i64, Vec<RateEntry>>, PersistenceError> {
    if employee_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let existing: Vec<i64> = employees::table
        .filter(employees::employee_id.eq_any(employee_ids.iter().copied()))
        .select(employees::employee_id)
        .load::<i64>(conn)?;

    let mut tables: HashMap<i64, Vec<RateEntry>> =
        existing.iter().map(|id| (*id, Vec::new())).collect();

    let rows: Vec<RateRow> = employee_rates::table
        .filter(employee_rates::employee_id.eq_any(existing))
        .load::<RateRow>(conn)?;
    for row in rows {
        let owner: i64 = row.owner_id;
        let entry: RateEntry = row.into_entry()?;
        if let Some(table) = tables.get_mut(&owner) {
            table.push(entry);
        }
    }
    Ok(tables)
}

/// Fetches rate tables for the given vehicles, keyed by vehicle id.
///
/// Only vehicles that still exist appear in the map.
///
/// # Errors
///
/// Returns an error if a query fails or a row is corrupt.
pub fn vehicle_rate_tables(
    conn: &mut SqliteConnection,
    vehicle_ids: &[i64],
) -> Result<HashMap<i64, Vec<RateEntry>>, PersistenceError> {
    if vehicle_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let existing: Vec<i64> = vehicles::table
        .filter(vehicles::vehicle_id.eq_any(vehicle_ids.iter().copied()))
        .select(vehicles::vehicle_id)
        .load::<i64>(conn)?;

    let mut tables: HashMap<i64, Vec<RateEntry>> =
        existing.iter().map(|id| (*id, Vec::new())).collect();

    let rows: Vec<RateRow> = vehicle_rates::table
        .filter(vehicle_rates::vehicle_id.eq_any(existing))
        .load::<RateRow>(conn)?;
    for row in rows {
        let owner: i64 = row.owner_id;
        let entry: RateEntry = row.into_entry()?;
        if let Some(table) = tables.get_mut(&owner) {
            table.push(entry);
        }
    }
    Ok(tables)
}

/// Fetches jobsite materials by id, keyed by id.
///
/// Only materials that still exist appear in the map.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn materials_by_ids(
    conn: &mut SqliteConnection,
    jobsite_material_ids: &[i64],
) -> Result<HashMap<i64, JobsiteMaterial>, PersistenceError> {
    if jobsite_material_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<JobsiteMaterialRow> = jobsite_materials::table
        .filter(
            jobsite_materials::jobsite_material_id.eq_any(jobsite_material_ids.iter().copied()),
        )
        .load::<JobsiteMaterialRow>(conn)?;
    rows.into_iter()
        .map(|row| {
            let material: JobsiteMaterial = row.into_record()?;
            Ok((material.jobsite_material_id, material))
        })
        .collect()
}

/// Fetches invoices for one jobsite dated inside `[start, end)`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn invoices_between(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Invoice>, PersistenceError> {
    let rows: Vec<InvoiceRow> = invoices::table
        .filter(invoices::jobsite_id.eq(jobsite_id))
        .filter(invoices::invoice_date.ge(format_date(start)))
        .filter(invoices::invoice_date.lt(format_date(end)))
        .order(invoices::invoice_id.asc())
        .load::<InvoiceRow>(conn)?;
    rows.into_iter().map(InvoiceRow::into_record).collect()
}

/// Loads the organization configuration.
///
/// # Errors
///
/// Returns [`PersistenceError::OrgConfigMissing`] if the settings row has
/// not been seeded, or an error if a stored value is corrupt.
pub fn org_config(conn: &mut SqliteConnection) -> Result<OrgConfig, PersistenceError> {
    let timezone: String = org_settings::table
        .select(org_settings::timezone)
        .first::<String>(conn)
        .optional()?
        .ok_or(PersistenceError::OrgConfigMissing)?;

    let overhead_rows: Vec<OrgRateRow> = org_overhead_rates::table.load::<OrgRateRow>(conn)?;
    let surcharge_rows: Vec<OrgRateRow> = org_surcharge_rates::table.load::<OrgRateRow>(conn)?;

    Ok(OrgConfig {
        timezone,
        overhead_rates: overhead_rows
            .into_iter()
            .map(OrgRateRow::into_entry)
            .collect::<Result<Vec<RateEntry>, PersistenceError>>()?,
        external_surcharges: surcharge_rows
            .into_iter()
            .map(OrgRateRow::into_entry)
            .collect::<Result<Vec<RateEntry>, PersistenceError>>()?,
    })
}

/// Lists all jobsite ids.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn jobsite_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, PersistenceError> {
    Ok(jobsites::table
        .select(jobsites::jobsite_id)
        .order(jobsites::jobsite_id.asc())
        .load::<i64>(conn)?)
}
