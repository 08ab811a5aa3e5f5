// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Raw record mutations.
//!
//! These are the CRUD paths the surrounding application writes through.
//! They only touch raw tables; staleness propagation is the engine's job
//! and happens after the write, keyed by what changed.

use crate::data_models::{
    NewEmployeeRate, NewEmployeeWork, NewInvoice, NewJobsiteMaterial, NewMaterialShipment,
    NewProductionEntry, NewVehicleRate, NewVehicleWork, format_date, format_datetime,
    format_decimal,
};
use crate::diesel_schema::{
    employee_rates, employee_work, employees, invoices, jobsite_materials, jobsites,
    material_shipments, org_overhead_rates, org_settings, org_surcharge_rates,
    production_entries, vehicle_rates, vehicle_work, vehicles,
};
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use sitecost_domain::CrewType;

/// Inserts a jobsite and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_jobsite(conn: &mut SqliteConnection, name: &str) -> Result<i64, PersistenceError> {
    diesel::insert_into(jobsites::table)
        .values((jobsites::name.eq(name), jobsites::is_active.eq(1)))
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Inserts an employee and returns their id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_employee(conn: &mut SqliteConnection, name: &str) -> Result<i64, PersistenceError> {
    diesel::insert_into(employees::table)
        .values(employees::name.eq(name))
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Deletes an employee. Their rate table cascades; work history does not.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(employees::table.filter(employees::employee_id.eq(employee_id)))
        .execute(conn)?;
    Ok(())
}

/// Inserts an effective-dated employee rate entry.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_employee_rate(
    conn: &mut SqliteConnection,
    employee_id: i64,
    effective_date: NaiveDate,
    rate: Decimal,
) -> Result<(), PersistenceError> {
    let record: NewEmployeeRate = NewEmployeeRate {
        employee_id,
        effective_date: format_date(effective_date),
        rate: format_decimal(rate),
    };
    diesel::insert_into(employee_rates::table)
        .values(&record)
        .execute(conn)?;
    Ok(())
}

/// Inserts a vehicle and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_vehicle(conn: &mut SqliteConnection, name: &str) -> Result<i64, PersistenceError> {
    diesel::insert_into(vehicles::table)
        .values(vehicles::name.eq(name))
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Deletes a vehicle. Its rate table cascades; work history does not.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_vehicle(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(vehicles::table.filter(vehicles::vehicle_id.eq(vehicle_id))).execute(conn)?;
    Ok(())
}

/// Inserts an effective-dated vehicle rate entry.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_vehicle_rate(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
    effective_date: NaiveDate,
    rate: Decimal,
) -> Result<(), PersistenceError> {
    let record: NewVehicleRate = NewVehicleRate {
        vehicle_id,
        effective_date: format_date(effective_date),
        rate: format_decimal(rate),
    };
    diesel::insert_into(vehicle_rates::table)
        .values(&record)
        .execute(conn)?;
    Ok(())
}

/// Inserts a jobsite material and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_jobsite_material(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    name: &str,
    unit_rate: Decimal,
    trucking_rate: Decimal,
    rate_estimated: bool,
) -> Result<i64, PersistenceError> {
    let record: NewJobsiteMaterial = NewJobsiteMaterial {
        jobsite_id,
        name: name.to_string(),
        unit_rate: format_decimal(unit_rate),
        trucking_rate: format_decimal(trucking_rate),
        rate_estimated: i32::from(rate_estimated),
    };
    diesel::insert_into(jobsite_materials::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Updates a jobsite material's pricing (e.g., when a quote replaces an
/// estimate).
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_jobsite_material_rates(
    conn: &mut SqliteConnection,
    jobsite_material_id: i64,
    unit_rate: Decimal,
    trucking_rate: Decimal,
    rate_estimated: bool,
) -> Result<(), PersistenceError> {
    diesel::update(
        jobsite_materials::table
            .filter(jobsite_materials::jobsite_material_id.eq(jobsite_material_id)),
    )
    .set((
        jobsite_materials::unit_rate.eq(format_decimal(unit_rate)),
        jobsite_materials::trucking_rate.eq(format_decimal(trucking_rate)),
        jobsite_materials::rate_estimated.eq(i32::from(rate_estimated)),
    ))
    .execute(conn)?;
    Ok(())
}

/// Inserts an employee work record and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_employee_work(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    employee_id: i64,
    crew_type: &CrewType,
    worked_at: DateTime<Utc>,
    hours: Decimal,
) -> Result<i64, PersistenceError> {
    let record: NewEmployeeWork = NewEmployeeWork {
        jobsite_id,
        employee_id,
        crew_type: crew_type.value().to_string(),
        worked_at: format_datetime(worked_at),
        hours: format_decimal(hours),
    };
    diesel::insert_into(employee_work::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Moves or re-measures an existing employee work record.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_employee_work(
    conn: &mut SqliteConnection,
    record_id: i64,
    jobsite_id: i64,
    worked_at: DateTime<Utc>,
    hours: Decimal,
) -> Result<(), PersistenceError> {
    diesel::update(employee_work::table.filter(employee_work::record_id.eq(record_id)))
        .set((
            employee_work::jobsite_id.eq(jobsite_id),
            employee_work::worked_at.eq(format_datetime(worked_at)),
            employee_work::hours.eq(format_decimal(hours)),
        ))
        .execute(conn)?;
    Ok(())
}

/// Deletes an employee work record.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_employee_work(
    conn: &mut SqliteConnection,
    record_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(employee_work::table.filter(employee_work::record_id.eq(record_id)))
        .execute(conn)?;
    Ok(())
}

/// Inserts a vehicle work record and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_vehicle_work(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    vehicle_id: i64,
    crew_type: &CrewType,
    worked_at: DateTime<Utc>,
    hours: Decimal,
) -> Result<i64, PersistenceError> {
    let record: NewVehicleWork = NewVehicleWork {
        jobsite_id,
        vehicle_id,
        crew_type: crew_type.value().to_string(),
        worked_at: format_datetime(worked_at),
        hours: format_decimal(hours),
    };
    diesel::insert_into(vehicle_work::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Deletes a vehicle work record.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_vehicle_work(
    conn: &mut SqliteConnection,
    record_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(vehicle_work::table.filter(vehicle_work::record_id.eq(record_id)))
        .execute(conn)?;
    Ok(())
}

/// Inserts a material shipment and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_material_shipment(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    jobsite_material_id: i64,
    crew_type: &CrewType,
    delivered_at: DateTime<Utc>,
    quantity: Decimal,
) -> Result<i64, PersistenceError> {
    let record: NewMaterialShipment = NewMaterialShipment {
        jobsite_id,
        jobsite_material_id,
        crew_type: crew_type.value().to_string(),
        delivered_at: format_datetime(delivered_at),
        quantity: format_decimal(quantity),
    };
    diesel::insert_into(material_shipments::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Deletes a material shipment.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_material_shipment(
    conn: &mut SqliteConnection,
    shipment_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(
        material_shipments::table.filter(material_shipments::shipment_id.eq(shipment_id)),
    )
    .execute(conn)?;
    Ok(())
}

/// Inserts a production entry and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_production_entry(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    produced_at: DateTime<Utc>,
    quantity: Decimal,
    note: Option<&str>,
) -> Result<i64, PersistenceError> {
    let record: NewProductionEntry = NewProductionEntry {
        jobsite_id,
        produced_at: format_datetime(produced_at),
        quantity: format_decimal(quantity),
        note: note.map(ToString::to_string),
    };
    diesel::insert_into(production_entries::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Inserts an invoice and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
#[allow(clippy::fn_params_excessive_bools)]
pub fn insert_invoice(
    conn: &mut SqliteConnection,
    jobsite_id: i64,
    invoice_date: NaiveDate,
    amount: Decimal,
    is_revenue: bool,
    is_internal: bool,
    is_accrual: bool,
    description: Option<&str>,
) -> Result<i64, PersistenceError> {
    let record: NewInvoice = NewInvoice {
        jobsite_id,
        invoice_date: format_date(invoice_date),
        amount: format_decimal(amount),
        is_revenue: i32::from(is_revenue),
        is_internal: i32::from(is_internal),
        is_accrual: i32::from(is_accrual),
        description: description.map(ToString::to_string),
    };
    diesel::insert_into(invoices::table)
        .values(&record)
        .execute(conn)?;
    get_last_insert_rowid(conn)
}

/// Re-dates or re-prices an existing invoice.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_invoice(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    invoice_date: NaiveDate,
    amount: Decimal,
) -> Result<(), PersistenceError> {
    diesel::update(invoices::table.filter(invoices::invoice_id.eq(invoice_id)))
        .set((
            invoices::invoice_date.eq(format_date(invoice_date)),
            invoices::amount.eq(format_decimal(amount)),
        ))
        .execute(conn)?;
    Ok(())
}

/// Deletes an invoice.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_invoice(
    conn: &mut SqliteConnection,
    invoice_id: i64,
) -> Result<(), PersistenceError> {
    diesel::delete(invoices::table.filter(invoices::invoice_id.eq(invoice_id))).execute(conn)?;
    Ok(())
}

/// Sets the organization timezone (single-row upsert).
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn set_org_timezone(
    conn: &mut SqliteConnection,
    timezone: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(org_settings::table)
        .values((
            org_settings::setting_id.eq(1),
            org_settings::timezone.eq(timezone),
        ))
        .on_conflict(org_settings::setting_id)
        .do_update()
        .set(org_settings::timezone.eq(timezone))
        .execute(conn)?;
    Ok(())
}

/// Inserts an effective-dated organization overhead rate.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_overhead_rate(
    conn: &mut SqliteConnection,
    effective_date: NaiveDate,
    rate: Decimal,
) -> Result<(), PersistenceError> {
    diesel::insert_into(org_overhead_rates::table)
        .values((
            org_overhead_rates::effective_date.eq(format_date(effective_date)),
            org_overhead_rates::rate.eq(format_decimal(rate)),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts an effective-dated external invoice surcharge rate.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_surcharge_rate(
    conn: &mut SqliteConnection,
    effective_date: NaiveDate,
    rate: Decimal,
) -> Result<(), PersistenceError> {
    diesel::insert_into(org_surcharge_rates::table)
        .values((
            org_surcharge_rates::effective_date.eq(format_date(effective_date)),
            org_surcharge_rates::rate.eq(format_decimal(rate)),
        ))
        .execute(conn)?;
    Ok(())
}
