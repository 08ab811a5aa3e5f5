// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the SiteCost aggregation engine.
//!
//! This crate stores the raw operational records, the organization
//! configuration, and the materialized report store on `SQLite` via Diesel.
//!
//! ## The report store
//!
//! Every aggregate (day, month, year, master) is one row in the `reports`
//! table, keyed by `(level, jobsite, period_start)` with a UNIQUE
//! constraint. The row carries the staleness state machine next to the
//! document body:
//!
//! - `Requested` — a rebuild is owed; the stored document (if any) is stale
//! - `Pending` — a worker holds the claim and is rebuilding
//! - `Current` — the stored document reflects all known data
//!
//! Claims, completions, and stall reclaims are all conditional UPDATEs
//! filtered on the current state, so any number of workers can race on the
//! same store without an external lock manager.
//!
//! ## Testing
//!
//! Tests run against unique shared in-memory databases, one per test, named
//! by an atomic counter to rule out collisions.

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
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, NaiveDate, Utc};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use sitecost_domain::{
    AggregateLevel, AggregateRef, CrewType, DayReport, EmployeeWorkRecord, Invoice,
    JobsiteMaterial, MaterialShipment, OrgConfig, ProductionEntry, RateEntry, StalenessState,
    VehicleWorkRecord,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod sqlite;

#[cfg(test)]
mod tests;

pub use data_models::ReportRow;
pub use error::PersistenceError;
pub use mutations::reports::CompleteOutcome;

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based collisions.
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name: String = format!("memdb_sitecost_{db_id}");
        let shared_memory_url: String = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = sqlite::initialize_database(&shared_memory_url)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = sqlite::initialize_database(path_str)?;
        sqlite::enable_wal_mode(&mut conn)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Organization configuration
    // ========================================================================

    /// Sets the organization timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn set_org_timezone(&mut self, timezone: &str) -> Result<(), PersistenceError> {
        mutations::records::set_org_timezone(&mut self.conn, timezone)
    }

    /// Inserts an effective-dated organization overhead rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_overhead_rate(
        &mut self,
        effective_date: NaiveDate,
        rate: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::insert_overhead_rate(&mut self.conn, effective_date, rate)
    }

    /// Inserts an effective-dated external invoice surcharge rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_surcharge_rate(
        &mut self,
        effective_date: NaiveDate,
        rate: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::insert_surcharge_rate(&mut self.conn, effective_date, rate)
    }

    /// Loads the organization configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is missing or corrupt.
    pub fn org_config(&mut self) -> Result<OrgConfig, PersistenceError> {
        queries::records::org_config(&mut self.conn)
    }

    // ========================================================================
    // Raw record CRUD
    // ========================================================================

    /// Inserts a jobsite and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_jobsite(&mut self, name: &str) -> Result<i64, PersistenceError> {
        mutations::records::insert_jobsite(&mut self.conn, name)
    }

    /// Lists all jobsite ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn jobsite_ids(&mut self) -> Result<Vec<i64>, PersistenceError> {
        queries::records::jobsite_ids(&mut self.conn)
    }

    /// Inserts an employee and returns their id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_employee(&mut self, name: &str) -> Result<i64, PersistenceError> {
        mutations::records::insert_employee(&mut self.conn, name)
    }

    /// Deletes an employee, leaving their work history in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_employee(&mut self, employee_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_employee(&mut self.conn, employee_id)
    }

    /// Inserts an effective-dated employee rate entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_employee_rate(
        &mut self,
        employee_id: i64,
        effective_date: NaiveDate,
        rate: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::insert_employee_rate(&mut self.conn, employee_id, effective_date, rate)
    }

    /// Inserts a vehicle and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_vehicle(&mut self, name: &str) -> Result<i64, PersistenceError> {
        mutations::records::insert_vehicle(&mut self.conn, name)
    }

    /// Deletes a vehicle, leaving its work history in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_vehicle(&mut self, vehicle_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_vehicle(&mut self.conn, vehicle_id)
    }

    /// Inserts an effective-dated vehicle rate entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_vehicle_rate(
        &mut self,
        vehicle_id: i64,
        effective_date: NaiveDate,
        rate: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::insert_vehicle_rate(&mut self.conn, vehicle_id, effective_date, rate)
    }

    /// Inserts a jobsite material and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_jobsite_material(
        &mut self,
        jobsite_id: i64,
        name: &str,
        unit_rate: Decimal,
        trucking_rate: Decimal,
        rate_estimated: bool,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_jobsite_material(
            &mut self.conn,
            jobsite_id,
            name,
            unit_rate,
            trucking_rate,
            rate_estimated,
        )
    }

    /// Updates a jobsite material's pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_jobsite_material_rates(
        &mut self,
        jobsite_material_id: i64,
        unit_rate: Decimal,
        trucking_rate: Decimal,
        rate_estimated: bool,
    ) -> Result<(), PersistenceError> {
        mutations::records::update_jobsite_material_rates(
            &mut self.conn,
            jobsite_material_id,
            unit_rate,
            trucking_rate,
            rate_estimated,
        )
    }

    /// Inserts an employee work record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_employee_work(
        &mut self,
        jobsite_id: i64,
        employee_id: i64,
        crew_type: &CrewType,
        worked_at: DateTime<Utc>,
        hours: Decimal,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_employee_work(
            &mut self.conn,
            jobsite_id,
            employee_id,
            crew_type,
            worked_at,
            hours,
        )
    }

    /// Moves or re-measures an existing employee work record.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_employee_work(
        &mut self,
        record_id: i64,
        jobsite_id: i64,
        worked_at: DateTime<Utc>,
        hours: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::update_employee_work(
            &mut self.conn,
            record_id,
            jobsite_id,
            worked_at,
            hours,
        )
    }

    /// Deletes an employee work record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_employee_work(&mut self, record_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_employee_work(&mut self.conn, record_id)
    }

    /// Inserts a vehicle work record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_vehicle_work(
        &mut self,
        jobsite_id: i64,
        vehicle_id: i64,
        crew_type: &CrewType,
        worked_at: DateTime<Utc>,
        hours: Decimal,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_vehicle_work(
            &mut self.conn,
            jobsite_id,
            vehicle_id,
            crew_type,
            worked_at,
            hours,
        )
    }

    /// Deletes a vehicle work record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_vehicle_work(&mut self, record_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_vehicle_work(&mut self.conn, record_id)
    }

    /// Inserts a material shipment and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_material_shipment(
        &mut self,
        jobsite_id: i64,
        jobsite_material_id: i64,
        crew_type: &CrewType,
        delivered_at: DateTime<Utc>,
        quantity: Decimal,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_material_shipment(
            &mut self.conn,
            jobsite_id,
            jobsite_material_id,
            crew_type,
            delivered_at,
            quantity,
        )
    }

    /// Deletes a material shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_material_shipment(&mut self, shipment_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_material_shipment(&mut self.conn, shipment_id)
    }

    /// Inserts a production entry and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_production_entry(
        &mut self,
        jobsite_id: i64,
        produced_at: DateTime<Utc>,
        quantity: Decimal,
        note: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_production_entry(
            &mut self.conn,
            jobsite_id,
            produced_at,
            quantity,
            note,
        )
    }

    /// Inserts an invoice and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[allow(clippy::fn_params_excessive_bools)]
    #[allow(clippy::too_many_arguments)]
    pub fn insert_invoice(
        &mut self,
        jobsite_id: i64,
        invoice_date: NaiveDate,
        amount: Decimal,
        is_revenue: bool,
        is_internal: bool,
        is_accrual: bool,
        description: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        mutations::records::insert_invoice(
            &mut self.conn,
            jobsite_id,
            invoice_date,
            amount,
            is_revenue,
            is_internal,
            is_accrual,
            description,
        )
    }

    /// Re-dates or re-prices an existing invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_invoice(
        &mut self,
        invoice_id: i64,
        invoice_date: NaiveDate,
        amount: Decimal,
    ) -> Result<(), PersistenceError> {
        mutations::records::update_invoice(&mut self.conn, invoice_id, invoice_date, amount)
    }

    /// Deletes an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_invoice(&mut self, invoice_id: i64) -> Result<(), PersistenceError> {
        mutations::records::delete_invoice(&mut self.conn, invoice_id)
    }

    // ========================================================================
    // Rebuild input queries
    // ========================================================================

    /// Fetches employee work for one jobsite inside a UTC window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn employee_work_between(
        &mut self,
        jobsite_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EmployeeWorkRecord>, PersistenceError> {
        queries::records::employee_work_between(&mut self.conn, jobsite_id, start, end)
    }

    /// Fetches vehicle work for one jobsite inside a UTC window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn vehicle_work_between(
        &mut self,
        jobsite_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<VehicleWorkRecord>, PersistenceError> {
        queries::records::vehicle_work_between(&mut self.conn, jobsite_id, start, end)
    }

    /// Fetches material shipments for one jobsite inside a UTC window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn shipments_between(
        &mut self,
        jobsite_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MaterialShipment>, PersistenceError> {
        queries::records::shipments_between(&mut self.conn, jobsite_id, start, end)
    }

    /// Fetches production entries for one jobsite inside a UTC window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn production_between(
        &mut self,
        jobsite_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductionEntry>, PersistenceError> {
        queries::records::production_between(&mut self.conn, jobsite_id, start, end)
    }

    /// Fetches rate tables for existing employees, keyed by employee id.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a row is corrupt.
    pub fn employee_rate_tables(
        &mut self,
        employee_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<RateEntry>>, PersistenceError> {
        queries::records::employee_rate_tables(&mut self.conn, employee_ids)
    }

    /// Fetches rate tables for existing vehicles, keyed by vehicle id.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a row is corrupt.
    pub fn vehicle_rate_tables(
        &mut self,
        vehicle_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<RateEntry>>, PersistenceError> {
        queries::records::vehicle_rate_tables(&mut self.conn, vehicle_ids)
    }

    /// Fetches existing jobsite materials by id, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn materials_by_ids(
        &mut self,
        jobsite_material_ids: &[i64],
    ) -> Result<HashMap<i64, JobsiteMaterial>, PersistenceError> {
        queries::records::materials_by_ids(&mut self.conn, jobsite_material_ids)
    }

    /// Fetches invoices for one jobsite dated inside `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn invoices_between(
        &mut self,
        jobsite_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Invoice>, PersistenceError> {
        queries::records::invoices_between(&mut self.conn, jobsite_id, start, end)
    }

    // ========================================================================
    // Report store
    // ========================================================================

    /// Ensures a placeholder row exists for an aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn ensure_report(
        &mut self,
        aggregate: &AggregateRef,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        mutations::reports::ensure_report(&mut self.conn, aggregate, now)
    }

    /// Marks an aggregate stale, creating its row if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn mark_requested(
        &mut self,
        aggregate: &AggregateRef,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        mutations::reports::mark_requested(&mut self.conn, aggregate, now)
    }

    /// Atomically claims a `Requested` aggregate for rebuild.
    ///
    /// Returns the claim token on success; `None` if the claim was lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn claim(
        &mut self,
        report_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, PersistenceError> {
        mutations::reports::claim(&mut self.conn, report_id, now)
    }

    /// Stores a rebuilt document and settles the claim.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn complete_rebuild(
        &mut self,
        report_id: i64,
        claim_token: &str,
        document_json: &str,
        built_at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, PersistenceError> {
        mutations::reports::complete_rebuild(
            &mut self.conn,
            report_id,
            claim_token,
            document_json,
            built_at,
        )
    }

    /// Releases a claim after a failed rebuild, requeueing the aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn fail_rebuild(
        &mut self,
        report_id: i64,
        claim_token: &str,
    ) -> Result<(), PersistenceError> {
        mutations::reports::fail_rebuild(&mut self.conn, report_id, claim_token)
    }

    /// Requeues `Pending` claims older than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn reclaim_stalled(&mut self, cutoff: DateTime<Utc>) -> Result<usize, PersistenceError> {
        mutations::reports::reclaim_stalled(&mut self.conn, cutoff)
    }

    /// Deletes report rows by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_reports(&mut self, report_ids: &[i64]) -> Result<(), PersistenceError> {
        mutations::reports::delete_reports(&mut self.conn, report_ids)
    }

    /// Fetches a report row by its aggregate reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_report(
        &mut self,
        aggregate: &AggregateRef,
    ) -> Result<Option<ReportRow>, PersistenceError> {
        queries::reports::find_report(&mut self.conn, aggregate)
    }

    /// Fetches a report row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn report_by_id(&mut self, report_id: i64) -> Result<Option<ReportRow>, PersistenceError> {
        queries::reports::report_by_id(&mut self.conn, report_id)
    }

    /// Lists `Requested` aggregates at one level, oldest period first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn requested_reports(
        &mut self,
        level: AggregateLevel,
        limit: i64,
    ) -> Result<Vec<ReportRow>, PersistenceError> {
        queries::reports::requested_reports(&mut self.conn, level, limit)
    }

    /// Fetches built day reports for one jobsite with days in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored document is corrupt.
    pub fn day_reports_in_period(
        &mut self,
        jobsite_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(i64, DayReport)>, PersistenceError> {
        queries::reports::day_reports_in_period(&mut self.conn, jobsite_id, start, end)
    }

    /// Fetches `(jobsite_id, report_id)` pairs for year report rows of
    /// one fiscal year, placeholders included.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn year_report_refs(
        &mut self,
        fiscal_year_start: NaiveDate,
    ) -> Result<Vec<(i64, i64)>, PersistenceError> {
        queries::reports::year_report_refs(&mut self.conn, fiscal_year_start)
    }

    /// Lists the jobsites with any day-level report row in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_day_jobsites(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<i64>, PersistenceError> {
        queries::reports::active_day_jobsites(&mut self.conn, start, end)
    }

    /// Counts report rows currently in a given staleness state.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_in_state(&mut self, state: StalenessState) -> Result<i64, PersistenceError> {
        queries::reports::count_in_state(&mut self.conn, state)
    }
}
