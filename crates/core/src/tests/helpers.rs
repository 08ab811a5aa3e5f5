// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use sitecost_domain::{
    ConfigSnapshot, CrewType, EmployeeWorkRecord, Invoice, JobsiteMaterial, MaterialShipment,
    ProductionEntry, RateEntry, VehicleWorkRecord,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const JOBSITE: i64 = 7;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub fn denver_snapshot() -> ConfigSnapshot {
    ConfigSnapshot {
        timezone: "America/Denver".parse().unwrap(),
        overhead_rate: dec!(0.10),
        external_surcharge: dec!(0.03),
    }
}

pub fn rate_table(effective: NaiveDate, rate: Decimal) -> Vec<RateEntry> {
    vec![RateEntry {
        effective_date: effective,
        rate,
    }]
}

pub fn employee_work(
    record_id: i64,
    employee_id: i64,
    crew: &str,
    worked_at: DateTime<Utc>,
    hours: Decimal,
) -> EmployeeWorkRecord {
    EmployeeWorkRecord {
        record_id,
        jobsite_id: JOBSITE,
        employee_id,
        crew_type: CrewType::new(crew),
        worked_at,
        hours,
    }
}

pub fn vehicle_work(
    record_id: i64,
    vehicle_id: i64,
    crew: &str,
    worked_at: DateTime<Utc>,
    hours: Decimal,
) -> VehicleWorkRecord {
    VehicleWorkRecord {
        record_id,
        jobsite_id: JOBSITE,
        vehicle_id,
        crew_type: CrewType::new(crew),
        worked_at,
        hours,
    }
}

pub fn shipment(
    shipment_id: i64,
    jobsite_material_id: i64,
    crew: &str,
    delivered_at: DateTime<Utc>,
    quantity: Decimal,
) -> MaterialShipment {
    MaterialShipment {
        shipment_id,
        jobsite_id: JOBSITE,
        jobsite_material_id,
        crew_type: CrewType::new(crew),
        delivered_at,
        quantity,
    }
}

pub fn material(
    jobsite_material_id: i64,
    unit_rate: Decimal,
    trucking_rate: Decimal,
    rate_estimated: bool,
) -> JobsiteMaterial {
    JobsiteMaterial {
        jobsite_material_id,
        jobsite_id: JOBSITE,
        name: format!("Material {jobsite_material_id}"),
        unit_rate,
        trucking_rate,
        rate_estimated,
    }
}

pub fn production(entry_id: i64, produced_at: DateTime<Utc>, quantity: Decimal) -> ProductionEntry {
    ProductionEntry {
        entry_id,
        jobsite_id: JOBSITE,
        produced_at,
        quantity,
        note: None,
    }
}

pub fn invoice(
    invoice_id: i64,
    invoice_date: NaiveDate,
    amount: Decimal,
    is_revenue: bool,
    is_internal: bool,
    is_accrual: bool,
) -> Invoice {
    Invoice {
        invoice_id,
        jobsite_id: JOBSITE,
        invoice_date,
        amount,
        is_revenue,
        is_internal,
        is_accrual,
        description: None,
    }
}
