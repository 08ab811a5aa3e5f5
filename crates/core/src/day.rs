// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Day report builder.
//!
//! A day report is a pure function of the raw records for one
//! `(jobsite, day)` plus the rate tables in force on that day. Reference
//! problems (deleted employees, estimated rates, zero rates) never fail the
//! build; they are costed at zero where needed and surfaced as issues so
//! totals stay comparable while the data is corrected.

use crate::error::CoreError;
use sitecost_domain::{
    CrewBucket, CrewType, DayReport, DaySummary, EmployeeLine, EmployeeWorkRecord, Issue,
    JobsiteMaterial, MaterialLine, MaterialShipment, ProductionEntry, ProductionLine, RateEntry,
    VehicleLine, VehicleWorkRecord, effective_rate,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// The raw inputs for one jobsite-day rebuild.
///
/// Work records and shipments must already be restricted to the day's UTC
/// window; the builder does not re-filter by timestamp. Rate and material
/// maps are keyed by entity id; a missing key means the entity no longer
/// exists and is reported as a missing-reference issue.
#[derive(Debug, Clone, Default)]
pub struct DayInputs {
    /// Employee work records for the day, any order.
    pub employee_work: Vec<EmployeeWorkRecord>,
    /// Vehicle work records for the day, any order.
    pub vehicle_work: Vec<VehicleWorkRecord>,
    /// Material shipments delivered during the day, any order.
    pub shipments: Vec<MaterialShipment>,
    /// Production entries recorded during the day, any order.
    pub production: Vec<ProductionEntry>,
    /// Rate tables for every employee referenced by the work records.
    pub employee_rates: HashMap<i64, Vec<RateEntry>>,
    /// Rate tables for every vehicle referenced by the work records.
    pub vehicle_rates: HashMap<i64, Vec<RateEntry>>,
    /// Pricing for every jobsite material referenced by the shipments.
    pub materials: HashMap<i64, JobsiteMaterial>,
}

/// Builds the day report for one `(jobsite, day)` pair.
///
/// The same inputs always produce the same document, so a rebuild is
/// idempotent regardless of how many times it is claimed and retried.
///
/// # Errors
///
/// Returns an error if a record in the inputs belongs to another jobsite.
pub fn build_day_report(
    jobsite_id: i64,
    day: NaiveDate,
    inputs: &DayInputs,
) -> Result<DayReport, CoreError> {
    let mut issues: Vec<Issue> = Vec::new();
    let mut buckets: BTreeMap<CrewType, CrewBucket> = BTreeMap::new();

    let employee_lines: Vec<EmployeeLine> =
        build_employee_lines(jobsite_id, day, inputs, &mut issues, &mut buckets)?;
    let vehicle_lines: Vec<VehicleLine> =
        build_vehicle_lines(jobsite_id, day, inputs, &mut issues, &mut buckets)?;
    let material_lines: Vec<MaterialLine> =
        build_material_lines(jobsite_id, day, inputs, &mut issues, &mut buckets)?;
    let production_lines: Vec<ProductionLine> = build_production_lines(jobsite_id, inputs)?;

    let summary: DaySummary = summarize(&employee_lines, &vehicle_lines, &material_lines);

    Ok(DayReport {
        jobsite_id,
        day,
        employee_lines,
        vehicle_lines,
        material_lines,
        production_lines,
        crew_buckets: buckets.into_values().collect(),
        summary,
        issues,
    })
}

fn check_jobsite(expected: i64, found: i64) -> Result<(), CoreError> {
    if expected == found {
        Ok(())
    } else {
        Err(CoreError::MismatchedJobsite { expected, found })
    }
}

fn bucket_for<'a>(
    buckets: &'a mut BTreeMap<CrewType, CrewBucket>,
    crew_type: &CrewType,
) -> &'a mut CrewBucket {
    buckets
        .entry(crew_type.clone())
        .or_insert_with(|| CrewBucket::empty(crew_type.clone()))
}

fn build_employee_lines(
    jobsite_id: i64,
    day: NaiveDate,
    inputs: &DayInputs,
    issues: &mut Vec<Issue>,
    buckets: &mut BTreeMap<CrewType, CrewBucket>,
) -> Result<Vec<EmployeeLine>, CoreError> {
    let mut records: Vec<&EmployeeWorkRecord> = inputs.employee_work.iter().collect();
    records.sort_by_key(|record| record.record_id);

    let mut lines: Vec<EmployeeLine> = Vec::with_capacity(records.len());
    for record in records {
        check_jobsite(jobsite_id, record.jobsite_id)?;
        let rate: Decimal = match inputs.employee_rates.get(&record.employee_id) {
            Some(entries) => {
                let resolved: Decimal = effective_rate(entries, day).unwrap_or(Decimal::ZERO);
                if resolved == Decimal::ZERO {
                    issues.push(Issue::ZeroEmployeeRate {
                        employee_id: record.employee_id,
                        day,
                    });
                }
                resolved
            }
            None => {
                issues.push(Issue::MissingEmployee {
                    employee_id: record.employee_id,
                    day,
                });
                Decimal::ZERO
            }
        };
        let cost: Decimal = record.hours * rate;

        let bucket: &mut CrewBucket = bucket_for(buckets, &record.crew_type);
        bucket.labor_cost += cost;
        bucket.labor_hours += record.hours;

        lines.push(EmployeeLine {
            record_id: record.record_id,
            employee_id: record.employee_id,
            crew_type: record.crew_type.clone(),
            hours: record.hours,
            rate,
            cost,
        });
    }
    Ok(lines)
}

fn build_vehicle_lines(
    jobsite_id: i64,
    day: NaiveDate,
    inputs: &DayInputs,
    issues: &mut Vec<Issue>,
    buckets: &mut BTreeMap<CrewType, CrewBucket>,
) -> Result<Vec<VehicleLine>, CoreError> {
    let mut records: Vec<&VehicleWorkRecord> = inputs.vehicle_work.iter().collect();
    records.sort_by_key(|record| record.record_id);

    let mut lines: Vec<VehicleLine> = Vec::with_capacity(records.len());
    for record in records {
        check_jobsite(jobsite_id, record.jobsite_id)?;
        let rate: Decimal = match inputs.vehicle_rates.get(&record.vehicle_id) {
            Some(entries) => {
                let resolved: Decimal = effective_rate(entries, day).unwrap_or(Decimal::ZERO);
                if resolved == Decimal::ZERO {
                    issues.push(Issue::ZeroVehicleRate {
                        vehicle_id: record.vehicle_id,
                        day,
                    });
                }
                resolved
            }
            None => {
                issues.push(Issue::MissingVehicle {
                    vehicle_id: record.vehicle_id,
                    day,
                });
                Decimal::ZERO
            }
        };
        let cost: Decimal = record.hours * rate;

        let bucket: &mut CrewBucket = bucket_for(buckets, &record.crew_type);
        bucket.equipment_cost += cost;
        bucket.equipment_hours += record.hours;

        lines.push(VehicleLine {
            record_id: record.record_id,
            vehicle_id: record.vehicle_id,
            crew_type: record.crew_type.clone(),
            hours: record.hours,
            rate,
            cost,
        });
    }
    Ok(lines)
}

fn build_material_lines(
    jobsite_id: i64,
    day: NaiveDate,
    inputs: &DayInputs,
    issues: &mut Vec<Issue>,
    buckets: &mut BTreeMap<CrewType, CrewBucket>,
) -> Result<Vec<MaterialLine>, CoreError> {
    let mut shipments: Vec<&MaterialShipment> = inputs.shipments.iter().collect();
    shipments.sort_by_key(|shipment| shipment.shipment_id);

    let mut lines: Vec<MaterialLine> = Vec::with_capacity(shipments.len());
    for shipment in shipments {
        check_jobsite(jobsite_id, shipment.jobsite_id)?;
        let (unit_rate, trucking_rate, rate_estimated) =
            match inputs.materials.get(&shipment.jobsite_material_id) {
                Some(material) => {
                    if material.rate_estimated {
                        issues.push(Issue::EstimatedMaterialRate {
                            jobsite_material_id: shipment.jobsite_material_id,
                            day,
                        });
                    }
                    if material.unit_rate == Decimal::ZERO {
                        issues.push(Issue::ZeroMaterialRate {
                            jobsite_material_id: shipment.jobsite_material_id,
                            day,
                        });
                    }
                    if material.trucking_rate == Decimal::ZERO {
                        issues.push(Issue::ZeroTruckingRate {
                            jobsite_material_id: shipment.jobsite_material_id,
                            day,
                        });
                    }
                    (
                        material.unit_rate,
                        material.trucking_rate,
                        material.rate_estimated,
                    )
                }
                None => {
                    issues.push(Issue::MissingMaterial {
                        jobsite_material_id: shipment.jobsite_material_id,
                        day,
                    });
                    (Decimal::ZERO, Decimal::ZERO, false)
                }
            };
        let material_cost: Decimal = shipment.quantity * unit_rate;
        let trucking_cost: Decimal = shipment.quantity * trucking_rate;

        let bucket: &mut CrewBucket = bucket_for(buckets, &shipment.crew_type);
        bucket.material_cost += material_cost;
        bucket.trucking_cost += trucking_cost;

        lines.push(MaterialLine {
            shipment_id: shipment.shipment_id,
            jobsite_material_id: shipment.jobsite_material_id,
            crew_type: shipment.crew_type.clone(),
            quantity: shipment.quantity,
            unit_rate,
            trucking_rate,
            material_cost,
            trucking_cost,
            rate_estimated,
        });
    }
    Ok(lines)
}

fn build_production_lines(
    jobsite_id: i64,
    inputs: &DayInputs,
) -> Result<Vec<ProductionLine>, CoreError> {
    let mut entries: Vec<&ProductionEntry> = inputs.production.iter().collect();
    entries.sort_by_key(|entry| entry.entry_id);

    let mut lines: Vec<ProductionLine> = Vec::with_capacity(entries.len());
    for entry in entries {
        check_jobsite(jobsite_id, entry.jobsite_id)?;
        lines.push(ProductionLine {
            entry_id: entry.entry_id,
            quantity: entry.quantity,
            note: entry.note.clone(),
        });
    }
    Ok(lines)
}

fn summarize(
    employee_lines: &[EmployeeLine],
    vehicle_lines: &[VehicleLine],
    material_lines: &[MaterialLine],
) -> DaySummary {
    let labor_cost: Decimal = employee_lines.iter().map(|line| line.cost).sum();
    let labor_hours: Decimal = employee_lines.iter().map(|line| line.hours).sum();
    let equipment_cost: Decimal = vehicle_lines.iter().map(|line| line.cost).sum();
    let equipment_hours: Decimal = vehicle_lines.iter().map(|line| line.hours).sum();
    let material_cost: Decimal = material_lines.iter().map(|line| line.material_cost).sum();
    let trucking_cost: Decimal = material_lines.iter().map(|line| line.trucking_cost).sum();

    DaySummary {
        labor_cost,
        labor_hours,
        equipment_cost,
        equipment_hours,
        material_cost,
        trucking_cost,
        total_cost: labor_cost + equipment_cost + material_cost + trucking_cost,
    }
}
