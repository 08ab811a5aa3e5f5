// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A typed finding surfaced by an aggregate build.
///
/// Issues carry enough reference data for a caller to resolve them. They
/// are embedded in the report document and recomputed wholesale on every
/// rebuild, never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Issue {
    /// An employee work line resolved to a zero hourly rate.
    ZeroEmployeeRate {
        /// The employee with no effective rate.
        employee_id: i64,
        /// The day the work was performed.
        day: NaiveDate,
    },
    /// A vehicle work line resolved to a zero hourly rate.
    ZeroVehicleRate {
        /// The vehicle with no effective rate.
        vehicle_id: i64,
        /// The day the usage occurred.
        day: NaiveDate,
    },
    /// An employee referenced by a work record no longer exists.
    MissingEmployee {
        /// The missing employee id.
        employee_id: i64,
        /// The day the work was performed.
        day: NaiveDate,
    },
    /// A vehicle referenced by a work record no longer exists.
    MissingVehicle {
        /// The missing vehicle id.
        vehicle_id: i64,
        /// The day the usage occurred.
        day: NaiveDate,
    },
    /// A jobsite material referenced by a shipment no longer exists.
    MissingMaterial {
        /// The missing jobsite material id.
        jobsite_material_id: i64,
        /// The day the shipment was delivered.
        day: NaiveDate,
    },
    /// A shipment was costed with a rate still flagged as estimated.
    EstimatedMaterialRate {
        /// The jobsite material with the estimated rate.
        jobsite_material_id: i64,
        /// The day the shipment was delivered.
        day: NaiveDate,
    },
    /// A shipment was costed with a zero unit rate.
    ZeroMaterialRate {
        /// The jobsite material with the zero rate.
        jobsite_material_id: i64,
        /// The day the shipment was delivered.
        day: NaiveDate,
    },
    /// A shipment was costed with a zero trucking rate.
    ZeroTruckingRate {
        /// The jobsite material with the zero trucking rate.
        jobsite_material_id: i64,
        /// The day the shipment was delivered.
        day: NaiveDate,
    },
    /// A material rate was still flagged estimated after the period closed.
    EstimatedRateAtPeriodClose {
        /// The jobsite material still carrying an estimated rate.
        jobsite_material_id: i64,
    },
}
