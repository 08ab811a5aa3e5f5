// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Db;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal_macros::dec;
use sitecost_persistence::Persistence;
use std::sync::{Arc, Mutex};

pub fn new_db() -> Db {
    Arc::new(Mutex::new(Persistence::new_in_memory().unwrap()))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// Seeds the organization config: Denver time, 10% overhead, 3% surcharge.
pub fn seed_org(db: &Db) {
    let mut persistence = db.lock().unwrap();
    persistence.set_org_timezone("America/Denver").unwrap();
    persistence
        .insert_overhead_rate(date(2020, 1, 1), dec!(0.10))
        .unwrap();
    persistence
        .insert_surcharge_rate(date(2020, 1, 1), dec!(0.03))
        .unwrap();
}
