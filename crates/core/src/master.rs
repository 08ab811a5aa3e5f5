// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Master report builder.
//!
//! The master report is a thin index over per-jobsite year reports for one
//! fiscal year. It stores references rather than copied figures, so a year
//! rebuild never leaves the master holding stale numbers.

use sitecost_domain::{MasterEntry, MasterReport};
use std::collections::BTreeMap;

/// Builds the master report for a fiscal year.
///
/// `year_reports` pairs each jobsite id with the report-store id of its
/// year report. Duplicate jobsite ids keep the lowest report id, mirroring
/// the day-level dedup rule. Jobsites with no year report simply do not
/// appear.
#[must_use]
pub fn build_master_report(fiscal_year: i32, year_reports: &[(i64, i64)]) -> MasterReport {
    let mut by_jobsite: BTreeMap<i64, i64> = BTreeMap::new();
    for (jobsite_id, year_report_id) in year_reports {
        by_jobsite
            .entry(*jobsite_id)
            .and_modify(|kept| {
                if *year_report_id < *kept {
                    *kept = *year_report_id;
                }
            })
            .or_insert(*year_report_id);
    }

    MasterReport {
        fiscal_year,
        entries: by_jobsite
            .into_iter()
            .map(|(jobsite_id, year_report_id)| MasterEntry {
                jobsite_id,
                year_report_id,
            })
            .collect(),
    }
}
