// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Month and year report builder.
//!
//! Period reports roll up the day reports they own and fold in invoices
//! matched purely by invoice date. Invoices never flow through the day
//! level, so a day rebuild can never change which period an invoice lands
//! in.

use crate::error::CoreError;
use sitecost_domain::{
    ConfigSnapshot, DayReport, Granularity, Invoice, InvoiceClass, Issue, PeriodReport,
    PeriodSummary, period_contains, period_end,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// The result of a period rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBuildOutcome {
    /// The rebuilt period report.
    pub report: PeriodReport,
    /// Report-store ids of duplicate day reports that lost the dedup.
    ///
    /// When two stored day reports claim the same `(jobsite, day)` the one
    /// with the lowest id wins; the rest are orphans the caller should
    /// delete.
    pub orphan_day_report_ids: Vec<i64>,
}

/// Builds the period report for one `(jobsite, month|year)`.
///
/// `day_reports` pairs each stored day report with its report-store id and
/// must already be restricted to this jobsite and period. `as_of` is the
/// current day in the organization timezone; it decides whether the period
/// has closed for the estimated-rate-at-close check.
///
/// # Errors
///
/// Returns an error if a day report falls outside the period or belongs to
/// another jobsite, or if date arithmetic overflows.
pub fn build_period_report(
    jobsite_id: i64,
    granularity: Granularity,
    period_start: NaiveDate,
    day_reports: &[(i64, DayReport)],
    invoices: &[Invoice],
    config: &ConfigSnapshot,
    as_of: NaiveDate,
) -> Result<PeriodBuildOutcome, CoreError> {
    let end: NaiveDate = period_end(granularity.level(), period_start)?;

    // Lowest-id day report wins a duplicate day; the rest are orphans.
    let mut by_day: BTreeMap<NaiveDate, (i64, &DayReport)> = BTreeMap::new();
    let mut orphan_day_report_ids: Vec<i64> = Vec::new();
    for (report_id, report) in day_reports {
        if report.jobsite_id != jobsite_id {
            return Err(CoreError::MismatchedJobsite {
                expected: jobsite_id,
                found: report.jobsite_id,
            });
        }
        if !period_contains(period_start, end, report.day) {
            return Err(CoreError::DayReportOutsidePeriod {
                day: report.day,
                period_start,
            });
        }
        match by_day.get(&report.day) {
            Some((kept_id, _)) if *kept_id <= *report_id => {
                orphan_day_report_ids.push(*report_id);
            }
            Some((kept_id, _)) => {
                orphan_day_report_ids.push(*kept_id);
                by_day.insert(report.day, (*report_id, report));
            }
            None => {
                by_day.insert(report.day, (*report_id, report));
            }
        }
    }
    orphan_day_report_ids.sort_unstable();

    let onsite_cost: Decimal = by_day
        .values()
        .map(|(_, report)| report.summary.total_cost)
        .sum();

    let mut external_expense_invoices: Decimal = Decimal::ZERO;
    let mut internal_expense_invoices: Decimal = Decimal::ZERO;
    let mut accrual_expense_invoices: Decimal = Decimal::ZERO;
    let mut external_revenue: Decimal = Decimal::ZERO;
    let mut internal_revenue: Decimal = Decimal::ZERO;
    let mut accrual_revenue: Decimal = Decimal::ZERO;
    for invoice in invoices {
        if invoice.jobsite_id != jobsite_id
            || !period_contains(period_start, end, invoice.invoice_date)
        {
            continue;
        }
        let target: &mut Decimal = match (invoice.is_revenue, invoice.classification()) {
            (true, InvoiceClass::External) => &mut external_revenue,
            (true, InvoiceClass::Internal) => &mut internal_revenue,
            (true, InvoiceClass::Accrual) => &mut accrual_revenue,
            (false, InvoiceClass::External) => &mut external_expense_invoices,
            (false, InvoiceClass::Internal) => &mut internal_expense_invoices,
            (false, InvoiceClass::Accrual) => &mut accrual_expense_invoices,
        };
        *target += invoice.amount;
    }

    let total_revenue: Decimal = external_revenue + internal_revenue + accrual_revenue;
    let total_expenses: Decimal = onsite_cost * (Decimal::ONE + config.overhead_rate)
        + external_expense_invoices * (Decimal::ONE + config.external_surcharge)
        + internal_expense_invoices
        + accrual_expense_invoices;
    let net_income: Decimal = total_revenue - total_expenses;
    let margin: Decimal = if total_expenses == Decimal::ZERO {
        Decimal::ZERO
    } else {
        net_income / total_expenses
    };

    let mut issues: Vec<Issue> = Vec::new();
    let mut estimated_materials: BTreeSet<i64> = BTreeSet::new();
    for (_, report) in by_day.values() {
        for issue in &report.issues {
            if let Issue::EstimatedMaterialRate {
                jobsite_material_id,
                ..
            } = issue
            {
                estimated_materials.insert(*jobsite_material_id);
            }
            issues.push(issue.clone());
        }
    }
    // A rate still estimated after the period closed needs a hard look.
    if as_of >= end {
        for jobsite_material_id in estimated_materials {
            issues.push(Issue::EstimatedRateAtPeriodClose {
                jobsite_material_id,
            });
        }
    }

    let report: PeriodReport = PeriodReport {
        jobsite_id,
        granularity,
        period_start,
        day_report_ids: by_day.values().map(|(report_id, _)| *report_id).collect(),
        summary: PeriodSummary {
            onsite_cost,
            overhead_rate: config.overhead_rate,
            external_surcharge: config.external_surcharge,
            external_expense_invoices,
            internal_expense_invoices,
            accrual_expense_invoices,
            external_revenue,
            internal_revenue,
            accrual_revenue,
            total_revenue,
            total_expenses,
            net_income,
            margin,
        },
        issues,
    };

    Ok(PeriodBuildOutcome {
        report,
        orphan_day_report_ids,
    })
}
