// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Organization configuration used by the period builders.
//!
//! Overhead and surcharge percentages are time-versioned like rate tables.
//! Builders never read configuration ambiently; a [`ConfigSnapshot`] is
//! resolved once per rebuild as of the period start, keeping each build a
//! pure function of its inputs.

use crate::error::DomainError;
use crate::period::parse_timezone;
use crate::records::{RateEntry, effective_rate};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The organization's persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgConfig {
    /// IANA timezone used for all day/period normalization.
    pub timezone: String,
    /// Time-versioned overhead rate applied to internal on-site cost
    /// (e.g., `0.10` for 10%).
    pub overhead_rates: Vec<RateEntry>,
    /// Time-versioned surcharge applied to external expense invoices
    /// (e.g., `0.03` for 3%).
    pub external_surcharges: Vec<RateEntry>,
}

/// Configuration resolved as of a single period start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSnapshot {
    /// The parsed organization timezone.
    pub timezone: Tz,
    /// The overhead rate in force at the snapshot date.
    pub overhead_rate: rust_decimal::Decimal,
    /// The external surcharge in force at the snapshot date.
    pub external_surcharge: rust_decimal::Decimal,
}

impl OrgConfig {
    /// Resolves the configuration snapshot in force on a given date.
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone is missing or unparseable, or if no
    /// overhead or surcharge entry is effective on or before `as_of`.
    /// Configuration errors are fatal to the rebuild that hit them: the
    /// aggregate stays `Requested` and no partial document is written.
    pub fn snapshot_as_of(&self, as_of: NaiveDate) -> Result<ConfigSnapshot, DomainError> {
        if self.timezone.is_empty() {
            return Err(DomainError::MissingTimezone);
        }
        let timezone: Tz = parse_timezone(&self.timezone)?;
        let overhead_rate = effective_rate(&self.overhead_rates, as_of)
            .ok_or(DomainError::MissingOverheadRate { as_of })?;
        let external_surcharge = effective_rate(&self.external_surcharges, as_of)
            .ok_or(DomainError::MissingExternalSurcharge { as_of })?;
        Ok(ConfigSnapshot {
            timezone,
            overhead_rate,
            external_surcharge,
        })
    }

    /// Parses the configured timezone without resolving rates.
    ///
    /// Used by paths that only need normalization (e.g., resolving which
    /// day report owns a raw record).
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone is missing or unparseable.
    pub fn parsed_timezone(&self) -> Result<Tz, DomainError> {
        if self.timezone.is_empty() {
            return Err(DomainError::MissingTimezone);
        }
        parse_timezone(&self.timezone)
    }
}
