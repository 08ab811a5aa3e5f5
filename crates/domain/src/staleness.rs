// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The staleness lifecycle of a materialized report.
///
/// Every report row carries one of these states. Transitions are driven by
/// the invalidation propagator (`Current → Requested`), the worker claim
/// (`Requested → Pending`), and rebuild completion (`Pending → Current` on
/// success, `Pending → Requested` on failure or when a new request arrived
/// while the rebuild was in flight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StalenessState {
    /// The last build reflects all known inputs.
    Current,
    /// An input changed; a rebuild is owed but not yet claimed.
    #[default]
    Requested,
    /// A worker has claimed this report and is rebuilding it now.
    Pending,
}

impl FromStr for StalenessState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Current" => Ok(Self::Current),
            "Requested" => Ok(Self::Requested),
            "Pending" => Ok(Self::Pending),
            _ => Err(DomainError::InvalidStalenessState(s.to_string())),
        }
    }
}

impl std::fmt::Display for StalenessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StalenessState {
    /// Converts this state to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Requested => "Requested",
            Self::Pending => "Pending",
        }
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// Valid transitions are:
    /// - `Current` → `Requested` (invalidation)
    /// - `Requested` → `Pending` (worker claim)
    /// - `Pending` → `Current` (successful rebuild)
    /// - `Pending` → `Requested` (failed rebuild, or a request arrived mid-rebuild)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Current, Self::Requested)
                | (Self::Requested, Self::Pending)
                | (Self::Pending, Self::Current | Self::Requested)
        )
    }

    /// Returns whether a rebuild may be claimed from this state.
    #[must_use]
    pub const fn is_claimable(&self) -> bool {
        matches!(self, Self::Requested)
    }
}
