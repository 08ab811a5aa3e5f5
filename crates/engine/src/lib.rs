// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invalidation propagation and rebuild workers.
//!
//! This crate wires the pure builders in `sitecost-core` to the report
//! store in `sitecost-persistence`:
//!
//! - [`propagator`] translates data-change notifications into staleness
//!   marks and cascades staleness up the hierarchy after rebuilds.
//! - [`rebuild`] claims one aggregate, assembles its inputs, runs the
//!   builder, and settles the claim.
//! - [`workers`] runs the polling loops, one per level, plus the stall
//!   reclaimer.
//! - [`ReportService`] is the read/notify facade the HTTP layer talks to.
//!
//! All components share one [`Persistence`] behind an `Arc<Mutex<_>>`; the
//! claim protocol in the store is what makes concurrent workers safe, the
//! mutex only serializes individual statements.

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

use sitecost_persistence::Persistence;
use std::sync::{Arc, Mutex};

mod error;
pub mod propagator;
pub mod rebuild;
mod service;
pub mod workers;

#[cfg(test)]
mod tests;

pub use error::EngineError;
pub use rebuild::RebuildOutcome;
pub use service::{ReportService, ReportStatus};
pub use workers::WorkerConfig;

/// Shared handle to the persistence adapter.
pub type Db = Arc<Mutex<Persistence>>;

/// Locks the shared persistence handle, mapping a poisoned lock to an error.
///
/// # Errors
///
/// Returns an error if a worker panicked while holding the lock.
pub(crate) fn lock_db(db: &Db) -> Result<std::sync::MutexGuard<'_, Persistence>, EngineError> {
    db.lock().map_err(|_| {
        EngineError::Persistence(sitecost_persistence::PersistenceError::QueryFailed(
            "persistence lock poisoned".to_string(),
        ))
    })
}
