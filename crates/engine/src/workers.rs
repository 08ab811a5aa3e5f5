// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Polling rebuild workers.
//!
//! One loop per aggregate level plus one stall reclaimer. Each level
//! polls on its own interval, fastest at the day level and slowest at
//! the master, but ordering is not required for correctness: a period
//! rebuilt from a still-stale day is itself re-marked as soon as the day
//! rebuild lands.

use crate::error::EngineError;
use crate::rebuild::{RebuildOutcome, rebuild_one};
use crate::{Db, lock_db};
use chrono::{DateTime, Duration, Utc};
use sitecost_domain::AggregateLevel;
use sitecost_persistence::ReportRow;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Tuning knobs for the worker loops.
///
/// Each level polls on its own interval. Day reports change most often and
/// feed everything above them, so the defaults scan Day most frequently and
/// Master least frequently.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    /// How often the day loop polls for `Requested` aggregates.
    pub day_poll_interval: std::time::Duration,
    /// How often the month loop polls.
    pub month_poll_interval: std::time::Duration,
    /// How often the year loop polls.
    pub year_poll_interval: std::time::Duration,
    /// How often the master loop polls.
    pub master_poll_interval: std::time::Duration,
    /// How many aggregates one poll claims and rebuilds.
    pub claim_batch: i64,
    /// `Pending` claims older than this are treated as stalled.
    pub stall_timeout: Duration,
    /// How often the stall reclaimer runs.
    pub reclaim_interval: std::time::Duration,
}

impl WorkerConfig {
    /// Returns the poll interval for one level's loop.
    #[must_use]
    pub const fn poll_interval(&self, level: AggregateLevel) -> std::time::Duration {
        match level {
            AggregateLevel::Day => self.day_poll_interval,
            AggregateLevel::Month => self.month_poll_interval,
            AggregateLevel::Year => self.year_poll_interval,
            AggregateLevel::Master => self.master_poll_interval,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            day_poll_interval: std::time::Duration::from_secs(2),
            month_poll_interval: std::time::Duration::from_secs(5),
            year_poll_interval: std::time::Duration::from_secs(15),
            master_poll_interval: std::time::Duration::from_secs(60),
            claim_batch: 16,
            stall_timeout: Duration::minutes(5),
            reclaim_interval: std::time::Duration::from_secs(60),
        }
    }
}

/// Runs one rebuild pass over `Requested` aggregates at one level.
///
/// Returns the number of rebuilds that landed. Claim losses are skipped
/// silently; build failures are logged and leave the aggregate queued.
///
/// # Errors
///
/// Returns an error if the queue itself cannot be read.
pub fn scan_level(
    db: &Db,
    level: AggregateLevel,
    batch: i64,
    now: DateTime<Utc>,
) -> Result<usize, EngineError> {
    let queued: Vec<ReportRow> = {
        let mut persistence = lock_db(db)?;
        persistence.requested_reports(level, batch)?
    };

    let mut landed: usize = 0;
    for row in queued {
        match rebuild_one(db, row.report_id, now) {
            Ok(RebuildOutcome::Settled(_)) => landed += 1,
            Ok(RebuildOutcome::ClaimLost) => {}
            Err(err) => {
                error!(report_id = row.report_id, level = %level, error = %err,
                    "rebuild failed, aggregate stays queued");
            }
        }
    }
    Ok(landed)
}

/// Requeues `Pending` claims older than the configured stall timeout.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn scan_stalled(
    db: &Db,
    stall_timeout: Duration,
    now: DateTime<Utc>,
) -> Result<usize, EngineError> {
    let cutoff: DateTime<Utc> = now - stall_timeout;
    let reclaimed: usize = {
        let mut persistence = lock_db(db)?;
        persistence.reclaim_stalled(cutoff)?
    };
    if reclaimed > 0 {
        info!(reclaimed, "requeued stalled rebuild claims");
    }
    Ok(reclaimed)
}

/// Spawns the four level workers and the stall reclaimer.
///
/// Each level loop runs on its own interval from the config. Scans are
/// synchronous database work and run on the blocking pool so they never
/// stall the async runtime. The returned handles run until aborted; the
/// loops log and keep polling on errors.
#[must_use]
pub fn spawn(db: &Db, config: WorkerConfig) -> Vec<JoinHandle<()>> {
    let levels: [AggregateLevel; 4] = [
        AggregateLevel::Day,
        AggregateLevel::Month,
        AggregateLevel::Year,
        AggregateLevel::Master,
    ];

    let mut handles: Vec<JoinHandle<()>> = levels
        .iter()
        .map(|&level| {
            let db: Db = db.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(config.poll_interval(level));
                loop {
                    ticker.tick().await;
                    let scan_db: Db = db.clone();
                    let scanned = tokio::task::spawn_blocking(move || {
                        scan_level(&scan_db, level, config.claim_batch, Utc::now())
                    })
                    .await;
                    match scanned {
                        Ok(Ok(_)) => {}
                        Ok(Err(err)) => {
                            error!(level = %level, error = %err, "rebuild scan failed");
                        }
                        Err(err) => {
                            error!(level = %level, error = %err, "rebuild scan panicked");
                        }
                    }
                }
            })
        })
        .collect();

    let db: Db = db.clone();
    handles.push(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.reclaim_interval);
        loop {
            ticker.tick().await;
            let scan_db: Db = db.clone();
            let reclaimed = tokio::task::spawn_blocking(move || {
                scan_stalled(&scan_db, config.stall_timeout, Utc::now())
            })
            .await;
            match reclaimed {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => error!(error = %err, "stall reclaim failed"),
                Err(err) => error!(error = %err, "stall reclaim panicked"),
            }
        }
    }));

    handles
}
