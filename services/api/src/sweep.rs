//! services/api/src/sweep.rs
//!
//! This module contains the background "worker" task for scheduled
//! maintenance: failing goals whose window has passed and expiring streaks
//! that missed a day.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use dream_journal_core::JournalEngine;

/// Spawn the maintenance sweeper.
///
/// This is a long-running task that runs one sweep immediately at startup
/// (so a restart catches up on missed days) and then one per interval.
/// It is designed to be gracefully cancelled via a `CancellationToken`.
pub fn spawn_sweeper(
    engine: Arc<JournalEngine>,
    interval_secs: u64,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Maintenance sweeper started (interval: {}s).", interval_secs);
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Maintenance sweeper cancelled.");
                    return;
                }
                _ = ticker.tick() => {
                    match engine.sweep_expired().await {
                        Ok(report) => {
                            if report.goals_failed > 0 || report.streaks_expired > 0 {
                                info!(
                                    "Sweep pass complete: {} goals failed, {} streaks expired.",
                                    report.goals_failed, report.streaks_expired
                                );
                            }
                        }
                        Err(e) => error!("Sweep pass failed: {}", e),
                    }
                }
            }
        }
    })
}
