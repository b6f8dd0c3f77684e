//! Lifecycle scheduler.
//!
//! Periodically moves ticket types through `draft → on_sale → {soldout, closed}`
//! using bulk conditional updates. A run is best-effort: a failed batch is
//! logged, counted and left for the next run. The scheduler never touches stock
//! or reservations.
//!
//! Runs may overlap (a slow run and the next tick, or several server
//! instances): each batch re-checks its predicate at write time.

use crate::metrics::LifecycleMetrics;
use boxoffice_core::{Clock, InventoryStore, LifecycleReport, LifecycleTransition};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between runs
    pub interval: Duration,
    /// Rows per bulk update
    pub batch_size: u32,
    /// Upper bound on batches per transition in one run
    pub max_batches: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_size: 500,
            max_batches: 1_000,
        }
    }
}

/// Periodic ticket type status evaluator.
pub struct LifecycleScheduler {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl LifecycleScheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>, config: SchedulerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Evaluate every ticket type once.
    ///
    /// Transitions are applied in [`LifecycleTransition::ORDERED`] order with a
    /// single `now`. Failures are absorbed into
    /// [`LifecycleReport::failed_batches`].
    pub async fn run_once(&self) -> LifecycleReport {
        let now = self.clock.now();
        let batch_size = self.config.batch_size.max(1);
        let mut report = LifecycleReport::default();

        for transition in LifecycleTransition::ORDERED {
            for batch in 0..self.config.max_batches {
                match self.store.run_lifecycle_batch(transition, now, batch_size).await {
                    Ok(moved) => {
                        report.record(transition, moved);
                        if moved > 0 {
                            LifecycleMetrics::record_transitions(transition, moved);
                            debug!(%transition, batch, moved, "Lifecycle batch applied");
                        }
                        if moved < u64::from(batch_size) {
                            break;
                        }
                    },
                    Err(err) => {
                        report.failed_batches += 1;
                        LifecycleMetrics::record_batch_failure(transition);
                        warn!(%transition, batch, error = %err, "Lifecycle batch failed, deferring to next run");
                        break;
                    },
                }
            }
        }

        report
    }

    /// Run until `shutdown` fires, evaluating once per interval.
    ///
    /// The first evaluation happens immediately. Ticks missed during a slow
    /// run are skipped rather than replayed.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "Lifecycle scheduler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Lifecycle scheduler received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.run_once().await;
                    if report.failed_batches > 0 {
                        error!(
                            opened = report.opened,
                            closed = report.closed,
                            sold_out = report.sold_out,
                            failed_batches = report.failed_batches,
                            "Lifecycle run completed with failures"
                        );
                    } else if report.transitioned() > 0 {
                        info!(
                            opened = report.opened,
                            closed = report.closed,
                            sold_out = report.sold_out,
                            "Lifecycle run completed"
                        );
                    } else {
                        debug!("Lifecycle run found nothing to update");
                    }
                }
            }
        }

        info!("Lifecycle scheduler stopped");
    }

    /// Spawn [`Self::run`] as a background task.
    #[must_use]
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
