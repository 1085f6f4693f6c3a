//! Periodic price ingestion.
//!
//! One background task runs cycles strictly in sequence:
//! fetch quotes -> fetch names (best effort) -> merge into the store.
//!
//! Only the network leg can be interrupted. The per-cycle timeout and the
//! stop signal both drop the in-flight request; once the fetch has returned,
//! the merge always runs to completion.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clients::PriceFeed;
use crate::merge::MergeEngine;
use crate::store::StateStore;
use crate::types::{NameMapping, SnapshotBatch};

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts
    pub interval: Duration,
    /// Budget for the network leg of one cycle
    pub cycle_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_UPDATE_INTERVAL,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        }
    }
}

/// Summary of one completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub fetched: usize,
    pub accepted: usize,
    pub created: usize,
    pub dropped: usize,
    /// False when the name mapping could not be fetched
    pub names_available: bool,
    pub duration: Duration,
}

/// Result of the network leg
struct FetchOutcome {
    batch: SnapshotBatch,
    names: Option<NameMapping>,
    fetched_at: DateTime<Utc>,
    started: Instant,
}

pub struct IngestionScheduler {
    feed: Arc<dyn PriceFeed>,
    merge: MergeEngine,
    config: SchedulerConfig,
}

impl IngestionScheduler {
    pub fn new(feed: Arc<dyn PriceFeed>, store: Arc<StateStore>, config: SchedulerConfig) -> Self {
        Self {
            feed,
            merge: MergeEngine::new(store),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run a single fetch -> merge cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let fetched = self.fetch_stage().await?;
        Ok(self.apply(fetched))
    }

    /// Run one cycle inline, then keep running on the interval in the background.
    ///
    /// A failed startup cycle is logged and does not prevent the loop from starting.
    pub async fn start(self) -> SchedulerHandle {
        match self.run_cycle().await {
            Ok(report) => log_report(0, &report),
            Err(e) => error!(error = %e, "Initial price update failed"),
        }

        let first_tick = Instant::now() + self.config.interval;
        self.spawn_at(first_tick)
    }

    /// Run the loop in the background, first cycle immediately.
    pub fn spawn(self) -> SchedulerHandle {
        self.spawn_at(Instant::now())
    }

    fn spawn_at(self, first_tick: Instant) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run_loop(stop_rx, first_tick));
        SchedulerHandle { stop_tx, task }
    }

    /// Run cycles until `stop` flips to true (or its sender is dropped).
    pub async fn run(self, stop: watch::Receiver<bool>) {
        self.run_loop(stop, Instant::now()).await
    }

    async fn run_loop(self, mut stop: watch::Receiver<bool>, first_tick: Instant) {
        info!(
            "Ingestion scheduler started (interval: {}s, cycle timeout: {}s, feed: {})",
            self.config.interval.as_secs(),
            self.config.cycle_timeout.as_secs(),
            self.feed.feed_name()
        );

        let mut ticker = interval_at(first_tick, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut iteration = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut stop) => break,
                _ = ticker.tick() => {}
            }

            iteration += 1;
            debug!(iteration, "Price update cycle starting");

            // Stop wins a tie with a just-completed fetch; that batch is discarded
            let fetched = tokio::select! {
                biased;
                _ = stopped(&mut stop) => {
                    info!(iteration, "Stop requested during fetch, cancelling request");
                    break;
                }
                res = self.fetch_stage() => res,
            };

            match fetched {
                Ok(outcome) => {
                    let report = self.apply(outcome);
                    log_report(iteration, &report);
                }
                Err(e) => {
                    error!(iteration, error = %e, "Price update cycle failed, retrying next tick");
                }
            }
        }

        info!("Ingestion scheduler stopped");
    }

    /// Network leg: quotes are mandatory, names are best effort.
    /// Both share the cycle deadline.
    async fn fetch_stage(&self) -> Result<FetchOutcome> {
        let started = Instant::now();
        let deadline = started + self.config.cycle_timeout;
        let fetched_at = Utc::now();

        let batch = match timeout_at(deadline, self.feed.fetch_latest()).await {
            Ok(res) => res?,
            Err(_) => {
                return Err(anyhow!(
                    "Fetching latest prices timed out after {}ms",
                    self.config.cycle_timeout.as_millis()
                ))
            }
        };

        let names = match timeout_at(deadline, self.feed.fetch_names()).await {
            Ok(Ok(names)) => Some(names),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to fetch item names, using placeholders");
                None
            }
            Err(_) => {
                warn!("Fetching item names timed out, using placeholders");
                None
            }
        };

        Ok(FetchOutcome {
            batch,
            names,
            fetched_at,
            started,
        })
    }

    fn apply(&self, outcome: FetchOutcome) -> CycleReport {
        let names_available = outcome.names.is_some();
        let names = outcome.names.unwrap_or_default();

        let merged = self
            .merge
            .merge_batch(&outcome.batch, &names, outcome.fetched_at);

        CycleReport {
            fetched: outcome.batch.len(),
            accepted: merged.accepted.len(),
            created: merged.created,
            dropped: merged.dropped,
            names_available,
            duration: outcome.started.elapsed(),
        }
    }
}

/// Owner of a running scheduler task
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal stop and wait for the loop to exit.
    pub async fn stop(self) {
        info!("Stopping ingestion scheduler...");
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Ingestion scheduler task panicked: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Resolves once stop is requested or the handle is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        let requested = *stop.borrow();
        if requested {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

fn log_report(iteration: u64, report: &CycleReport) {
    info!(
        iteration,
        fetched = report.fetched,
        accepted = report.accepted,
        created = report.created,
        dropped = report.dropped,
        names_available = report.names_available,
        duration_ms = report.duration.as_millis() as u64,
        "Prices updated"
    );
}
