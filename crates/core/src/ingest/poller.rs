//! Budgeted fallback polling of every registered query.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::dispatch::Dispatcher;
use crate::metrics::{
    POLL_EFFECTIVE_INTERVAL, POLL_REQUESTS, POLL_TICK_DURATION, REGISTERED_QUERIES,
};
use crate::release::{Release, ReleaseEvent};
use crate::store::StoreError;
use crate::tracking::{LastSeenTracker, QueryRegistry};
use crate::upstream::{ReleaseSource, UpstreamError};

/// Seconds between tick starts needed to poll `queries` queries within
/// `requests_per_minute`.
pub fn required_interval_secs(queries: usize, requests_per_minute: u32) -> u64 {
    if queries == 0 {
        return 0;
    }
    (queries as u64 * 60).div_ceil(u64::from(requests_per_minute.max(1)))
}

/// Interval between tick starts. Never below `base_secs`.
pub fn effective_interval_secs(queries: usize, base_secs: u64, requests_per_minute: u32) -> u64 {
    base_secs.max(required_interval_secs(queries, requests_per_minute))
}

/// Spacing between consecutive requests within a tick.
pub fn per_request_delay(requests_per_minute: u32) -> Duration {
    Duration::from_millis(60_000u64.div_ceil(u64::from(requests_per_minute.max(1))))
}

/// Failure polling a single query.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub queries: usize,
    pub effective_interval_secs: u64,
    /// Queries whose fetch or bookkeeping failed.
    pub failed: usize,
    /// Rows fed to the dispatcher.
    pub fed: usize,
    /// Delay until the next tick should start.
    pub next_delay: Duration,
}

struct PollWorker {
    config: PollingConfig,
    page_size: u32,
    source: Arc<dyn ReleaseSource>,
    registry: QueryRegistry,
    last_seen: LastSeenTracker,
    dispatcher: Arc<Dispatcher>,
}

impl PollWorker {
    async fn run_tick(&self) -> TickSummary {
        let started = Instant::now();
        let base = self.config.base_interval_secs;
        let rpm = self.config.safe_requests_per_minute;

        let queries = match self.registry.list() {
            Ok(queries) => queries,
            Err(e) => {
                warn!(error = %e, "Failed to read query registry");
                Vec::new()
            }
        };
        let n = queries.len();
        let effective = effective_interval_secs(n, base, rpm);
        REGISTERED_QUERIES.set(n as i64);
        POLL_EFFECTIVE_INTERVAL.set(effective as i64);

        let mut summary = TickSummary {
            queries: n,
            effective_interval_secs: effective,
            failed: 0,
            fed: 0,
            next_delay: Duration::from_secs(base),
        };

        if n == 0 {
            debug!("No registered queries to poll");
            return summary;
        }

        let spacing = per_request_delay(rpm);
        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(spacing).await;
            }
            match self.poll_query(query).await {
                Ok(fed) => summary.fed += fed,
                Err(e) => {
                    summary.failed += 1;
                    warn!(query = %query, error = %e, "Poll failed, skipping query");
                }
            }
        }

        let elapsed = started.elapsed();
        POLL_TICK_DURATION.observe(elapsed.as_secs_f64());
        summary.next_delay = Duration::from_secs(effective).saturating_sub(elapsed);

        info!(
            queries = n,
            effective_interval_secs = effective,
            fed = summary.fed,
            failed = summary.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Poll tick complete"
        );
        summary
    }

    /// Fetch recent rows for `query` and feed the unseen ones, oldest first.
    async fn poll_query(&self, query: &str) -> Result<usize, PollError> {
        let rows = match self.source.fetch_recent(query, self.page_size).await {
            Ok(rows) => {
                POLL_REQUESTS.with_label_values(&["success"]).inc();
                rows
            }
            Err(e) => {
                POLL_REQUESTS.with_label_values(&["error"]).inc();
                return Err(e.into());
            }
        };

        let watermark = self.last_seen.get(query)?;
        let mut fresh: Vec<Release> = rows
            .into_iter()
            .filter(|row| watermark.as_ref().map_or(true, |w| w.admits(row)))
            .collect();
        fresh.sort_by_key(|row| row.pre_at);

        let fed = fresh.len();
        for row in fresh {
            let event = ReleaseEvent::insert(row);
            if let Err(e) = self.dispatcher.handle_event(&event, "poll").await {
                warn!(query = %query, release = %event.row.name, error = %e, "Failed to process polled release");
            }
            self.last_seen.claim(query, &event.row)?;
        }

        Ok(fed)
    }
}

/// Fallback loop that polls every registered query within a request budget.
///
/// Ticks start `effective_interval_secs` apart. `stop` lets an in-flight tick
/// finish and cancels the pending timer.
pub struct PollScheduler {
    worker: Arc<PollWorker>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(
        config: PollingConfig,
        page_size: u32,
        source: Arc<dyn ReleaseSource>,
        registry: QueryRegistry,
        last_seen: LastSeenTracker,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            worker: Arc::new(PollWorker {
                config,
                page_size,
                source,
                registry,
                last_seen,
                dispatcher,
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run a single tick now.
    pub async fn run_tick(&self) -> TickSummary {
        self.worker.run_tick().await
    }

    /// Start the scheduler (spawns the background loop).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Poll scheduler already running");
            return;
        }

        let worker = Arc::clone(&self.worker);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            base_interval_secs = worker.config.base_interval_secs,
            safe_requests_per_minute = worker.config.safe_requests_per_minute,
            "Starting poll scheduler"
        );

        let handle = tokio::spawn(async move {
            loop {
                let summary = worker.run_tick().await;
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Poll scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(summary.next_delay) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                }
            }
            info!("Poll scheduler stopped");
        });

        *self.task.lock().unwrap() = Some(handle);
    }

    /// Stop the scheduler and wait for the loop to exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Poll scheduler not running");
            return;
        }

        info!("Stopping poll scheduler");
        let _ = self.shutdown_tx.send(());

        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_interval() {
        assert_eq!(required_interval_secs(0, 30), 0);
        assert_eq!(required_interval_secs(1, 30), 2);
        assert_eq!(required_interval_secs(40, 30), 80);
        assert_eq!(required_interval_secs(31, 30), 62);
        assert_eq!(required_interval_secs(7, 45), 10);
    }

    #[test]
    fn test_effective_interval_scales_up_only() {
        assert_eq!(effective_interval_secs(0, 60, 30), 60);
        assert_eq!(effective_interval_secs(10, 60, 30), 60);
        assert_eq!(effective_interval_secs(30, 60, 30), 60);
        assert_eq!(effective_interval_secs(40, 60, 30), 80);
    }

    #[test]
    fn test_per_request_delay() {
        assert_eq!(per_request_delay(30), Duration::from_millis(2000));
        assert_eq!(per_request_delay(7), Duration::from_millis(8572));
        assert_eq!(per_request_delay(60_000), Duration::from_millis(1));
    }
}
