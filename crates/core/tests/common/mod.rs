//! Shared harness for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use prealert_core::{
    config::{NotificationConfig, PollingConfig, SubscriptionConfig},
    testing::{MockReleaseSource, RecordingNotifier},
    Dispatcher, KvStore, LastSeenTracker, NotifyMode, PollScheduler, QueryRegistry, SqliteKvStore,
    SubscriptionStore, TargetResolver,
};

/// Engine wired over an on-disk SQLite store with mock edges.
pub struct Harness {
    pub store: Arc<dyn KvStore>,
    pub subscriptions: SubscriptionStore,
    pub registry: QueryRegistry,
    pub last_seen: LastSeenTracker,
    pub resolver: TargetResolver,
    pub notifier: Arc<RecordingNotifier>,
    pub source: Arc<MockReleaseSource>,
    pub dispatcher: Arc<Dispatcher>,
    _temp_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(SubscriptionConfig::default())
    }

    pub fn with_limits(limits: SubscriptionConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn KvStore> = Arc::new(
            SqliteKvStore::new(&temp_dir.path().join("test.db"))
                .expect("Failed to create store"),
        );

        let subscriptions = SubscriptionStore::new(Arc::clone(&store), limits);
        let registry = QueryRegistry::new(Arc::clone(&store));
        let last_seen = LastSeenTracker::new(Arc::clone(&store));
        let resolver = TargetResolver::new(
            Arc::clone(&store),
            &NotificationConfig {
                mode: NotifyMode::Direct,
                default_channel: None,
                webhook_url: None,
            },
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Arc::new(Dispatcher::new(
            subscriptions.clone(),
            registry.clone(),
            last_seen.clone(),
            resolver.clone(),
            notifier.clone(),
        ));

        Self {
            store,
            subscriptions,
            registry,
            last_seen,
            resolver,
            notifier,
            source: Arc::new(MockReleaseSource::new()),
            dispatcher,
            _temp_dir: temp_dir,
        }
    }

    /// Scheduler with effectively no request spacing.
    pub fn poller(&self, base_interval_secs: u64) -> PollScheduler {
        self.poller_with(base_interval_secs, 60_000)
    }

    pub fn poller_with(
        &self,
        base_interval_secs: u64,
        safe_requests_per_minute: u32,
    ) -> PollScheduler {
        PollScheduler::new(
            PollingConfig {
                enabled: true,
                base_interval_secs,
                safe_requests_per_minute,
            },
            5,
            self.source.clone(),
            self.registry.clone(),
            self.last_seen.clone(),
            Arc::clone(&self.dispatcher),
        )
    }
}
