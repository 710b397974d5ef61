use std::sync::Arc;

use prealert_core::{
    Config, Dispatcher, KvStore, LastSeenTracker, Notifier, QueryRegistry, ReleaseSource,
    SanitizedConfig, SubscriptionStore, TargetResolver,
};

/// Shared application state
pub struct AppState {
    config: Config,
    subscriptions: SubscriptionStore,
    registry: QueryRegistry,
    last_seen: LastSeenTracker,
    resolver: TargetResolver,
    dispatcher: Arc<Dispatcher>,
    upstream: Arc<dyn ReleaseSource>,
}

impl AppState {
    /// Wire the engine components over `store`.
    pub fn new(
        config: Config,
        store: Arc<dyn KvStore>,
        upstream: Arc<dyn ReleaseSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let subscriptions =
            SubscriptionStore::new(Arc::clone(&store), config.subscriptions.clone());
        let registry = QueryRegistry::new(Arc::clone(&store));
        let last_seen = LastSeenTracker::new(Arc::clone(&store));
        let resolver = TargetResolver::new(Arc::clone(&store), &config.notifications);
        let dispatcher = Arc::new(Dispatcher::new(
            subscriptions.clone(),
            registry.clone(),
            last_seen.clone(),
            resolver.clone(),
            notifier,
        ));

        Self {
            config,
            subscriptions,
            registry,
            last_seen,
            resolver,
            dispatcher,
            upstream,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn subscriptions(&self) -> &SubscriptionStore {
        &self.subscriptions
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    pub fn last_seen(&self) -> &LastSeenTracker {
        &self.last_seen
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn upstream(&self) -> Arc<dyn ReleaseSource> {
        Arc::clone(&self.upstream)
    }
}
