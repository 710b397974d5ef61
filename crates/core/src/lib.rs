pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod matcher;
pub mod metrics;
pub mod release;
pub mod store;
pub mod subscription;
pub mod testing;
pub mod tracking;
pub mod upstream;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, NotifyMode,
    SanitizedConfig,
};
pub use dispatch::{
    Delivery, DeliveryError, DeliveryTarget, DispatchReport, Dispatcher, LogNotifier, Notifier,
    TargetResolver, WebhookNotifier,
};
pub use ingest::{
    stream_url, EventSource, PollScheduler, StreamError, StreamIngest, TickSummary, WsEventSource,
};
pub use matcher::{canonical, is_similar, match_form, matches, storage_key};
pub use release::{parse_event, EventParseError, Nuke, Release, ReleaseAction, ReleaseEvent};
pub use store::{KvStore, KvStoreExt, SqliteKvStore, StoreError};
pub use subscription::{DeletedSubscription, Subscription, SubscriptionError, SubscriptionStore};
pub use tracking::{LastSeenTracker, QueryRegistry, Watermark};
pub use upstream::{ReleaseSource, UpstreamClient, UpstreamError, UpstreamHealth};
