//! Release matching and batched delivery.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::matcher::matches;
use crate::metrics::{DEDUP_SKIPS, DELIVERIES, QUERY_MATCHES, RELEASES_RECEIVED, UNROUTABLE_OWNERS};
use crate::release::{Release, ReleaseEvent};
use crate::store::StoreError;
use crate::subscription::SubscriptionStore;
use crate::tracking::{LastSeenTracker, QueryRegistry};

use super::{Delivery, DeliveryTarget, DispatchReport, Notifier, TargetResolver};

#[derive(Default)]
struct Batch {
    queries: Vec<String>,
    owners: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// The matching pipeline shared by stream ingest and the poll scheduler.
pub struct Dispatcher {
    subscriptions: SubscriptionStore,
    registry: QueryRegistry,
    last_seen: LastSeenTracker,
    resolver: TargetResolver,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        subscriptions: SubscriptionStore,
        registry: QueryRegistry,
        last_seen: LastSeenTracker,
        resolver: TargetResolver,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            subscriptions,
            registry,
            last_seen,
            resolver,
            notifier,
        }
    }

    /// Feed one event from `source` ("stream", "poll"). Non-insert events are
    /// ignored and yield `None`.
    pub async fn handle_event(
        &self,
        event: &ReleaseEvent,
        source: &str,
    ) -> Result<Option<DispatchReport>, StoreError> {
        if !event.is_insert() {
            debug!(
                action = event.action.as_str(),
                release = %event.row.name,
                "Ignoring non-insert event"
            );
            return Ok(None);
        }

        RELEASES_RECEIVED.with_label_values(&[source]).inc();
        self.process_release(&event.row, false).await.map(Some)
    }

    /// Simulate an insert of a release named `name`, bypassing dedup.
    pub async fn simulate(&self, name: &str) -> Result<DispatchReport, StoreError> {
        let release = Release::simulated(name);
        info!(release = %release.name, "Simulating release");
        RELEASES_RECEIVED.with_label_values(&["test"]).inc();
        self.process_release(&release, true).await
    }

    /// Match `release` against every registered query and deliver one
    /// notification per target.
    ///
    /// Each matched query is gated by its watermark unless `bypass_dedup` is
    /// set; a bypassed run leaves watermarks untouched. Per-query store errors
    /// and per-target delivery errors are logged and skipped. Only a failure
    /// to read the registry aborts.
    pub async fn process_release(
        &self,
        release: &Release,
        bypass_dedup: bool,
    ) -> Result<DispatchReport, StoreError> {
        let queries = self.registry.list()?;
        let mut report = DispatchReport::default();
        let mut batches: BTreeMap<DeliveryTarget, Batch> = BTreeMap::new();

        for query in queries {
            if !matches(&query, &release.name) {
                continue;
            }
            QUERY_MATCHES.inc();
            report.matched_queries.push(query.clone());

            if !bypass_dedup {
                match self.last_seen.claim(&query, release) {
                    Ok(true) => {}
                    Ok(false) => {
                        DEDUP_SKIPS.inc();
                        debug!(query = %query, release = %release.name, "Already delivered, skipping");
                        report.skipped_queries.push(query);
                        continue;
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Failed to update watermark, skipping query");
                        continue;
                    }
                }
            }

            let owners = match self.subscriptions.owners_for(&query) {
                Ok(owners) => owners,
                Err(e) => {
                    warn!(query = %query, error = %e, "Failed to load owners, skipping query");
                    continue;
                }
            };

            for owner in owners {
                match self.resolver.resolve(&owner) {
                    Ok(Some(target)) => {
                        let batch = batches.entry(target).or_default();
                        push_unique(&mut batch.queries, &query);
                        push_unique(&mut batch.owners, &owner);
                    }
                    Ok(None) => {
                        UNROUTABLE_OWNERS.inc();
                        warn!(owner = %owner, "No delivery target for owner");
                        push_unique(&mut report.unroutable_owners, &owner);
                    }
                    Err(e) => {
                        warn!(owner = %owner, error = %e, "Failed to resolve delivery target");
                        push_unique(&mut report.unroutable_owners, &owner);
                    }
                }
            }
        }

        for (target, batch) in batches {
            let delivery = Delivery {
                target: target.clone(),
                release: release.clone(),
                queries: batch.queries,
                owners: batch.owners,
            };

            match self.notifier.deliver(&delivery).await {
                Ok(()) => {
                    DELIVERIES.with_label_values(&["success"]).inc();
                    info!(
                        to = %target,
                        release = %release.name,
                        owners = delivery.owners.len(),
                        "Notification delivered"
                    );
                    report.delivered.push(target);
                }
                Err(e) => {
                    DELIVERIES.with_label_values(&["failure"]).inc();
                    warn!(to = %target, release = %release.name, error = %e, "Delivery failed");
                    report.failed.push(target);
                }
            }
        }

        if !report.matched_queries.is_empty() {
            info!(
                release = %release.name,
                matched = report.matched_queries.len(),
                skipped = report.skipped_queries.len(),
                "Release matched subscriptions"
            );
        }

        Ok(report)
    }
}
