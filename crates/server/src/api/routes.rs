use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{channels, handlers, middleware::metrics_middleware, releases, subscriptions};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/upstream/health", get(handlers::upstream_health))
        // Subscriptions
        .route(
            "/subscriptions/{owner}",
            get(subscriptions::list_subscriptions)
                .post(subscriptions::create_subscription)
                .delete(subscriptions::unsubscribe),
        )
        .route(
            "/subscriptions/{owner}/{id}",
            delete(subscriptions::delete_subscription),
        )
        .route("/queries", get(subscriptions::list_queries))
        // Alerts channels
        .route(
            "/channels/{community}",
            get(channels::get_channel)
                .put(channels::set_channel)
                .delete(channels::clear_channel),
        )
        // Test notification
        .route("/releases/test", post(releases::test_release))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
