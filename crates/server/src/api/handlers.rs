use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use prealert_core::{SanitizedConfig, SubscriptionError, UpstreamHealth};
use tracing::error;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a subscription failure to its HTTP status and user-facing message.
pub fn subscription_error(e: SubscriptionError) -> ApiError {
    let status = match &e {
        SubscriptionError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        SubscriptionError::NotFound => StatusCode::NOT_FOUND,
        SubscriptionError::Duplicate { .. } => StatusCode::CONFLICT,
        SubscriptionError::LimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubscriptionError::Store(store_error) => {
            error!(error = %store_error, "Subscription store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.user_message())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Upstream health as seen right now.
pub async fn upstream_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UpstreamHealth>, ApiError> {
    state
        .upstream()
        .health()
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
}
