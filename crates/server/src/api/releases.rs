//! Test notification handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use prealert_core::DispatchReport;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TestReleaseBody {
    pub name: String,
}

/// Run a fake `insert` named `name` through the pipeline, ignoring watermarks.
pub async fn test_release(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TestReleaseBody>,
) -> Result<Json<DispatchReport>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Release name must not be empty"));
    }

    state
        .dispatcher()
        .simulate(name)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
