//! Alerts channel mapping handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetChannelBody {
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub community: String,
    pub target: String,
}

pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(community): Path<String>,
) -> Result<Json<ChannelResponse>, ApiError> {
    match state.resolver().alerts_channel(&community) {
        Ok(Some(target)) => Ok(Json(ChannelResponse { community, target })),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No alerts channel set for {}", community),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn set_channel(
    State(state): State<Arc<AppState>>,
    Path(community): Path<String>,
    Json(body): Json<SetChannelBody>,
) -> Result<Json<ChannelResponse>, ApiError> {
    let target = body.target.trim().to_string();
    if target.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Target must not be empty"));
    }

    state
        .resolver()
        .set_alerts_channel(&community, &target)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ChannelResponse { community, target }))
}

pub async fn clear_channel(
    State(state): State<Arc<AppState>>,
    Path(community): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.resolver().clear_alerts_channel(&community) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No alerts channel set for {}", community),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
