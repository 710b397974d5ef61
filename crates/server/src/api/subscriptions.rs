//! Subscription API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use prealert_core::{DeletedSubscription, Subscription};
use tracing::debug;

use super::handlers::{api_error, subscription_error, ApiError};
use crate::state::AppState;

/// Request body for creating a subscription
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionBody {
    pub query: String,
    /// Skip the similarity check.
    #[serde(default)]
    pub confirm: bool,
}

/// Query parameters for unsubscribing by query
#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
    pub total: usize,
}

/// Returned instead of creating when close subscriptions already exist.
#[derive(Debug, Serialize)]
pub struct SimilarSubscriptionsResponse {
    pub error: String,
    pub similar: Vec<Subscription>,
}

/// List an owner's subscriptions
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> Result<Json<ListSubscriptionsResponse>, ApiError> {
    let subscriptions = state
        .subscriptions()
        .list_by_owner(&owner)
        .map_err(subscription_error)?;

    Ok(Json(ListSubscriptionsResponse {
        total: subscriptions.len(),
        subscriptions,
    }))
}

/// Create a subscription, unless it looks like one the owner already has
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Json(body): Json<CreateSubscriptionBody>,
) -> Result<(StatusCode, Json<Subscription>), Response> {
    let store = state.subscriptions();

    if !body.confirm {
        let similar = store
            .similar(&owner, &body.query)
            .map_err(|e| subscription_error(e).into_response())?;
        if !similar.is_empty() {
            debug!(owner = %owner, query = %body.query, similar = similar.len(), "Similar subscriptions found");
            return Err((
                StatusCode::CONFLICT,
                Json(SimilarSubscriptionsResponse {
                    error: "You already have similar subscriptions. Resend with confirm to add anyway."
                        .to_string(),
                    similar,
                }),
            )
                .into_response());
        }
    }

    store
        .create(&owner, &body.query)
        .map(|sub| (StatusCode::CREATED, Json(sub)))
        .map_err(|e| subscription_error(e).into_response())
}

/// Delete one subscription by id
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<DeletedSubscription>, ApiError> {
    state
        .subscriptions()
        .delete(&owner, &id)
        .map(Json)
        .map_err(subscription_error)
}

/// Delete the owner's subscription matching `?query=`
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Query(params): Query<UnsubscribeParams>,
) -> Result<Json<DeletedSubscription>, ApiError> {
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing query parameter",
        ));
    };

    state
        .subscriptions()
        .unsubscribe(&owner, &query)
        .map(Json)
        .map_err(subscription_error)
}

#[derive(Debug, Serialize)]
pub struct QueriesResponse {
    pub queries: Vec<String>,
    pub total: usize,
}

/// Contents of the global query registry
pub async fn list_queries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QueriesResponse>, ApiError> {
    let queries = state
        .registry()
        .list()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(QueriesResponse {
        total: queries.len(),
        queries,
    }))
}
