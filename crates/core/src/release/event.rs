use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Release;

/// Kind of change announced by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseAction {
    Insert,
    Update,
    Delete,
    Nuke,
    Unnuke,
    Modnuke,
    Delpre,
    Undelpre,
}

impl ReleaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseAction::Insert => "insert",
            ReleaseAction::Update => "update",
            ReleaseAction::Delete => "delete",
            ReleaseAction::Nuke => "nuke",
            ReleaseAction::Unnuke => "unnuke",
            ReleaseAction::Modnuke => "modnuke",
            ReleaseAction::Delpre => "delpre",
            ReleaseAction::Undelpre => "undelpre",
        }
    }
}

/// One feed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    pub action: ReleaseAction,
    pub row: Release,
}

impl ReleaseEvent {
    /// Wrap a release as an `insert` event.
    pub fn insert(row: Release) -> Self {
        Self {
            action: ReleaseAction::Insert,
            row,
        }
    }

    /// Only inserts drive matching.
    pub fn is_insert(&self) -> bool {
        self.action == ReleaseAction::Insert
    }
}

/// Rejected feed payloads.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid release: {0}")]
    InvalidRelease(String),
}

/// Parse and validate one feed message.
pub fn parse_event(payload: &str) -> Result<ReleaseEvent, EventParseError> {
    let event: ReleaseEvent = serde_json::from_str(payload)?;

    event
        .row
        .validate()
        .map_err(EventParseError::InvalidRelease)?;

    Ok(event)
}
