use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A nuke attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nuke {
    pub id: u64,
    #[serde(default)]
    pub type_id: Option<u32>,
    /// Nuke kind as reported upstream (e.g. "nuke", "modnuke").
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub pre_id: Option<u64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub net: String,
    /// Epoch seconds.
    pub nuke_at: i64,
}

/// A release as published by the upstream feed. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub cat: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub files: u32,
    /// Pre time, epoch seconds.
    pub pre_at: i64,
    #[serde(default)]
    pub nuke: Option<Nuke>,
}

impl Release {
    /// Build a fake release named `name`, pre'd now. Used for test notifications.
    pub fn simulated(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().unsigned_abs() % 10_000_000,
            name: name.into(),
            team: "TEST".to_string(),
            cat: "X264-HD-720P".to_string(),
            genre: None,
            url: None,
            size: 2 * 1024 * 1024 * 1024,
            files: 15,
            pre_at: now.timestamp(),
            nuke: None,
        }
    }

    /// Reject rows no consumer can use: a blank name or a negative preAt.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("release {} has an empty name", self.id));
        }
        if self.pre_at < 0 {
            return Err(format!("release {} has a negative preAt", self.id));
        }
        Ok(())
    }

    /// Whether the release currently carries a nuke.
    pub fn is_nuked(&self) -> bool {
        self.nuke.is_some()
    }
}
