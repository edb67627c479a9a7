//! State types for tracking sync progress
//!
//! Serialized as `{"currently_syncing": <string|null>, "bookmarks":
//! {<stream>: <ISO8601>}}` and persisted between runs by the downstream
//! consumer.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Complete persisted state for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    /// The stream in flight at the last checkpoint, `None` once a run
    /// finishes cleanly
    #[serde(default)]
    pub currently_syncing: Option<String>,

    /// Per-stream bookmark: the maximum replication-key value confirmed
    /// fully replicated
    #[serde(default)]
    pub bookmarks: HashMap<String, String>,
}

impl SyncState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::State {
            message: format!("Failed to read state file: {e}"),
        })?;
        Self::from_json(&contents)
    }

    /// Parse state from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::State {
            message: format!("Failed to parse state: {e}"),
        })
    }

    /// The bookmark for a stream, falling back to the given default
    /// (normally the configured start date) when none is recorded
    pub fn get_bookmark(&self, stream: &str, default: Option<&str>) -> Option<String> {
        self.bookmarks
            .get(stream)
            .cloned()
            .or_else(|| default.map(ToString::to_string))
    }

    /// Record a stream's bookmark
    pub fn set_bookmark(&mut self, stream: &str, value: String) {
        self.bookmarks.insert(stream.to_string(), value);
    }

    /// Update the in-flight stream pointer
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(ToString::to_string);
    }

    /// The state as a JSON value, the shape emitted in STATE messages
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
