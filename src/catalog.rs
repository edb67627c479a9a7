//! Catalog types and discovery
//!
//! The catalog is the contract between discovery and sync: one entry per
//! stream carrying its schema and the metadata the engine needs to decide
//! selection and replication behavior.

use crate::error::{Error, Result};
use crate::schema;
use crate::streams::STREAMS;
use crate::types::{JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The stream catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Stream entries in sync order
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

/// One stream's catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,

    /// JSON Schema for records of this stream
    pub schema: JsonValue,

    /// Primary key field(s)
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication method
    pub replication_method: ReplicationMethod,

    /// Bookmark field for incremental streams
    #[serde(default)]
    pub replication_key: Option<String>,

    /// Whether this stream is replicated
    #[serde(default = "default_selected")]
    pub selected: bool,
}

fn default_selected() -> bool {
    true
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            message: format!("Failed to read catalog file: {e}"),
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: format!("Failed to parse catalog: {e}"),
        })
    }

    /// The selected entries, in catalog order
    pub fn selected_streams(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|entry| entry.selected)
    }

    /// Look up an entry by stream id
    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|entry| entry.tap_stream_id == tap_stream_id)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}

/// Build the full catalog from the stream table and embedded schemas
pub fn discover() -> Catalog {
    let streams = STREAMS
        .iter()
        .map(|descriptor| CatalogEntry {
            tap_stream_id: descriptor.tap_stream_id.to_string(),
            schema: schema::get_schema(descriptor.tap_stream_id)
                .ok()
                .cloned()
                .unwrap_or_default(),
            key_properties: descriptor
                .key_properties
                .iter()
                .map(ToString::to_string)
                .collect(),
            replication_method: descriptor.replication,
            replication_key: descriptor.replication_key.map(ToString::to_string),
            selected: true,
        })
        .collect();

    Catalog { streams }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_covers_every_stream() {
        let catalog = discover();
        assert_eq!(catalog.streams.len(), STREAMS.len());

        for (entry, descriptor) in catalog.streams.iter().zip(STREAMS) {
            assert_eq!(entry.tap_stream_id, descriptor.tap_stream_id);
            assert_eq!(entry.replication_method, descriptor.replication);
            assert!(entry.schema.get("properties").is_some());
        }
    }

    #[test]
    fn test_discover_marks_everything_selected() {
        let catalog = discover();
        assert_eq!(catalog.selected_streams().count(), STREAMS.len());
    }

    #[test]
    fn test_selection_filter() {
        let mut catalog = discover();
        for entry in &mut catalog.streams {
            entry.selected = entry.tap_stream_id == "orders";
        }

        let selected: Vec<_> = catalog
            .selected_streams()
            .map(|e| e.tap_stream_id.as_str())
            .collect();
        assert_eq!(selected, vec!["orders"]);
    }

    #[test]
    fn test_round_trip() {
        let catalog = discover();
        let json = catalog.to_json_pretty().unwrap();
        let restored = Catalog::from_json(&json).unwrap();
        assert_eq!(restored.streams.len(), catalog.streams.len());
        assert!(restored.get("orders").is_some());
    }

    #[test]
    fn test_selected_defaults_to_true() {
        let catalog = Catalog::from_json(
            r#"{"streams": [{
                "tap_stream_id": "orders",
                "schema": {},
                "replication_method": "INCREMENTAL",
                "replication_key": "updated_at"
            }]}"#,
        )
        .unwrap();
        assert!(catalog.streams[0].selected);
    }
}
