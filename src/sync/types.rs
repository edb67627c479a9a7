//! Sync message types and sinks
//!
//! Everything a run produces flows through a `MessageSink` as Singer-shaped
//! messages: one SCHEMA per stream, one RECORD per row, one STATE per
//! checkpoint.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::Serialize;
use std::io::Write;

/// A message emitted during sync
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    /// Schema announcement, sent once per stream before its first record
    #[serde(rename = "SCHEMA")]
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema for the stream's records
        schema: JsonValue,
        /// Primary key field(s)
        key_properties: Vec<String>,
        /// Bookmark field(s)
        #[serde(skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One replicated record
    #[serde(rename = "RECORD")]
    Record {
        /// Stream name
        stream: String,
        /// The coerced record body
        record: JsonValue,
    },
    /// State checkpoint
    #[serde(rename = "STATE")]
    State {
        /// The full persisted-state value
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties,
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// Where emitted messages go
pub trait MessageSink {
    /// Write one message
    fn write(&mut self, message: Message) -> Result<()>;
}

/// Sink writing one JSON message per line
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    /// Create a sink over any writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLineSink<std::io::Stdout> {
    /// Sink writing to stdout, the conventional tap output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> MessageSink for JsonLineSink<W> {
    fn write(&mut self, message: Message) -> Result<()> {
        let line = serde_json::to_string(&message)?;
        writeln!(self.writer, "{line}").map_err(Error::Io)?;
        self.writer.flush().map_err(Error::Io)
    }
}

/// In-memory sink collecting messages, for tests and embedding
#[derive(Debug, Default)]
pub struct VecSink {
    /// Every message written so far
    pub messages: Vec<Message>,
}

impl VecSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written for one stream
    pub fn records_for(&self, stream: &str) -> Vec<&JsonValue> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// The last STATE value written, if any
    pub fn last_state(&self) -> Option<&JsonValue> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::State { value } => Some(value),
            _ => None,
        })
    }
}

impl MessageSink for VecSink {
    fn write(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncStats {
    /// Total records emitted
    pub records_emitted: u64,
    /// Records dropped by the incremental filter
    pub records_filtered: u64,
    /// Streams completed
    pub streams_synced: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records
    pub fn add_emitted(&mut self, count: u64) {
        self.records_emitted += count;
    }

    /// Add filtered records
    pub fn add_filtered(&mut self, count: u64) {
        self.records_filtered += count;
    }

    /// Add a completed stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }
}
