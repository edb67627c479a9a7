//! Sync engine and run orchestration
//!
//! # Overview
//!
//! The engine replicates one stream at a time:
//! - incremental streams filter records against the stream bookmark and
//!   advance a watermark to the maximum replication-key value emitted
//! - full-table streams emit every record and keep no bookmark
//!
//! The orchestrator sequences selected streams in catalog order, maintains
//! the `currently_syncing` pointer, and checkpoints state after every
//! meaningful mutation so an interrupted run can resume per-stream.

mod types;

pub use types::{JsonLineSink, Message, MessageSink, SyncStats, VecSink};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::RechargeClient;
use crate::schema;
use crate::state::SyncState;
use crate::streams::{self, RecordStream, StreamDescriptor};
use crate::types::{format_datetime, parse_datetime, JsonValue, ReplicationMethod};
use tracing::info;

/// Replicate every selected stream, in catalog order.
///
/// Emits SCHEMA/RECORD/STATE messages into the sink and leaves the final
/// state in `state`. If a deprecated stream was part of the selection the
/// error surfaces only after every stream has fully synced and the terminal
/// checkpoint has been written.
pub async fn sync_all(
    client: &RechargeClient,
    config: &TapConfig,
    catalog: &Catalog,
    state: &mut SyncState,
    sink: &mut dyn MessageSink,
) -> Result<SyncStats> {
    let mut stats = SyncStats::new();
    let mut deprecated: Option<&'static StreamDescriptor> = None;

    for entry in catalog.selected_streams() {
        let descriptor =
            streams::get_stream(&entry.tap_stream_id).ok_or_else(|| Error::StreamNotFound {
                stream: entry.tap_stream_id.clone(),
            })?;

        info!("Starting sync for stream: {}", descriptor.tap_stream_id);

        state.set_currently_syncing(Some(descriptor.tap_stream_id));
        sink.write(Message::state(state.to_value()))?;

        sink.write(Message::schema(
            &entry.tap_stream_id,
            entry.schema.clone(),
            entry.key_properties.clone(),
            entry
                .replication_key
                .clone()
                .map(|k| vec![k])
                .unwrap_or_default(),
        ))?;

        sync_stream(client, config, entry, descriptor, state, sink, &mut stats).await?;
        stats.add_stream();

        if descriptor.is_deprecated() {
            deprecated = Some(descriptor);
        }
    }

    state.set_currently_syncing(None);
    sink.write(Message::state(state.to_value()))?;

    info!(
        records = stats.records_emitted,
        streams = stats.streams_synced,
        "Sync finished"
    );

    if let Some(descriptor) = deprecated {
        return Err(Error::DeprecatedStream {
            stream: descriptor.tap_stream_id.to_string(),
            message: descriptor
                .deprecation_notice
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(stats)
}

/// Replicate one stream end to end and checkpoint its state
async fn sync_stream(
    client: &RechargeClient,
    config: &TapConfig,
    entry: &CatalogEntry,
    descriptor: &'static StreamDescriptor,
    state: &mut SyncState,
    sink: &mut dyn MessageSink,
    stats: &mut SyncStats,
) -> Result<()> {
    match descriptor.replication {
        ReplicationMethod::Incremental => {
            sync_incremental(client, config, entry, descriptor, state, sink, stats).await
        }
        ReplicationMethod::FullTable => {
            sync_full_table(client, entry, descriptor, state, sink, stats).await
        }
    }
}

/// Incremental replication: filter below the bookmark, track the watermark,
/// and write it back once the stream completes.
async fn sync_incremental(
    client: &RechargeClient,
    config: &TapConfig,
    entry: &CatalogEntry,
    descriptor: &'static StreamDescriptor,
    state: &mut SyncState,
    sink: &mut dyn MessageSink,
    stats: &mut SyncStats,
) -> Result<()> {
    let stream_id = descriptor.tap_stream_id;
    let replication_key = descriptor
        .replication_key
        .expect("incremental stream has a replication key");

    let initial = state
        .get_bookmark(stream_id, Some(config.start_date.as_str()))
        .ok_or_else(|| Error::state(format!("no bookmark or start date for '{stream_id}'")))?;
    let bookmark = parse_datetime(&initial)?;
    let mut watermark = bookmark;

    let mut records = RecordStream::new(client, descriptor, Some(&bookmark));
    let mut emitted: u64 = 0;
    let mut filtered: u64 = 0;

    while let Some(record) = records.next().await? {
        let transformed = schema::transform(&record, &entry.schema)?;

        match replication_value(&transformed, replication_key) {
            Some(raw) => {
                let record_datetime =
                    parse_datetime(raw).map_err(|_| Error::ReplicationKey {
                        stream: stream_id.to_string(),
                        value: raw.to_string(),
                    })?;
                // The API does not guarantee strict ordering across pages,
                // so every record is checked against the initial bookmark.
                if record_datetime >= bookmark {
                    sink.write(Message::record(stream_id, transformed))?;
                    emitted += 1;
                    watermark = watermark.max(record_datetime);
                } else {
                    filtered += 1;
                }
            }
            // Tolerated: emitted, but cannot advance the watermark
            None => {
                sink.write(Message::record(stream_id, transformed))?;
                emitted += 1;
            }
        }
    }

    state.set_bookmark(stream_id, format_datetime(&watermark));
    sink.write(Message::state(state.to_value()))?;

    stats.add_emitted(emitted);
    stats.add_filtered(filtered);
    info!(
        stream = stream_id,
        emitted,
        filtered,
        bookmark = %format_datetime(&watermark),
        "Completed incremental sync"
    );
    Ok(())
}

/// Full-table replication: emit everything, keep no bookmark
async fn sync_full_table(
    client: &RechargeClient,
    entry: &CatalogEntry,
    descriptor: &'static StreamDescriptor,
    state: &mut SyncState,
    sink: &mut dyn MessageSink,
    stats: &mut SyncStats,
) -> Result<()> {
    let stream_id = descriptor.tap_stream_id;
    let mut records = RecordStream::new(client, descriptor, None);
    let mut emitted: u64 = 0;

    while let Some(record) = records.next().await? {
        let transformed = schema::transform(&record, &entry.schema)?;
        sink.write(Message::record(stream_id, transformed))?;
        emitted += 1;
    }

    sink.write(Message::state(state.to_value()))?;

    stats.add_emitted(emitted);
    info!(stream = stream_id, emitted, "Completed full table sync");
    Ok(())
}

/// The replication-key value of a record, if it carries one
fn replication_value<'a>(record: &'a JsonValue, replication_key: &str) -> Option<&'a str> {
    record.get(replication_key).and_then(JsonValue::as_str)
}

#[cfg(test)]
mod tests;
