//! Lazy record producer
//!
//! An explicit iterator over one stream's records: each `next()` drains the
//! current page buffer and fetches the following page on demand, so
//! suspension points (rate limiter, retry sleeps) sit inside ordinary
//! `await`s rather than hidden generator machinery.

use super::descriptors::StreamDescriptor;
use crate::error::Result;
use crate::http::{RechargeClient, RequestConfig};
use crate::pagination::{NextPage, PaginationKind, PaginationState, Paginator};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

/// A finite, non-restartable sequence of records for one stream
pub struct RecordStream<'a> {
    client: &'a RechargeClient,
    descriptor: &'static StreamDescriptor,
    paginator: Box<dyn Paginator>,
    state: PaginationState,
    pending: Option<Vec<(String, String)>>,
    buffer: VecDeque<Value>,
    done: bool,
}

impl<'a> RecordStream<'a> {
    /// Create a record stream, seeding the first page from the watermark
    pub fn new(
        client: &'a RechargeClient,
        descriptor: &'static StreamDescriptor,
        watermark: Option<&DateTime<Utc>>,
    ) -> Self {
        let paginator = descriptor.paginator(watermark);
        let state = PaginationState::new();
        let pending = Some(paginator.initial_params(&state));

        Self {
            client,
            descriptor,
            paginator,
            state,
            pending,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// The next record, or `None` once every page is drained
    pub async fn next(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Total records fetched so far
    pub fn total_fetched(&self) -> u64 {
        self.state.total_fetched
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let page_params = self.pending.take().unwrap_or_default();

        let mut config = RequestConfig::new()
            .queries(self.static_params())
            .queries(page_params)
            .endpoint(self.descriptor.tap_stream_id);
        if let Some(version) = self.descriptor.api_version {
            config = config.api_version(version);
        }

        let body = self.client.get(self.descriptor.path, config).await?;
        let records = self.extract_records(&body);
        let count = records.len();
        debug!(
            stream = self.descriptor.tap_stream_id,
            records = count,
            "fetched page"
        );
        self.buffer.extend(records);

        match self
            .paginator
            .process_response(&body, count, &mut self.state)
        {
            NextPage::Continue { query_params } => self.pending = Some(query_params),
            NextPage::Done => self.done = true,
        }
        Ok(())
    }

    /// Fixed descriptor params. Cursor continuations must not carry them:
    /// the server rejects any filter combined with a cursor.
    fn static_params(&self) -> Vec<(String, String)> {
        let first_page = self.state.cursor.is_none() && self.state.page == 0;
        if !first_page && self.descriptor.pagination == PaginationKind::Cursor {
            return Vec::new();
        }
        self.descriptor
            .params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    /// Unwrap the data envelope; singletons become a one-record page
    fn extract_records(&self, body: &Value) -> Vec<Value> {
        match body.get(self.descriptor.data_key) {
            Some(Value::Array(records)) => records.clone(),
            Some(record @ Value::Object(_)) if self.descriptor.singleton => vec![record.clone()],
            Some(Value::Null) | None => {
                debug!(
                    stream = self.descriptor.tap_stream_id,
                    data_key = self.descriptor.data_key,
                    "response carried no data envelope"
                );
                Vec::new()
            }
            Some(_) => Vec::new(),
        }
    }
}
