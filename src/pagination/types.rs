//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of the next page computation
#[derive(Debug, Clone)]
pub enum NextPage {
    /// More pages available with these parameters
    Continue {
        /// Query parameters for the next request
        query_params: Vec<(String, String)>,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: Vec<(String, String)>) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Which pagination strategy a stream uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationKind {
    /// Continuation-token paging; the server encodes filter context in the
    /// cursor
    Cursor,
    /// Legacy page-number paging; a short page signals end of data
    PageNumber,
    /// Single request, no paging
    None,
}

/// Tracks pagination state during one resource's fetch loop.
///
/// Strategy-local and ephemeral: never shared across resources or persisted
/// across runs.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current page number (for page-based pagination)
    pub page: u32,
    /// Current cursor value
    pub cursor: Option<String>,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Set cursor
    pub fn set_cursor(&mut self, cursor: String) {
        self.cursor = Some(cursor);
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Get query parameters for the first request
    fn initial_params(&self, state: &PaginationState) -> Vec<(String, String)>;

    /// Process a response body and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}
