//! Pagination strategy implementations
//!
//! Each strategy handles one of the paging schemes Recharge exposes.

use super::types::{NextPage, PaginationState, Paginator};
use serde_json::Value;

/// Records requested per page.
///
/// The API accepts up to 250, but pages that large intermittently come back
/// truncated; 50 trades request count for per-request reliability.
pub const PAGE_SIZE: u32 = 50;

/// Response field carrying the continuation token
const CURSOR_FIELD: &str = "next_cursor";

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Continuation-token pagination (the 2021-11 list endpoints).
///
/// The first page carries the limit, an ascending sort on the replication
/// key, and optionally a minimum-timestamp filter. Every later page sends
/// only `cursor` and `limit`: the server encodes the original filter and
/// sort context inside the token, and rejects requests that combine a
/// cursor with other filters.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Page size
    pub limit: u32,
    /// Sort order for the first page, e.g. `updated_at-asc`
    pub sort_by: String,
    /// Optional first-page filter, e.g. `("updated_at_min", <watermark>)`
    pub min_filter: Option<(String, String)>,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(limit: u32, sort_by: impl Into<String>, min_filter: Option<(String, String)>) -> Self {
        Self {
            limit,
            sort_by: sort_by.into(),
            min_filter,
        }
    }
}

impl Paginator for CursorPaginator {
    fn initial_params(&self, state: &PaginationState) -> Vec<(String, String)> {
        if let Some(cursor) = &state.cursor {
            return vec![
                ("cursor".to_string(), cursor.clone()),
                ("limit".to_string(), self.limit.to_string()),
            ];
        }

        let mut params = vec![
            ("sort_by".to_string(), self.sort_by.clone()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some((key, value)) = &self.min_filter {
            params.push((key.clone(), value.clone()));
        }
        params
    }

    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        match body.get(CURSOR_FIELD).and_then(Value::as_str) {
            Some(cursor) if !cursor.is_empty() => {
                state.set_cursor(cursor.to_string());
                NextPage::with_params(vec![
                    ("cursor".to_string(), cursor.to_string()),
                    ("limit".to_string(), self.limit.to_string()),
                ])
            }
            _ => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Legacy page-number pagination (the pinned-version `products` endpoint).
///
/// Requests page `N` with a fixed size and advances while each page comes
/// back exactly full; a short page ends iteration.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// Page size
    pub limit: u32,
    /// First page number
    pub start_page: u32,
}

impl PageNumberPaginator {
    /// Create a new page number paginator
    pub fn new(page_param: impl Into<String>, limit: u32, start_page: u32) -> Self {
        Self {
            page_param: page_param.into(),
            limit,
            start_page,
        }
    }

    fn params_for(&self, page: u32) -> Vec<(String, String)> {
        vec![
            (self.page_param.clone(), page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_params(&self, state: &PaginationState) -> Vec<(String, String)> {
        let page = if state.page == 0 {
            self.start_page
        } else {
            state.page
        };
        self.params_for(page)
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        if records_count < self.limit as usize {
            state.mark_done();
            return NextPage::Done;
        }

        let current = if state.page == 0 {
            self.start_page
        } else {
            state.page
        };
        state.page = current + 1;
        NextPage::with_params(self.params_for(state.page))
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn initial_params(&self, _state: &PaginationState) -> Vec<(String, String)> {
        Vec::new()
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);
        state.mark_done();
        NextPage::Done
    }
}
