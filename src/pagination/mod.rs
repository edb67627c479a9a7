//! Pagination strategies
//!
//! Turns one resource's paginated API into a single logical sequence of
//! pages. Two live strategies: cursor continuation (all modern endpoints)
//! and legacy page numbers (the pinned-version `products` endpoint).

mod strategies;
mod types;

pub use strategies::{CursorPaginator, NoPaginator, PageNumberPaginator, PAGE_SIZE};
pub use types::{NextPage, PaginationKind, PaginationState, Paginator};
