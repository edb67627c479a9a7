// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # recharge-tap
//!
//! A Rust-native Singer tap for the Recharge subscription-commerce API.
//!
//! Extracts addresses, charges, orders, subscriptions and the rest of the
//! Recharge resource catalog as a stream of schema-announced, type-coerced
//! records plus incremental state checkpoints, ready for any Singer target.
//!
//! ## Features
//!
//! - **Incremental replication**: per-stream bookmarks limit each run to
//!   new/changed rows; full-table streams re-snapshot every run
//! - **Cursor and page pagination**: modern cursor paging plus the legacy
//!   page-number scheme for the pinned-version `products` endpoint
//! - **Robust HTTP**: client-side rate limiting, exponential-backoff retries,
//!   and a typed error taxonomy mirroring the Recharge status codes
//! - **Resumable runs**: a `currently_syncing` pointer and per-stream
//!   bookmarks make interrupted runs safe to re-launch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recharge_tap::catalog::discover;
//! use recharge_tap::config::TapConfig;
//! use recharge_tap::http::RechargeClient;
//! use recharge_tap::state::SyncState;
//! use recharge_tap::sync::{sync_all, JsonLineSink};
//!
//! #[tokio::main]
//! async fn main() -> recharge_tap::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let client = RechargeClient::from_config(&config);
//!     let catalog = discover();
//!     let mut state = SyncState::default();
//!     let mut sink = JsonLineSink::stdout();
//!
//!     sync_all(&client, &config, &catalog, &mut state, &mut sink).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Run Orchestrator                         │
//! │  discover() → Catalog      sync_all(catalog, state) → messages  │
//! └───────────────────────────────┬─────────────────────────────────┘
//! ┌──────────────┬────────────────┴──┬──────────────┬───────────────┐
//! │  Sync Engine │   RecordStream    │  Pagination  │  HTTP Client  │
//! ├──────────────┼───────────────────┼──────────────┼───────────────┤
//! │ Bookmarks    │ Descriptor table  │ Cursor       │ Auth headers  │
//! │ Watermark    │ Envelope unwrap   │ Page number  │ Retry/backoff │
//! │ Checkpoints  │ Schema transform  │              │ Rate limit    │
//! └──────────────┴───────────────────┴──────────────┴───────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Stream descriptors and the record producer
pub mod streams;

/// Static JSON schemas and record coercion
pub mod schema;

/// Catalog types and discovery
pub mod catalog;

/// Persisted sync state and bookmarks
pub mod state;

/// Sync engine and run orchestration
pub mod sync;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
