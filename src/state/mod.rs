//! Persisted sync state
//!
//! The state is the tap's only durable artifact: a `currently_syncing`
//! pointer plus one bookmark per incremental stream. It is loaded once at
//! run start and checkpointed as STATE messages; durability belongs to
//! whatever consumes the message stream.

mod types;

pub use types::SyncState;
