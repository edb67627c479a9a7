//! Stream definitions and the record producer
//!
//! Every Recharge resource is one entry in a static descriptor table; the
//! `RecordStream` producer binds a descriptor to its pagination strategy and
//! the HTTP client and yields records lazily, page by page.

mod descriptors;
mod record_stream;

pub use descriptors::{get_stream, StreamDescriptor, STREAMS};
pub use record_stream::RecordStream;
