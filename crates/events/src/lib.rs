//! LendPool Events - market journal
//!
//! Every committed market operation emits one [`MarketEvent`]. Sinks wrap
//! events into [`EventRecord`]s that carry a SHA-256 hash chain, so the
//! journal can be audited for tampering or gaps.

pub mod chain;
pub mod error;
pub mod event;
pub mod reader;
pub mod sink;
pub mod store;

pub use chain::{verify_chain, ChainError, GENESIS_HASH};
pub use error::EventError;
pub use event::{EventRecord, MarketEvent};
pub use reader::EventReader;
pub use sink::{EventSink, MemorySink};
pub use store::EventStore;
