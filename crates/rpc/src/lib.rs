//! LendPool RPC - market orchestration and CLI
//!
//! `LendingMarket` runs each operation as one atomic transaction over the
//! ledger, the risk engine and the token/event collaborators.

pub mod access;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod market;
pub mod shared;
pub mod snapshot;
pub mod transfer;

pub use access::{AccessControl, AuthorizationError, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, MarketConfig};
pub use context::AppContext;
pub use error::LendingError;
pub use market::{LendingMarket, MarketState, MarketSummary, PositionView};
pub use shared::SharedMarket;
pub use snapshot::MarketSnapshot;
pub use transfer::{InMemoryTokenBank, TokenTransfer, TransferError};
