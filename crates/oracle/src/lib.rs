//! LendPool Price Oracle
//!
//! Supplies the collateral price that governance pushes into the market.
//! Currently implements MockOracle for testing; can be extended for external feeds.

mod error;
mod mock;
mod types;

pub use error::OracleError;
pub use mock::MockOracle;
pub use types::{PriceOracle, PriceQuote, TradingPair};
