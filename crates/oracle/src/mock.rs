//! Mock Oracle for testing
//!
//! Provides configurable fixed prices for exercising price pushes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::OracleError;
use crate::types::{PriceOracle, PriceQuote, TradingPair};

/// Mock Price Oracle
///
/// Stores fixed prices that can be updated programmatically.
#[derive(Default)]
pub struct MockOracle {
    /// Stored prices (pair -> price)
    prices: RwLock<HashMap<String, PriceQuote>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed price for a trading pair
    pub fn set_price(&self, pair: TradingPair, price: Decimal) {
        let quote = PriceQuote::simple(pair.clone(), price);
        self.insert(pair, quote);
    }

    /// Set a price with bid/ask spread
    pub fn set_price_with_spread(&self, pair: TradingPair, bid: Decimal, ask: Decimal) {
        let last = (bid + ask) / Decimal::from(2);
        let quote = PriceQuote::new(pair.clone(), bid, ask, last);
        self.insert(pair, quote);
    }

    /// Store a fully specified quote (e.g. one with an old timestamp)
    pub fn set_quote(&self, quote: PriceQuote) {
        self.insert(quote.pair.clone(), quote);
    }

    pub fn remove_price(&self, pair: &TradingPair) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.remove(&pair.to_string());
    }

    pub fn pair_count(&self) -> usize {
        self.prices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn insert(&self, pair: TradingPair, quote: PriceQuote) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.insert(pair.to_string(), quote);
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn get_price(&self, pair: &TradingPair) -> Result<PriceQuote, OracleError> {
        let prices = self.prices.read().unwrap_or_else(PoisonError::into_inner);
        prices
            .get(&pair.to_string())
            .cloned()
            .ok_or_else(|| OracleError::PairNotFound {
                pair: pair.to_string(),
            })
    }

    async fn supported_pairs(&self) -> Vec<TradingPair> {
        let prices = self.prices.read().unwrap_or_else(PoisonError::into_inner);
        prices.values().map(|p| p.pair.clone()).collect()
    }
}
