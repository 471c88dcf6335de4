//! Core oracle types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lendpool_core::Asset;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// A trading pair (e.g., WETH/USDC)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// Collateral asset
    pub base: String,
    /// Stable asset the price is quoted in
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Pair of a collateral asset against the market's stable asset
    pub fn of(collateral: &Asset, stable: &Asset) -> Self {
        Self::new(collateral.symbol(), stable.symbol())
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A price quote with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub pair: TradingPair,
    /// Bid price (highest buy order)
    pub bid: Decimal,
    /// Ask price (lowest sell order)
    pub ask: Decimal,
    /// Last traded price (or mid-price if no trades)
    pub last: Decimal,
    /// Timestamp when this price was fetched
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "mock", "chainlink")
    pub source: String,
}

impl PriceQuote {
    pub fn new(pair: TradingPair, bid: Decimal, ask: Decimal, last: Decimal) -> Self {
        Self {
            pair,
            bid,
            ask,
            last,
            timestamp: Utc::now(),
            source: "unknown".to_string(),
        }
    }

    /// Same bid/ask/last (for mocking)
    pub fn simple(pair: TradingPair, price: Decimal) -> Self {
        Self {
            pair,
            bid: price,
            ask: price,
            last: price,
            timestamp: Utc::now(),
            source: "mock".to_string(),
        }
    }

    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }

    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Older than `max_age_secs` at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_secs: u64) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age.num_seconds() > max_age_secs as i64
    }

    /// Fail if the quote is older than `max_age_secs` at `now`
    pub fn ensure_fresh(&self, now: DateTime<Utc>, max_age_secs: u64) -> Result<(), OracleError> {
        if self.is_stale(now, max_age_secs) {
            return Err(OracleError::StalePrice {
                pair: self.pair.to_string(),
                last_update: self.timestamp.to_rfc3339(),
                threshold_secs: max_age_secs,
            });
        }
        Ok(())
    }

    /// `last` in native units of `stable` per whole base token.
    ///
    /// Digits finer than the stable asset supports are truncated; a
    /// non-positive result is rejected.
    pub fn to_native(&self, stable: &Asset) -> Result<u128, OracleError> {
        if self.last <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                pair: self.pair.to_string(),
                reason: format!("non-positive price {}", self.last),
            });
        }
        let truncated = self
            .last
            .round_dp_with_strategy(stable.decimals() as u32, RoundingStrategy::ToZero);
        let native = stable.to_native(truncated)?;
        if native == 0 {
            return Err(OracleError::InvalidPrice {
                pair: self.pair.to_string(),
                reason: format!("{} rounds to zero in {}", self.last, stable),
            });
        }
        Ok(native)
    }
}

/// Price Oracle trait - interface for price feeds
///
/// Implementations can be:
/// - MockOracle: For testing with fixed prices
/// - ChainlinkOracle: On-chain prices from Chainlink
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Get the current price for a trading pair
    async fn get_price(&self, pair: &TradingPair) -> Result<PriceQuote, OracleError>;

    /// Get a list of all supported trading pairs
    async fn supported_pairs(&self) -> Vec<TradingPair>;

    /// Check if a trading pair is supported
    async fn is_supported(&self, pair: &TradingPair) -> bool {
        self.supported_pairs().await.contains(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn weth_usdc() -> TradingPair {
        TradingPair::new("weth", "usdc")
    }

    #[test]
    fn test_trading_pair_display() {
        assert_eq!(weth_usdc().to_string(), "WETH/USDC");
    }

    #[test]
    fn test_price_mid_and_spread() {
        let price = PriceQuote::new(weth_usdc(), dec!(1999), dec!(2001), dec!(2000));
        assert_eq!(price.mid(), dec!(2000));
        assert_eq!(price.spread(), dec!(2));
    }

    #[test]
    fn test_to_native_truncates_extra_digits() {
        let usdc = Asset::new("USDC", 6).unwrap();
        let price = PriceQuote::simple(weth_usdc(), dec!(2000.1234567));
        assert_eq!(price.to_native(&usdc).unwrap(), 2_000_123_456);
    }

    #[test]
    fn test_to_native_rejects_zero() {
        let usdc = Asset::new("USDC", 6).unwrap();
        let price = PriceQuote::simple(weth_usdc(), dec!(0.0000001));
        assert!(matches!(
            price.to_native(&usdc),
            Err(OracleError::InvalidPrice { .. })
        ));
        let negative = PriceQuote::simple(weth_usdc(), dec!(-1));
        assert!(negative.to_native(&usdc).is_err());
    }

    #[test]
    fn test_staleness() {
        let price = PriceQuote::simple(weth_usdc(), dec!(2000));
        let later = price.timestamp + Duration::seconds(120);

        assert!(!price.is_stale(later, 300));
        assert!(price.ensure_fresh(later, 60).is_err());
    }
}
