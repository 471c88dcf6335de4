//! Single-writer handle for concurrent callers

use lendpool_core::AccountId;
use lendpool_oracle::PriceOracle;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::clock::to_datetime;
use crate::error::LendingError;
use crate::market::LendingMarket;
use crate::transfer::TokenTransfer;

/// Cloneable handle; every transaction holds the lock for its whole run,
/// so transactions are serialized and never interleave.
pub struct SharedMarket<T: TokenTransfer> {
    inner: Arc<Mutex<LendingMarket<T>>>,
}

impl<T: TokenTransfer> Clone for SharedMarket<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TokenTransfer> SharedMarket<T> {
    pub fn new(market: LendingMarket<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, LendingMarket<T>> {
        self.inner.lock().await
    }

    /// Run one transaction under the lock
    pub async fn with<R>(&self, f: impl FnOnce(&mut LendingMarket<T>) -> R) -> R {
        let mut market = self.inner.lock().await;
        f(&mut *market)
    }

    /// Fetch the collateral price from `oracle` and apply it as `caller`.
    ///
    /// The quote is fetched without holding the lock. Quotes older than
    /// `max_age_secs` at market time are refused.
    pub async fn push_price(
        &self,
        caller: &AccountId,
        oracle: &dyn PriceOracle,
        max_age_secs: u64,
    ) -> Result<u128, LendingError> {
        let (pair, now) = {
            let market = self.inner.lock().await;
            (market.trading_pair(), market.now())
        };

        let quote = oracle.get_price(&pair).await?;
        quote.ensure_fresh(to_datetime(now), max_age_secs)?;
        tracing::debug!(pair = %pair, last = %quote.last, source = %quote.source, "Price quote received");

        let mut market = self.inner.lock().await;
        market.apply_quote(caller, &quote)
    }
}
