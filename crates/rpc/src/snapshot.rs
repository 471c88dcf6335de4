//! On-disk market snapshot (`market.json`)

use chrono::{DateTime, Utc};
use lendpool_ledger::LedgerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::market::{LendingMarket, MarketState};
use crate::transfer::InMemoryTokenBank;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot is inconsistent: {0}")]
    Corrupt(#[from] LedgerError),
}

/// Everything needed to resume a market: its state and the simulated wallets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: MarketState,
    pub tokens: InMemoryTokenBank,
}

impl MarketSnapshot {
    pub const VERSION: u32 = 1;

    pub fn capture(market: &LendingMarket<InMemoryTokenBank>) -> Self {
        Self {
            version: Self::VERSION,
            saved_at: Utc::now(),
            state: market.state().clone(),
            tokens: market.tokens().clone(),
        }
    }

    /// Write to a temporary file and rename over `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load and check ledger invariants
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&content)?;
        if snapshot.version != Self::VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        snapshot.state.ledger.verify_invariants()?;
        Ok(snapshot)
    }
}
