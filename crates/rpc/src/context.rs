//! Application context - wires everything together for the CLI

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lendpool_events::EventStore;

use crate::clock::Clock;
use crate::config::MarketConfig;
use crate::market::{LendingMarket, MarketState};
use crate::snapshot::MarketSnapshot;
use crate::transfer::InMemoryTokenBank;

/// Application context - a market loaded from a data directory
pub struct AppContext {
    pub market: LendingMarket<InMemoryTokenBank>,
    data_path: PathBuf,
}

impl AppContext {
    pub fn snapshot_path(data_path: &Path) -> PathBuf {
        data_path.join("market.json")
    }

    pub fn journal_path(data_path: &Path) -> PathBuf {
        data_path.join("journal")
    }

    pub fn is_initialized(data_path: &Path) -> bool {
        Self::snapshot_path(data_path).exists()
    }

    /// Create a new market in `data_path`
    pub fn init(data_path: impl AsRef<Path>, config: &MarketConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        if Self::is_initialized(&data_path) {
            bail!("Market already initialized at {}", data_path.display());
        }
        std::fs::create_dir_all(&data_path)?;

        let state = MarketState::from_config(config, clock.now())?;
        let events = EventStore::open_deferred(Self::journal_path(&data_path))?;
        let market = LendingMarket::new(state, InMemoryTokenBank::new(), Box::new(events), clock);

        let mut ctx = Self { market, data_path };
        ctx.save()?;
        tracing::info!(path = %ctx.data_path.display(), "Market initialized");
        Ok(ctx)
    }

    /// Load the market saved in `data_path`
    pub fn open(data_path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        if !Self::is_initialized(&data_path) {
            bail!(
                "No market at {} (run `lendpool init` first)",
                data_path.display()
            );
        }

        let snapshot = MarketSnapshot::load(Self::snapshot_path(&data_path))
            .context("loading market snapshot")?;
        let events = EventStore::open_deferred(Self::journal_path(&data_path))?;
        let market = LendingMarket::new(snapshot.state, snapshot.tokens, Box::new(events), clock);

        Ok(Self { market, data_path })
    }

    /// Persist the current state, then journal the events it produced.
    ///
    /// Events stay in memory until the snapshot is on disk, so the journal
    /// never records a change the snapshot lacks.
    pub fn save(&mut self) -> anyhow::Result<()> {
        MarketSnapshot::capture(&self.market)
            .save(Self::snapshot_path(&self.data_path))
            .context("saving market snapshot")?;
        let written = self
            .market
            .events_mut()
            .commit()
            .context("writing event journal")?;
        if written > 0 {
            tracing::debug!(written, "Journal records committed");
        }
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}
