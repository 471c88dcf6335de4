//! JSONL event store - append-only writer

use crate::error::EventError;
use crate::event::{EventRecord, MarketEvent};
use crate::reader::EventReader;
use crate::sink::EventSink;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL journal, one file per day of market time.
///
/// A deferred store chains records in memory and writes them only on
/// [`EventSink::commit`], so a caller can persist its own state first.
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    last: Option<EventRecord>,
    deferred: bool,
    pending: Vec<EventRecord>,
}

impl EventStore {
    /// Open (or create) the journal at `base_path`, continuing any
    /// existing chain
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let last = EventReader::from_directory(&base_path)?.last_entry()?;
        if let Some(ref record) = last {
            tracing::debug!(sequence = record.sequence, "Continuing event journal");
        }

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            last,
            deferred: false,
            pending: Vec::new(),
        })
    }

    /// Open a store that holds appended records until `commit`
    pub fn open_deferred(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let mut store = Self::open(base_path)?;
        store.deferred = true;
        Ok(store)
    }

    /// Records appended but not yet written
    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write an already chained record
    fn write_record(&mut self, record: &EventRecord) -> Result<(), EventError> {
        let date = record.timestamp.format("%Y-%m-%d").to_string();

        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// List all JSONL files in the store
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl EventSink for EventStore {
    fn append(
        &mut self,
        event: MarketEvent,
        timestamp: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<EventRecord, EventError> {
        let record = EventRecord::next(self.last.as_ref(), event, timestamp, correlation_id);
        if self.deferred {
            self.pending.push(record.clone());
        } else {
            self.write_record(&record)?;
        }
        self.last = Some(record.clone());
        Ok(record)
    }

    fn last_record(&self) -> Option<&EventRecord> {
        self.last.as_ref()
    }

    fn commit(&mut self) -> Result<usize, EventError> {
        let pending = std::mem::take(&mut self.pending);
        for (written, record) in pending.iter().enumerate() {
            if let Err(e) = self.write_record(record) {
                self.pending = pending[written..].to_vec();
                return Err(e);
            }
        }
        Ok(pending.len())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::verify_chain;
    use chrono::{Duration, TimeZone};
    use lendpool_core::AccountId;
    use tempfile::TempDir;

    fn deposit(amount: u128) -> MarketEvent {
        MarketEvent::CollateralDeposited {
            account: AccountId::new("alice"),
            amount,
        }
    }

    #[test]
    fn test_reopen_continues_chain() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        {
            let mut store = EventStore::open(dir.path())?;
            store.append(deposit(1), t0, "a")?;
            store.append(deposit(2), t0, "b")?;
        }

        let mut store = EventStore::open(dir.path())?;
        assert_eq!(store.last_record().map(|r| r.sequence), Some(2));
        let record = store.append(deposit(3), t0, "c")?;
        assert_eq!(record.sequence, 3);
        store.close()?;

        let records = EventReader::from_directory(dir.path())?.read_all()?;
        assert_eq!(records.len(), 3);
        verify_chain(&records)?;
        Ok(())
    }

    #[test]
    fn test_deferred_store_writes_on_commit() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let mut store = EventStore::open_deferred(dir.path())?;
        store.append(deposit(1), t0, "a")?;
        let second = store.append(deposit(2), t0, "b")?;
        assert_eq!(second.sequence, 2);
        assert_eq!(store.pending().len(), 2);
        assert_eq!(EventReader::from_directory(dir.path())?.count()?, 0);

        assert_eq!(store.commit()?, 2);
        assert!(store.pending().is_empty());
        assert_eq!(store.commit()?, 0);
        assert_eq!(EventReader::from_directory(dir.path())?.verify()?, 2);
        Ok(())
    }

    #[test]
    fn test_uncommitted_records_are_dropped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        {
            let mut store = EventStore::open_deferred(dir.path())?;
            store.append(deposit(1), t0, "a")?;
            store.commit()?;
            store.append(deposit(2), t0, "b")?;
        }

        let store = EventStore::open(dir.path())?;
        assert_eq!(store.last_record().map(|r| r.sequence), Some(1));
        Ok(())
    }

    #[test]
    fn test_rotates_by_market_day() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let mut store = EventStore::open(dir.path())?;
        store.append(deposit(1), t0, "a")?;
        store.append(deposit(2), t0 + Duration::days(1), "b")?;

        assert_eq!(store.list_files()?.len(), 2);
        Ok(())
    }
}
