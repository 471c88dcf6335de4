//! JSONL event reader - sequential reader for audit and replay

use crate::chain::verify_chain;
use crate::error::EventError;
use crate::event::EventRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Sequential journal reader
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory. A missing directory reads as empty.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        // file names are dates, so lexical order is chronological
        files.sort();

        Ok(Self { files })
    }

    fn read_file(path: &Path, records: &mut Vec<EventRecord>) -> Result<(), EventError> {
        let reader = BufReader::new(File::open(path)?);

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(&line).map_err(|e| {
                EventError::InvalidFile(format!("{}:{}: {}", path.display(), n + 1, e))
            })?;
            records.push(record);
        }
        Ok(())
    }

    /// Read all records from all files in order
    pub fn read_all(&self) -> Result<Vec<EventRecord>, EventError> {
        let mut records = Vec::new();
        for file_path in &self.files {
            Self::read_file(file_path, &mut records)?;
        }
        Ok(records)
    }

    /// Last record of the newest file (for prev_hash)
    pub fn last_entry(&self) -> Result<Option<EventRecord>, EventError> {
        let Some(last_file) = self.files.last() else {
            return Ok(None);
        };
        let mut records = Vec::new();
        Self::read_file(last_file, &mut records)?;
        Ok(records.pop())
    }

    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        Ok(self.last_entry()?.map(|r| r.sequence))
    }

    pub fn count(&self) -> Result<usize, EventError> {
        Ok(self.read_all()?.len())
    }

    /// Read everything and verify the hash chain; returns the record count
    pub fn verify(&self) -> Result<usize, EventError> {
        let records = self.read_all()?;
        verify_chain(&records)?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let reader = EventReader::from_directory(dir.path().join("nope"))?;

        assert_eq!(reader.count()?, 0);
        assert_eq!(reader.last_sequence()?, None);
        assert_eq!(reader.verify()?, 0);
        Ok(())
    }

    #[test]
    fn test_garbage_line_reports_location() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut file = File::create(dir.path().join("2024-01-01.jsonl"))?;
        writeln!(file, "not json")?;

        let result = EventReader::from_directory(dir.path())?.read_all();
        match result {
            Err(EventError::InvalidFile(msg)) => assert!(msg.contains(":1:")),
            other => panic!("expected InvalidFile, got {other:?}"),
        }
        Ok(())
    }
}
