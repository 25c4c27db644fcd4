use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::record::ExtractedRecord;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Journal encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One completed rename, as recorded for undo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: PathBuf,
    pub target: PathBuf,
    pub record: ExtractedRecord,
    #[serde(default)]
    pub undone: bool,
}

impl JournalEntry {
    pub fn new(source: PathBuf, target: PathBuf, record: ExtractedRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source,
            target,
            record,
            undone: false,
        }
    }
}

/// Append-only JSON-lines log of renames.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    /// All entries, oldest first. A missing journal reads as empty.
    pub fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping unreadable journal line: {e}"),
            }
        }
        Ok(entries)
    }

    /// Entries not yet undone, newest first.
    pub fn undoable(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries: Vec<_> = self.read_all()?.into_iter().filter(|e| !e.undone).collect();
        entries.reverse();
        Ok(entries)
    }

    pub fn mark_undone(&self, id: &str) -> Result<(), JournalError> {
        let entries = self.read_all()?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for mut entry in entries {
            if entry.id == id {
                entry.undone = true;
            }
            writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u32) -> JournalEntry {
        JournalEntry::new(
            PathBuf::from(format!("in/SCN_{n:04}.jpg")),
            PathBuf::from(format!("out/Jane Doe {n:04} 12-01-2023.jpg")),
            ExtractedRecord::new("Jane Doe", "12-01-2023", format!("{n:04}")),
        )
    }

    #[test]
    fn missing_journal_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let j = Journal::new(dir.path().join("journal.jsonl"));
        assert!(j.read_all().unwrap().is_empty());
    }

    #[test]
    fn append_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let j = Journal::new(dir.path().join("journal.jsonl"));
        let (a, b) = (entry(1), entry(2));
        j.append(&a).unwrap();
        j.append(&b).unwrap();
        assert_eq!(j.read_all().unwrap(), vec![a, b]);
    }

    #[test]
    fn undoable_is_newest_first_and_skips_undone() {
        let dir = tempfile::tempdir().unwrap();
        let j = Journal::new(dir.path().join("journal.jsonl"));
        let (a, b, c) = (entry(1), entry(2), entry(3));
        for e in [&a, &b, &c] {
            j.append(e).unwrap();
        }
        j.mark_undone(&c.id).unwrap();

        let ids: Vec<_> = j.undoable().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let j = Journal::new(path.clone());
        j.append(&entry(1)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not json\n\n")
            .unwrap();
        assert_eq!(j.read_all().unwrap().len(), 1);
    }
}
