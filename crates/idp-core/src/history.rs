//! Append-only extraction history.
//!
//! Every successful pipeline run appends one [`ExtractionResult`]; analytics
//! and export read a full [`HistoryStore::snapshot`]. Writers are serialized
//! by a mutex, and snapshots are owned copies so readers never hold the lock
//! while computing.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::HistoryError;
use crate::models::config::HistoryConfig;
use crate::models::result::ExtractionResult;

/// Storage for the results produced by the process.
pub trait HistoryStore: Send + Sync {
    /// Append one result.
    fn append(&self, result: ExtractionResult) -> Result<(), HistoryError>;

    /// All retained results, oldest first.
    fn snapshot(&self) -> Result<Vec<ExtractionResult>, HistoryError>;

    /// Number of retained results.
    fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.snapshot()?.len())
    }

    fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }
}

/// Bounded-or-unbounded ordered buffer shared by both stores.
#[derive(Debug, Default)]
struct Entries {
    items: VecDeque<ExtractionResult>,
    max_entries: Option<usize>,
}

impl Entries {
    /// A bound of zero means unbounded.
    fn new(max_entries: Option<usize>) -> Self {
        Self {
            items: VecDeque::new(),
            max_entries: max_entries.filter(|&max| max > 0),
        }
    }

    fn push(&mut self, result: ExtractionResult) {
        self.items.push_back(result);
        if let Some(max) = self.max_entries {
            while self.items.len() > max {
                self.items.pop_front();
            }
        }
    }

    fn to_vec(&self) -> Vec<ExtractionResult> {
        self.items.iter().cloned().collect()
    }
}

/// In-memory history for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `max_entries` results (oldest evicted first).
    /// Zero keeps everything.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::new(Some(max_entries))),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, HistoryError> {
        self.entries.lock().map_err(|_| HistoryError::Poisoned)
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&self, result: ExtractionResult) -> Result<(), HistoryError> {
        self.lock()?.push(result);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<ExtractionResult>, HistoryError> {
        Ok(self.lock()?.to_vec())
    }

    fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.lock()?.items.len())
    }
}

struct JsonlState {
    file: File,
    entries: Entries,
}

/// History persisted as one JSON object per line.
///
/// Existing lines are replayed on open; appends go to the end of the file.
/// A configured bound limits what is kept in memory and replayed, the file
/// itself is never rewritten.
pub struct JsonlHistory {
    path: PathBuf,
    state: Mutex<JsonlState>,
}

impl JsonlHistory {
    /// Open (or create) the history file at `path`.
    pub fn open(path: &Path, max_entries: Option<usize>) -> Result<Self, HistoryError> {
        let mut entries = Entries::new(max_entries);

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for (index, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let result: ExtractionResult =
                    serde_json::from_str(&line).map_err(|e| HistoryError::Corrupt {
                        line: index + 1,
                        reason: e.to_string(),
                    })?;
                entries.push(result);
            }
            info!(
                "Loaded {} history records from {}",
                entries.items.len(),
                path.display()
            );
        } else if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(JsonlState { file, entries }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, JsonlState>, HistoryError> {
        self.state.lock().map_err(|_| HistoryError::Poisoned)
    }
}

impl HistoryStore for JsonlHistory {
    fn append(&self, result: ExtractionResult) -> Result<(), HistoryError> {
        let line = serde_json::to_string(&result).map_err(|e| HistoryError::Corrupt {
            line: 0,
            reason: e.to_string(),
        })?;

        let mut state = self.lock()?;
        writeln!(state.file, "{}", line)?;
        state.file.flush()?;
        state.entries.push(result);

        debug!("Appended history record to {}", self.path.display());
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<ExtractionResult>, HistoryError> {
        Ok(self.lock()?.entries.to_vec())
    }

    fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.lock()?.entries.items.len())
    }
}

/// Open the store described by `config`.
///
/// A configured path selects the persistent store; otherwise results are
/// kept in memory.
pub fn open(config: &HistoryConfig) -> Result<Box<dyn HistoryStore>, HistoryError> {
    Ok(match (&config.path, config.max_entries) {
        (Some(path), max_entries) => Box::new(JsonlHistory::open(path, max_entries)?),
        (None, Some(max)) => Box::new(MemoryHistory::bounded(max)),
        (None, None) => Box::new(MemoryHistory::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{DocumentType, ExtractedFields};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn result(name: &str, seconds: f64) -> ExtractionResult {
        ExtractionResult {
            fields: ExtractedFields {
                document_type: DocumentType::Invoice,
                raw_text: format!("INVOICE {name}"),
                ..Default::default()
            },
            processing_time: seconds,
            timestamp: NaiveDate::from_ymd_opt(2024, 12, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            file_name: name.to_string(),
            ocr_engine: Some("synthetic".to_string()),
        }
    }

    fn names(results: &[ExtractionResult]) -> Vec<&str> {
        results.iter().map(|r| r.file_name.as_str()).collect()
    }

    #[test]
    fn test_memory_history_keeps_order() {
        let history = MemoryHistory::new();
        assert!(history.is_empty().unwrap());

        history.append(result("a.png", 0.1)).unwrap();
        history.append(result("b.png", 0.2)).unwrap();

        let snapshot = history.snapshot().unwrap();
        assert_eq!(names(&snapshot), vec!["a.png", "b.png"]);
        assert_eq!(history.len().unwrap(), 2);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let history = MemoryHistory::new();
        history.append(result("a.png", 0.1)).unwrap();

        let before = history.snapshot().unwrap();
        history.append(result("b.png", 0.1)).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(history.len().unwrap(), 2);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let history = MemoryHistory::bounded(2);
        for name in ["a.png", "b.png", "c.png"] {
            history.append(result(name, 0.1)).unwrap();
        }
        assert_eq!(names(&history.snapshot().unwrap()), vec!["b.png", "c.png"]);
    }

    #[test]
    fn test_zero_bound_keeps_everything() {
        let history = MemoryHistory::bounded(0);
        for name in ["a.png", "b.png"] {
            history.append(result(name, 0.1)).unwrap();
        }
        assert_eq!(names(&history.snapshot().unwrap()), vec!["a.png", "b.png"]);

        let dir = tempfile::tempdir().unwrap();
        let config = HistoryConfig {
            path: Some(dir.path().join("history.jsonl")),
            max_entries: Some(0),
        };
        open(&config).unwrap().append(result("c.png", 0.1)).unwrap();
        assert_eq!(open(&config).unwrap().len().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_appends() {
        let history = Arc::new(MemoryHistory::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        history.append(result(&format!("{t}-{i}.png"), 0.1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.len().unwrap(), 200);
    }

    #[test]
    fn test_jsonl_history_replays_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("history.jsonl");

        {
            let history = JsonlHistory::open(&path, None).unwrap();
            history.append(result("invoice.png", 0.5)).unwrap();
            history.append(result("receipt.png", 0.25)).unwrap();
        }

        let reopened = JsonlHistory::open(&path, None).unwrap();
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(names(&snapshot), vec!["invoice.png", "receipt.png"]);
        assert_eq!(snapshot[0], result("invoice.png", 0.5));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_jsonl_history_bound_applies_on_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");

        let history = JsonlHistory::open(&path, None).unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            history.append(result(name, 0.1)).unwrap();
        }
        drop(history);

        let bounded = JsonlHistory::open(&path, Some(1)).unwrap();
        assert_eq!(names(&bounded.snapshot().unwrap()), vec!["c.png"]);
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();

        let memory = open(&HistoryConfig::default()).unwrap();
        memory.append(result("a.png", 0.1)).unwrap();
        assert_eq!(memory.len().unwrap(), 1);

        let config = HistoryConfig {
            path: Some(dir.path().join("history.jsonl")),
            max_entries: None,
        };
        open(&config).unwrap().append(result("b.png", 0.1)).unwrap();
        assert_eq!(names(&open(&config).unwrap().snapshot().unwrap()), vec!["b.png"]);
    }

    #[test]
    fn test_jsonl_history_rejects_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        std::fs::write(&path, "\n{not json}\n").unwrap();

        let err = JsonlHistory::open(&path, None).err().unwrap();
        assert!(matches!(err, HistoryError::Corrupt { line: 2, .. }));
    }
}
