//! Step log storage
//!
//! Sessions persist their history as an append-only log of entries. A reset
//! does not truncate the log; it appends a marker, and replay starts after
//! the last marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::{error::MemoryError, memory::StepMemory, record::StepRecord, Result};

/// One line of a persisted step log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Step(StepRecord),
    Reset { timestamp: DateTime<Utc> },
}

/// Rebuild the live memory from a log: the steps after the last reset
pub fn replay(entries: &[LogEntry]) -> Result<StepMemory> {
    let start = entries
        .iter()
        .rposition(|entry| matches!(entry, LogEntry::Reset { .. }))
        .map_or(0, |i| i + 1);

    let records = entries[start..]
        .iter()
        .filter_map(|entry| match entry {
            LogEntry::Step(record) => Some(record.clone()),
            LogEntry::Reset { .. } => None,
        })
        .collect();

    StepMemory::restore(records)
}

/// Trait for step log backends
#[async_trait]
pub trait StepLogStore: Send + Sync {
    /// Append one step to a session's log
    async fn append_step(&self, session_id: &str, record: &StepRecord) -> Result<()>;

    /// Append a reset marker
    async fn append_reset(&self, session_id: &str) -> Result<()>;

    /// All entries of a session, oldest first
    ///
    /// # Returns
    /// NotFound if nothing was ever written for the session
    async fn load(&self, session_id: &str) -> Result<Vec<LogEntry>>;

    /// List all session IDs in the store
    async fn list_sessions(&self) -> Result<Vec<String>>;

    /// Get the name of this store (for debugging/logging)
    fn name(&self) -> &str;
}

/// In-memory step log using DashMap
#[derive(Clone, Default)]
pub struct InMemoryStepLog {
    logs: Arc<DashMap<String, Vec<LogEntry>>>,
}

impl InMemoryStepLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, session_id: &str, entry: LogEntry) {
        self.logs
            .entry(session_id.to_string())
            .or_default()
            .push(entry);
    }
}

#[async_trait]
impl StepLogStore for InMemoryStepLog {
    async fn append_step(&self, session_id: &str, record: &StepRecord) -> Result<()> {
        self.push(session_id, LogEntry::Step(record.clone()));
        Ok(())
    }

    async fn append_reset(&self, session_id: &str) -> Result<()> {
        self.push(session_id, LogEntry::Reset { timestamp: Utc::now() });
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<LogEntry>> {
        self.logs
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MemoryError::not_found(session_id))
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.logs.iter().map(|entry| entry.key().clone()).collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Step log stored as one JSON Lines file per session
pub struct JsonlStepLog {
    base_dir: PathBuf,
}

impl JsonlStepLog {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MemoryError::storage(format!(
                "invalid session id: {:?}",
                session_id
            )));
        }
        Ok(self.base_dir.join(format!("{}.jsonl", session_id)))
    }

    async fn append(&self, session_id: &str, entry: &LogEntry) -> Result<()> {
        let path = self.session_path(session_id)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl StepLogStore for JsonlStepLog {
    async fn append_step(&self, session_id: &str, record: &StepRecord) -> Result<()> {
        self.append(session_id, &LogEntry::Step(record.clone())).await
    }

    async fn append_reset(&self, session_id: &str) -> Result<()> {
        self.append(session_id, &LogEntry::Reset { timestamp: Utc::now() })
            .await
    }

    async fn load(&self, session_id: &str) -> Result<Vec<LogEntry>> {
        let path = self.session_path(session_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MemoryError::not_found(session_id));
            }
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(MemoryError::from))
            .collect()
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    sessions.push(stem.to_string());
                }
            }
        }
        sessions.sort();
        Ok(sessions)
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
