/// Capped, append-only event log shared by popup, background and content scripts
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::storage::{StorageArea, StorageError};

pub const LOG_STORAGE_KEY: &str = "app_logs";
pub const MAX_LOG_SIZE: usize = 200;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

/// Extension context that produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Popup,
    Background,
    Content,
}

impl LogSource {
    pub fn label(&self) -> &'static str {
        match self {
            LogSource::Popup => "Popup",
            LogSource::Background => "BG",
            LogSource::Content => "Content",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// Other writers may store `"hidden": null`; treat it like an absent flag.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// One recorded event. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub timestamp: String,
    pub level: LogLevel,
    pub source: LogSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Kept for the audit trail but never shown in the popup
    #[serde(default, deserialize_with = "null_as_false", skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl LogEntry {
    /// New entry stamped with the local wall clock.
    pub fn new(message: impl Into<String>, level: LogLevel, source: LogSource) -> LogEntry {
        LogEntry {
            message: message.into(),
            timestamp: now(),
            level,
            source,
            detail: None,
            hidden: false,
            id: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> LogEntry {
        self.detail = detail;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> LogEntry {
        self.hidden = hidden;
        self
    }
}

/// Current local time as `YYYY-MM-DD HH:mm:ss`
pub fn now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Append `entry`, dropping the oldest entries beyond [`MAX_LOG_SIZE`].
pub fn push_capped<T>(logs: &mut Vec<T>, entry: T) {
    logs.push(entry);
    if logs.len() > MAX_LOG_SIZE {
        let excess = logs.len() - MAX_LOG_SIZE;
        logs.drain(..excess);
    }
}

/// Stored elements as raw JSON; anything but a sequence is an empty log.
fn raw_entries(value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            log::warn!("Ignoring malformed log sequence: {}", other);
            Vec::new()
        }
    }
}

/// Decode a stored log value element by element.
///
/// Elements that don't decode are skipped here but stay in storage.
pub fn decode_logs(value: Option<Value>) -> Vec<LogEntry> {
    raw_entries(value)
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value(item)
                .map_err(|e| log::warn!("Skipping unreadable log entry: {}", e))
                .ok()
        })
        .collect()
}

/// Read-modify-write access to the stored log.
///
/// Appends from different contexts are not serialized against each other; two
/// writers racing on the same sequence can lose one entry, which is fine for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct LogStore<S> {
    area: S,
}

impl<S: StorageArea> LogStore<S> {
    pub fn new(area: S) -> Self {
        LogStore { area }
    }

    pub fn area(&self) -> &S {
        &self.area
    }

    /// Full sequence in insertion order.
    pub async fn get_logs(&self) -> Result<Vec<LogEntry>, StorageError> {
        let stored = self.area.get(LOG_STORAGE_KEY).await?;
        Ok(decode_logs(stored))
    }

    pub async fn add_log(
        &self,
        message: impl Into<String>,
        level: LogLevel,
        source: LogSource,
        detail: Option<String>,
        hidden: bool,
    ) -> Result<(), StorageError> {
        let entry = LogEntry::new(message, level, source)
            .with_detail(detail)
            .with_hidden(hidden);
        self.append(entry).await
    }

    /// Append a prepared entry with a single write of the trimmed sequence.
    ///
    /// Existing elements are written back as stored, readable or not.
    pub async fn append(&self, entry: LogEntry) -> Result<(), StorageError> {
        let mut logs = raw_entries(self.area.get(LOG_STORAGE_KEY).await?);
        push_capped(&mut logs, serde_json::to_value(&entry)?);
        self.area.set(LOG_STORAGE_KEY, Value::Array(logs)).await
    }

    /// Deletes the key rather than writing an empty sequence.
    pub async fn clear_logs(&self) -> Result<(), StorageError> {
        self.area.remove(LOG_STORAGE_KEY).await
    }

    pub async fn log_info(
        &self,
        message: impl Into<String>,
        source: LogSource,
        hidden: bool,
    ) -> Result<(), StorageError> {
        self.add_log(message, LogLevel::Info, source, None, hidden).await
    }

    pub async fn log_warn(
        &self,
        message: impl Into<String>,
        source: LogSource,
        detail: Option<String>,
        hidden: bool,
    ) -> Result<(), StorageError> {
        self.add_log(message, LogLevel::Warn, source, detail, hidden).await
    }

    /// The error's display text becomes the entry's detail.
    pub async fn log_error(
        &self,
        message: impl Into<String>,
        source: LogSource,
        error: Option<&dyn fmt::Display>,
        hidden: bool,
    ) -> Result<(), StorageError> {
        let detail = error.map(|e| e.to_string());
        self.add_log(message, LogLevel::Error, source, detail, hidden).await
    }
}
