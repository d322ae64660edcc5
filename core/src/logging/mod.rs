//! Append-only JSONL record of every protocol event.
//!
//! One [`LogRecord`] becomes one line. The file is opened in append mode so
//! records from earlier runs are preserved, and every write is flushed before
//! returning.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Initialize,
    InitializeError,
    SdkUnavailable,
    ToolsList,
    ToolsListError,
    ToolsCall,
    ToolsResponse,
    ToolsError,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::InitializeError => "initialize_error",
            Self::SdkUnavailable => "sdk_unavailable",
            Self::ToolsList => "tools/list",
            Self::ToolsListError => "tools/list_error",
            Self::ToolsCall => "tools/call",
            Self::ToolsResponse => "tools/response",
            Self::ToolsError => "tools/error",
        }
    }
}

/// A single log line: the event, its fields and an optional timestamp.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub event: LogEvent,
    pub fields: Map<String, Value>,
    /// Seconds since the Unix epoch. Stamped on write when `None`.
    pub ts: Option<f64>,
}

impl LogRecord {
    pub fn new(event: LogEvent) -> Self {
        Self {
            event,
            fields: Map::new(),
            ts: None,
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_ts(mut self, ts: f64) -> Self {
        self.ts = Some(ts);
        self
    }

    fn into_value(self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 2);
        map.insert("event".to_string(), Value::from(self.event.as_str()));
        map.extend(self.fields);
        let ts = self.ts.unwrap_or_else(now_seconds);
        map.insert("ts".to_string(), Value::from(ts));
        Value::Object(map)
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub struct InteractionLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl InteractionLogger {
    /// Opens `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory {}", parent.display())
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open interaction log {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record. IO failures are reported, never raised.
    pub fn write(&self, record: LogRecord) {
        let event = record.event;
        let line = match serde_json::to_string(&record.into_value()) {
            Ok(line) => line,
            Err(e) => {
                warn!(event = event.as_str(), "Could not serialize log record: {}", e);
                return;
            }
        };

        let Ok(mut file) = self.file.lock() else {
            warn!(event = event.as_str(), "Interaction log lock poisoned");
            return;
        };

        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            warn!(
                event = event.as_str(),
                path = %self.path.display(),
                "Could not write interaction log: {}",
                e
            );
        }
    }
}

#[cfg(test)]
pub(crate) fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn writes_one_line_per_record_with_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("mcp.jsonl");
        let logger = InteractionLogger::open(&path).unwrap();

        logger.write(LogRecord::new(LogEvent::Initialize).field("server", "fs"));
        logger.write(
            LogRecord::new(LogEvent::ToolsCall)
                .field("server", "fs")
                .field("tool", "read_file")
                .field("args", json!({"path": "/tmp/a"})),
        );

        let records = read_records(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["event"], "initialize");
        assert_eq!(records[1]["event"], "tools/call");
        assert_eq!(records[1]["args"]["path"], "/tmp/a");
        for record in &records {
            assert!(record["ts"].as_f64().unwrap() > 0.0);
        }
    }

    #[test]
    fn keeps_explicit_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mcp.jsonl");
        let logger = InteractionLogger::open(&path).unwrap();

        logger.write(LogRecord::new(LogEvent::SdkUnavailable).with_ts(12.5));

        let records = read_records(&path);
        assert_eq!(records[0]["ts"], 12.5);
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mcp.jsonl");

        {
            let logger = InteractionLogger::open(&path).unwrap();
            logger.write(LogRecord::new(LogEvent::ToolsList).field("tools_count", 3));
        }
        let logger = InteractionLogger::open(&path).unwrap();
        logger.write(LogRecord::new(LogEvent::ToolsListError).field("error", "boom"));

        let events: Vec<_> = read_records(&path)
            .into_iter()
            .map(|r| r["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(events, vec!["tools/list", "tools/list_error"]);
    }
}
