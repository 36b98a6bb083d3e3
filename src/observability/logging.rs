//! Structured request logging.
//!
//! # Responsibilities
//! - Build one JSON record per event: fixed service metadata merged with
//!   caller fields
//! - Attach the correlation id of the executing request, when there is one
//! - Write each record as a single line to the log sink
//!
//! # Design Decisions
//! - `timestamp`, `level` and `message` are owned by the logger; caller
//!   fields win every other collision
//! - No buffering: one `emit` is one sink write
//! - Emitting never fails; sink errors are dropped

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::config::ServiceIdentity;
use crate::http::request;

/// Keys the caller can never override.
const RESERVED_KEYS: [&str; 3] = ["timestamp", "level", "message"];

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current UTC time as ISO-8601 with microseconds.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Destination for serialized log lines.
pub trait LogSink: Send + Sync {
    /// Write one complete line. `line` carries no trailing newline.
    fn write_line(&self, line: &str);
}

/// Writes records to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        let mut out = io::stdout().lock();
        let _ = out.write_all(buf.as_bytes());
    }
}

/// Keeps records in memory. Used by tests to inspect emitted logs.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lines in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("memory sink mutex poisoned").clone()
    }

    /// Lines parsed back into JSON values, in emission order.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .expect("memory sink mutex poisoned")
            .push(line.to_string());
    }
}

/// Structured JSON logger.
///
/// Cheap to clone; all clones share the sink.
#[derive(Clone)]
pub struct Logger {
    identity: Arc<ServiceIdentity>,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(identity: ServiceIdentity, sink: Arc<dyn LogSink>) -> Self {
        Self {
            identity: Arc::new(identity),
            sink,
        }
    }

    /// Logger writing to standard output.
    pub fn stdout(identity: ServiceIdentity) -> Self {
        Self::new(identity, Arc::new(StdoutSink))
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Emit one record.
    ///
    /// `fields` is merged into the record when it is a JSON object. Any other
    /// non-null value is stored under `extra`.
    pub fn emit(&self, level: Level, message: &str, fields: Value) {
        let record = self.build_record(level, message, fields);
        if let Ok(line) = serde_json::to_string(&Value::Object(record)) {
            self.sink.write_line(&line);
        }
    }

    pub fn info(&self, message: &str, fields: Value) {
        self.emit(Level::Info, message, fields);
    }

    pub fn warn(&self, message: &str, fields: Value) {
        self.emit(Level::Warn, message, fields);
    }

    pub fn error(&self, message: &str, fields: Value) {
        self.emit(Level::Error, message, fields);
    }

    fn build_record(&self, level: Level, message: &str, fields: Value) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("service".into(), self.identity.name.clone().into());
        record.insert("version".into(), self.identity.version.clone().into());
        record.insert("environment".into(), self.identity.environment.clone().into());
        if let Some(id) = request::current_correlation_id() {
            record.insert("correlation_id".into(), id.into());
        }

        match fields {
            Value::Object(fields) => {
                for (key, value) in fields {
                    if !RESERVED_KEYS.contains(&key.as_str()) {
                        record.insert(key, value);
                    }
                }
            }
            Value::Null => {}
            other => {
                record.insert("extra".into(), other);
            }
        }

        record.insert("timestamp".into(), utc_timestamp().into());
        record.insert("level".into(), level.as_str().into());
        record.insert("message".into(), message.into());
        record
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
