use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt;

use crate::level::Level;

/// One captured log record, as handed over by the host logging framework.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub message: Message,
    pub level: Level,
    pub category: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub traces: Vec<Trace>,
    /// Opaque host text (request id, user id, ...) prepended to the line.
    pub prefix: Option<String>,
}

impl LogRecord {
    /// Record stamped with the current time, no traces and no prefix.
    pub fn new(level: Level, category: impl Into<String>, message: impl Into<Message>) -> Self {
        LogRecord {
            message: message.into(),
            level,
            category: category.into(),
            timestamp: seconds_since_epoch(Utc::now()),
            traces: Vec::new(),
            prefix: None,
        }
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn at_datetime(self, time: DateTime<Utc>) -> Self {
        self.at(seconds_since_epoch(time))
    }

    pub fn with_trace(mut self, file: impl Into<String>, line: u32) -> Self {
        self.traces.push(Trace {
            file: file.into(),
            line,
        });
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Timestamp in nanoseconds, truncated toward zero.
    ///
    /// Out-of-range values saturate at the `i64` bounds and NaN maps to 0.
    pub fn timestamp_ns(&self) -> i64 {
        (self.timestamp * 1_000_000_000.0) as i64
    }
}

fn seconds_since_epoch(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1_000_000_000.0
}

/// A source location attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub file: String,
    pub line: u32,
}

/// Payload of a log record.
#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Error(ErrorReport),
    /// Structured value, rendered with the bounded dumper.
    Value(serde_json::Value),
    /// Pre-rendered `Debug` output of a value that has no other representation.
    Debug(String),
}

impl Message {
    /// Text from raw bytes; invalid UTF-8 sequences become U+FFFD.
    pub fn from_utf8_lossy(bytes: &[u8]) -> Self {
        Message::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Accepts unsized errors too, e.g. `&*boxed` for a `Box<dyn Error>`.
    pub fn error<E: Error + ?Sized>(err: &E) -> Self {
        Message::Error(ErrorReport::capture(err))
    }

    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Message::Debug(format!("{value:#?}"))
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Message::Value(value)
    }
}

impl From<ErrorReport> for Message {
    fn from(report: ErrorReport) -> Self {
        Message::Error(report)
    }
}

/// Snapshot of an error and its `source()` chain.
///
/// Errors are rarely `Clone`, and records have to outlive the call that
/// produced them, so the chain is rendered at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub causes: Vec<String>,
}

impl ErrorReport {
    pub fn capture<E: Error + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        ErrorReport {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            causes,
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for cause in &self.causes {
            write!(f, "\nCaused by: {cause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("config load failed")]
    struct LoadError(#[source] std::io::Error);

    #[test]
    fn timestamp_is_truncated_not_rounded() {
        let record = LogRecord::new(Level::Info, "app", "x");

        assert_eq!(record.clone().at(1700000000.123456).timestamp_ns(), 1700000000123456000);
        assert_eq!(record.clone().at(1700000000.1234567).timestamp_ns(), 1700000000123456768);
        // 1999999999.9 ns truncates down
        assert_eq!(record.clone().at(1.9999999999).timestamp_ns(), 1999999999);
        assert_eq!(record.at(f64::NAN).timestamp_ns(), 0);
    }

    #[test]
    fn datetime_conversion_keeps_subsecond_part() {
        let time = DateTime::<Utc>::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        let record = LogRecord::new(Level::Info, "app", "x").at_datetime(time);
        assert_eq!(record.timestamp_ns(), 1_700_000_000_500_000_000);
    }

    #[test]
    fn error_report_walks_source_chain() {
        let err = LoadError(std::io::Error::new(std::io::ErrorKind::NotFound, "app.toml missing"));
        let report = ErrorReport::capture(&err);

        assert!(report.kind.ends_with("LoadError"));
        assert_eq!(report.message, "config load failed");
        assert_eq!(report.causes, vec!["app.toml missing".to_string()]);
        assert!(report.to_string().ends_with("config load failed\nCaused by: app.toml missing"));
    }

    #[test]
    fn captures_boxed_dyn_errors() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(LoadError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "app.toml unreadable",
        )));

        match Message::error(&*boxed) {
            Message::Error(report) => {
                assert_eq!(report.message, "config load failed");
                assert_eq!(report.causes, vec!["app.toml unreadable".to_string()]);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let as_dyn: &dyn Error = &std::fmt::Error;
        let report = ErrorReport::capture(as_dyn);
        assert_eq!(report.message, std::fmt::Error.to_string());
        assert!(report.causes.is_empty());
    }

    #[test]
    fn lossy_bytes_are_substituted() {
        match Message::from_utf8_lossy(b"ok \xff\xfe end") {
            Message::Text(text) => assert_eq!(text, "ok \u{FFFD}\u{FFFD} end"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
