use std::collections::{BTreeMap, BTreeSet};

use crate::config::LokiConfig;
use crate::dump::dump;
use crate::level::{LevelMap, RemapOutcome};
use crate::record::{LogRecord, Message};

/// Loki stream labels. Ordered so equal sets compare and serialize alike.
pub type LabelSet = BTreeMap<String, String>;

/// A single formatted line and its nanosecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp_ns: i64,
    pub line: String,
}

/// Turns [`LogRecord`]s into Loki log lines plus the labels of their stream.
#[derive(Debug, Clone)]
pub struct Formatter {
    labels: LabelSet,
    level_label: String,
    level_map: LevelMap,
    context_levels: Option<BTreeSet<String>>,
}

impl Formatter {
    pub fn new(config: &LokiConfig) -> Self {
        Formatter {
            labels: config.labels.clone(),
            level_label: config.level_label.clone(),
            level_map: config.level_map.clone(),
            context_levels: config.context_levels.clone(),
        }
    }

    /// Format one record. Returns `None` when its level is remapped to
    /// suppression.
    ///
    /// `context` is host diagnostics (request, session, server info) that is
    /// appended after a blank line for the levels selected by
    /// `context_levels`.
    pub fn format(&self, record: &LogRecord, context: &str) -> Option<(LogEntry, LabelSet)> {
        let level = match self.level_map.remap(record.level.as_str(), &record.category) {
            RemapOutcome::Level(level) => level,
            RemapOutcome::Suppress => return None,
        };

        let mut line = format!(
            "{}[{}][{}] {}",
            record.prefix.as_deref().unwrap_or_default(),
            level,
            record.category,
            render_message(&record.message),
        );

        for trace in &record.traces {
            line.push_str(&format!("\n    in {}:{}", trace.file, trace.line));
        }

        if !context.is_empty() && self.wants_context(&level) {
            line.push_str("\n\n");
            line.push_str(context);
        }

        let mut labels = self.labels.clone();
        if !self.level_label.is_empty() {
            labels.insert(self.level_label.clone(), level);
        }

        let entry = LogEntry {
            timestamp_ns: record.timestamp_ns(),
            line,
        };
        Some((entry, labels))
    }

    fn wants_context(&self, level: &str) -> bool {
        self.context_levels
            .as_ref()
            .map_or(true, |levels| levels.contains(level))
    }
}

fn render_message(message: &Message) -> String {
    match message {
        Message::Text(text) => text.clone(),
        Message::Error(report) => report.to_string(),
        Message::Value(value) => dump(value),
        Message::Debug(rendered) => rendered.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Level, LevelTarget};
    use crate::record::ErrorReport;

    fn config() -> LokiConfig {
        let mut config = LokiConfig::new("http://loki:3100/loki/api/v1/push");
        config.labels = LabelSet::from([
            ("host".to_string(), "web-1".to_string()),
            ("service".to_string(), "rust".to_string()),
        ]);
        config
    }

    fn record(level: Level, category: &str, text: &str) -> LogRecord {
        LogRecord::new(level, category, text).at(1700000000.5)
    }

    #[test]
    fn formats_line_and_labels() {
        let formatter = Formatter::new(&config());
        let (entry, labels) = formatter
            .format(&record(Level::Info, "app::db", "connected"), "")
            .unwrap();

        assert_eq!(entry.line, "[info][app::db] connected");
        assert_eq!(entry.timestamp_ns, 1700000000500000000);
        assert_eq!(labels.get("level").map(String::as_str), Some("info"));
        assert_eq!(labels.get("host").map(String::as_str), Some("web-1"));
    }

    #[test]
    fn prefix_and_traces() {
        let formatter = Formatter::new(&config());
        let rec = record(Level::Error, "app", "boom")
            .with_prefix("[req-42]")
            .with_trace("src/main.rs", 10)
            .with_trace("src/lib.rs", 20);

        let (entry, _) = formatter.format(&rec, "").unwrap();
        assert_eq!(
            entry.line,
            "[req-42][error][app] boom\n    in src/main.rs:10\n    in src/lib.rs:20"
        );
    }

    #[test]
    fn context_is_gated_by_level() {
        let mut config = config();
        config.context_levels = Some(BTreeSet::from(["error".to_string()]));
        let formatter = Formatter::new(&config);

        let (info, _) = formatter
            .format(&record(Level::Info, "app", "hi"), "SERVER=web-1")
            .unwrap();
        assert_eq!(info.line, "[info][app] hi");

        let (error, _) = formatter
            .format(&record(Level::Error, "app", "bad"), "SERVER=web-1")
            .unwrap();
        assert_eq!(error.line, "[error][app] bad\n\nSERVER=web-1");
    }

    #[test]
    fn context_for_all_levels_by_default_but_never_empty() {
        let formatter = Formatter::new(&config());

        let (with, _) = formatter
            .format(&record(Level::Debug, "app", "x"), "ctx")
            .unwrap();
        assert_eq!(with.line, "[debug][app] x\n\nctx");

        let (without, _) = formatter.format(&record(Level::Debug, "app", "x"), "").unwrap();
        assert_eq!(without.line, "[debug][app] x");
    }

    #[test]
    fn context_gating_uses_remapped_level() {
        let mut config = config();
        config.context_levels = Some(BTreeSet::from(["critical".to_string()]));
        config.level_map =
            LevelMap::new().with_override("app", "error", LevelTarget::Level("critical".into()));
        let formatter = Formatter::new(&config);

        let (entry, labels) = formatter
            .format(&record(Level::Error, "app", "bad"), "ctx")
            .unwrap();
        assert_eq!(entry.line, "[critical][app] bad\n\nctx");
        assert_eq!(labels.get("level").map(String::as_str), Some("critical"));
    }

    #[test]
    fn suppressed_record_yields_nothing() {
        let mut config = config();
        config.level_map = LevelMap::new().with_override("noisy", "*", LevelTarget::Suppress);
        let formatter = Formatter::new(&config);

        assert!(formatter.format(&record(Level::Error, "noisy", "x"), "").is_none());
        assert!(formatter.format(&record(Level::Error, "quiet", "x"), "").is_some());
    }

    #[test]
    fn empty_level_label_omits_level() {
        let mut config = config();
        config.level_label = String::new();
        let formatter = Formatter::new(&config);

        let (_, labels) = formatter.format(&record(Level::Info, "app", "x"), "").unwrap();
        assert_eq!(labels, config.labels);
    }

    #[test]
    fn custom_level_label_name() {
        let mut config = config();
        config.level_label = "severity".to_string();
        let formatter = Formatter::new(&config);

        let (_, labels) = formatter.format(&record(Level::Warning, "app", "x"), "").unwrap();
        assert_eq!(labels.get("severity").map(String::as_str), Some("warning"));
        assert!(!labels.contains_key("level"));
    }

    #[test]
    fn labels_are_not_shared_between_records() {
        let formatter = Formatter::new(&config());
        let (_, first) = formatter.format(&record(Level::Error, "a", "x"), "").unwrap();
        let (_, second) = formatter.format(&record(Level::Info, "a", "x"), "").unwrap();

        assert_eq!(first.get("level").map(String::as_str), Some("error"));
        assert_eq!(second.get("level").map(String::as_str), Some("info"));
    }

    #[test]
    fn empty_category_and_text_still_format() {
        let formatter = Formatter::new(&config());
        let (entry, _) = formatter.format(&record(Level::Info, "", ""), "").unwrap();
        assert_eq!(entry.line, "[info][] ");
    }

    #[test]
    fn renders_non_text_messages() {
        let formatter = Formatter::new(&config());

        let value = LogRecord::new(Level::Info, "app", serde_json::json!({"id": 1})).at(1.0);
        let (entry, _) = formatter.format(&value, "").unwrap();
        assert_eq!(entry.line, "[info][app] [\n    'id' => 1,\n]");

        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let report = LogRecord::new(Level::Error, "app", ErrorReport::capture(&err)).at(1.0);
        let (entry, _) = formatter.format(&report, "").unwrap();
        assert!(entry.line.starts_with("[error][app] "));
        assert!(entry.line.ends_with(": disk full"));

        let debug = LogRecord::new(Level::Info, "app", Message::debug(&Some(3))).at(1.0);
        let (entry, _) = formatter.format(&debug, "").unwrap();
        assert_eq!(entry.line, "[info][app] Some(\n    3,\n)");
    }
}
