use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Key in a category's override table that matches every level.
pub const WILDCARD: &str = "*";

/// Severity of a captured log record.
///
/// Names are lowercase on the wire (`warning`, not `warn`) because they are
/// used verbatim as Loki label values and in the `[level]` line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// What a configured override maps a level to.
///
/// In serialized configuration a target is either a level name or
/// `false`/`null`, the latter dropping matching records entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelTarget {
    Level(String),
    Suppress,
}

impl<'de> Deserialize<'de> for LevelTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Level(String),
            Flag(bool),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Level(level)) => Ok(LevelTarget::Level(level)),
            Some(Raw::Flag(false)) | None => Ok(LevelTarget::Suppress),
            Some(Raw::Flag(true)) => Err(D::Error::custom(
                "level override must be a level name, false or null",
            )),
        }
    }
}

/// Result of running a record's level through a [`LevelMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapOutcome {
    Level(String),
    Suppress,
}

impl From<&LevelTarget> for RemapOutcome {
    fn from(target: &LevelTarget) -> Self {
        match target {
            LevelTarget::Level(level) => RemapOutcome::Level(level.clone()),
            LevelTarget::Suppress => RemapOutcome::Suppress,
        }
    }
}

/// Per-category level overrides.
///
/// Keyed by category, then by level name or [`WILDCARD`]:
///
/// ```
/// use loki_log_sink::level::{LevelMap, LevelTarget, RemapOutcome};
///
/// let map = LevelMap::new()
///     .with_override("http::not_found", "error", LevelTarget::Level("warning".into()))
///     .with_override("noisy", "*", LevelTarget::Suppress);
///
/// assert_eq!(map.remap("error", "http::not_found"), RemapOutcome::Level("warning".into()));
/// assert_eq!(map.remap("info", "noisy"), RemapOutcome::Suppress);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LevelMap(HashMap<String, HashMap<String, LevelTarget>>);

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(
        mut self,
        category: impl Into<String>,
        level: impl Into<String>,
        target: LevelTarget,
    ) -> Self {
        self.0
            .entry(category.into())
            .or_default()
            .insert(level.into(), target);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the level a record of `category` is shipped with.
    ///
    /// An exact `level` override beats the category wildcard; with neither
    /// configured the level passes through unchanged. A `"*"` entry therefore
    /// only covers the levels that have no entry of their own.
    pub fn remap(&self, level: &str, category: &str) -> RemapOutcome {
        let Some(overrides) = self.0.get(category) else {
            return RemapOutcome::Level(level.to_string());
        };

        overrides
            .get(level)
            .or_else(|| overrides.get(WILDCARD))
            .map(RemapOutcome::from)
            .unwrap_or_else(|| RemapOutcome::Level(level.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo_map() -> LevelMap {
        LevelMap::new()
            .with_override("app\\Foo", "*", LevelTarget::Level("warning".into()))
            .with_override("app\\Foo", "error", LevelTarget::Level("critical".into()))
    }

    #[test]
    fn exact_override_beats_wildcard() {
        let map = foo_map();
        assert_eq!(
            map.remap("error", "app\\Foo"),
            RemapOutcome::Level("critical".into())
        );
        assert_eq!(
            map.remap("info", "app\\Foo"),
            RemapOutcome::Level("warning".into())
        );
    }

    #[test]
    fn wildcard_does_not_shadow_exact_entries() {
        // Insertion order must not matter: the wildcard is added last here.
        let map = LevelMap::new()
            .with_override("db", "error", LevelTarget::Level("critical".into()))
            .with_override("db", "*", LevelTarget::Suppress);

        assert_eq!(map.remap("error", "db"), RemapOutcome::Level("critical".into()));
        assert_eq!(map.remap("info", "db"), RemapOutcome::Suppress);
    }

    #[test]
    fn unknown_category_passes_level_through() {
        let map = foo_map();
        assert_eq!(
            map.remap("info", "app\\Bar"),
            RemapOutcome::Level("info".into())
        );
    }

    #[test]
    fn category_without_matching_level_passes_through() {
        let map = LevelMap::new().with_override("db", "error", LevelTarget::Suppress);
        assert_eq!(map.remap("info", "db"), RemapOutcome::Level("info".into()));
        assert_eq!(map.remap("error", "db"), RemapOutcome::Suppress);
    }

    #[test]
    fn literal_false_string_is_a_level_not_a_suppression() {
        let map = LevelMap::new().with_override("x", "info", LevelTarget::Level("false".into()));
        assert_eq!(map.remap("info", "x"), RemapOutcome::Level("false".into()));
    }

    #[test]
    fn deserializes_targets() {
        let map: LevelMap = serde_json::from_str(
            r#"{"http::404": {"error": "warning", "info": false, "debug": null}}"#,
        )
        .unwrap();

        assert_eq!(map.remap("error", "http::404"), RemapOutcome::Level("warning".into()));
        assert_eq!(map.remap("info", "http::404"), RemapOutcome::Suppress);
        assert_eq!(map.remap("debug", "http::404"), RemapOutcome::Suppress);
    }

    #[test]
    fn rejects_true_as_target() {
        let res: Result<LevelMap, _> = serde_json::from_str(r#"{"c": {"*": true}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn level_names() {
        assert_eq!(Level::Warning.to_string(), "warning");
        assert_eq!("WARN".parse::<Level>(), Ok(Level::Warning));
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
        assert!("fatal".parse::<Level>().is_err());
    }
}
