use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::format::LabelSet;
use crate::level::LevelMap;

/// Value of the `service` label in [`default_labels`].
pub const DEFAULT_SERVICE: &str = "rust";

/// Configuration for [`LokiTarget`](crate::target::LokiTarget).
///
/// Built once at startup by the host (or [`LokiConfig::from_env`]) and
/// treated as immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct LokiConfig {
    /// Push API URL, e.g. `https://loki.example.com/loki/api/v1/push`.
    pub push_url: String,
    /// Basic auth user. No `Authorization` header is sent when both the
    /// user and the password are empty.
    #[serde(default)]
    pub auth_user: String,
    #[serde(default)]
    pub auth_password: String,
    /// Static labels attached to every stream. See [`default_labels`].
    /// Number and bool values in serialized config are stringified.
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub labels: LabelSet,
    /// Name of the label carrying the resolved level; empty disables it.
    #[serde(default = "default_level_label")]
    pub level_label: String,
    #[serde(default)]
    pub level_map: LevelMap,
    /// Levels for which host context is appended to the line. `None`
    /// means every level, an empty set means none.
    #[serde(default)]
    pub context_levels: Option<BTreeSet<String>>,
    /// Whole-request timeout of the HTTP transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Gzip request bodies when the `gzip` feature is compiled in.
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn deserialize_labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LabelSet, D::Error> {
    BTreeMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            Value::Number(n) => Ok((name, n.to_string())),
            Value::Bool(b) => Ok((name, b.to_string())),
            other => Err(D::Error::custom(format!(
                "label `{name}` must be a string, number or bool, got {other}"
            ))),
        })
        .collect()
}

fn default_level_label() -> String {
    "level".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_compress() -> bool {
    true
}

impl LokiConfig {
    pub fn new(push_url: impl Into<String>) -> Self {
        LokiConfig {
            push_url: push_url.into(),
            auth_user: String::new(),
            auth_password: String::new(),
            labels: LabelSet::new(),
            level_label: default_level_label(),
            level_map: LevelMap::new(),
            context_levels: None,
            timeout_secs: default_timeout_secs(),
            compress: default_compress(),
        }
    }

    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth_user = user.into();
        self.auth_password = password.into();
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn has_auth(&self) -> bool {
        !(self.auth_user.is_empty() && self.auth_password.is_empty())
    }
}

/// The conventional label set: `host`, `environment`, `service` and `app`.
///
/// Callers supply the values; nothing here inspects the process.
pub fn default_labels(host: &str, environment: &str, app: &str) -> LabelSet {
    LabelSet::from([
        ("host".to_string(), host.to_string()),
        ("environment".to_string(), environment.to_string()),
        ("service".to_string(), DEFAULT_SERVICE.to_string()),
        ("app".to_string(), app.to_string()),
    ])
}
