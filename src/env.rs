//! Environment variable names for configuring the Loki target from a
//! service's environment.
//!
//! These are purely helpers for startup code; [`LokiTarget`] and the rest
//! of the pipeline never read the environment themselves.
//!
//! [`LokiTarget`]: crate::target::LokiTarget

use crate::config::{default_labels, LokiConfig};

/// Loki push URL, e.g. `https://loki.example.com/loki/api/v1/push`.
pub const LOKI_PUSH_URL_ENV: &str = "LOKI_PUSH_URL";

/// Optional basic auth user.
pub const LOKI_AUTH_USER_ENV: &str = "LOKI_AUTH_USER";

/// Optional basic auth password.
pub const LOKI_AUTH_PASSWORD_ENV: &str = "LOKI_AUTH_PASSWORD";

/// Name of the level label; set to an empty string to disable it.
pub const LOKI_LEVEL_LABEL_ENV: &str = "LOKI_LEVEL_LABEL";

/// Comma-separated levels that get host context appended.
pub const LOKI_CONTEXT_LEVELS_ENV: &str = "LOKI_CONTEXT_LEVELS";

/// Deployment environment used for the `environment` label.
pub const LOKI_ENVIRONMENT_ENV: &str = "LOKI_ENVIRONMENT";

/// Application id used for the `app` label.
pub const LOKI_APP_ENV: &str = "LOKI_APP";

/// Host name used for the `host` label.
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(thiserror::Error, Debug)]
#[error("environment variable {0} is not set")]
pub struct MissingEnv(pub &'static str);

impl LokiConfig {
    /// Build a configuration from `LOKI_*` variables, with
    /// [`default_labels`] filled from `HOSTNAME`, `LOKI_ENVIRONMENT` and
    /// `LOKI_APP`.
    pub fn from_env() -> Result<Self, MissingEnv> {
        let push_url =
            std::env::var(LOKI_PUSH_URL_ENV).map_err(|_| MissingEnv(LOKI_PUSH_URL_ENV))?;

        let labels = default_labels(
            &env_or(HOSTNAME_ENV, "localhost"),
            &env_or(LOKI_ENVIRONMENT_ENV, "prod"),
            &env_or(LOKI_APP_ENV, "app"),
        );

        let mut config = LokiConfig::new(push_url)
            .with_auth(env_or(LOKI_AUTH_USER_ENV, ""), env_or(LOKI_AUTH_PASSWORD_ENV, ""))
            .with_labels(labels);

        if let Ok(label) = std::env::var(LOKI_LEVEL_LABEL_ENV) {
            config.level_label = label;
        }
        if let Ok(levels) = std::env::var(LOKI_CONTEXT_LEVELS_ENV) {
            config.context_levels = Some(
                levels
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }

        Ok(config)
    }
}
