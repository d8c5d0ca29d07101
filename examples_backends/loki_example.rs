use std::sync::Arc;

use loki_log_sink::{
    init::{init_tracing_with_config, LayerConfig},
    level::LevelTarget,
    LokiConfig, LokiTarget,
};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Example: LOKI_PUSH_URL=http://localhost:3100/loki/api/v1/push
    if std::env::var("LOKI_PUSH_URL").is_err() {
        std::env::set_var("LOKI_PUSH_URL", "http://localhost:3100/loki/api/v1/push");
    }

    let mut config = LokiConfig::from_env().expect("LOKI_PUSH_URL");
    // 404s are expected traffic, not errors.
    config.level_map = config
        .level_map
        .with_override("http::not_found", "error", LevelTarget::Level("warning".into()));
    config.context_levels = Some(["error".to_string()].into_iter().collect());

    let target = LokiTarget::new(config)
        .expect("build loki target")
        .with_context_provider(Arc::new(|| format!("PID={}", std::process::id())));

    init_tracing_with_config(
        Arc::new(target),
        LayerConfig {
            flush_interval: Duration::from_millis(500),
            ..LayerConfig::default()
        },
    )
    .expect("install subscriber");

    info!(user_id = 42, "loki example started");
    warn!(target: "http::not_found", path = "/favicon.ico", "route missing");
    error!(target: "http::not_found", path = "/admin", "route missing");
    error!(order_id = 7, reason = "card declined", "payment failed");

    sleep(Duration::from_secs(2)).await;
}
