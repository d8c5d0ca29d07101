use crate::layer::LokiLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the shipping layer.
///
/// **Fields**
/// - `max_level`: least severe level that is shipped (`INFO` ships info,
///   warnings and errors).
/// - `channel_buffer`: records queued before new ones are dropped.
/// - `batch_size`: records per export call.
/// - `flush_interval`: longest time a partial batch waits.
/// - `enable_stdout`: also print events through the `fmt` layer.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub max_level: Level,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_level: Level::INFO,
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("a global tracing subscriber is already installed")]
pub struct InitError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// Install a global `tracing` subscriber that ships events through `sink`.
///
/// **Returns**
/// - the handle of the background flush task. It finishes after a final
///   flush once the subscriber is dropped, which for a global default only
///   happens at process exit.
/// - `Err(InitError)` if another global subscriber is already set.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, InitError> {
    let (layer, handle) = LokiLayer::new(
        sink,
        config.max_level,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );

    // The fmt layer changes the subscriber type, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<JoinHandle<()>, InitError> {
    init_tracing_with_config(sink, LayerConfig::default())
}
