use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{info, warn, Level};

use loki_log_sink::init::{init_tracing_with_config, LayerConfig};
use loki_log_sink::noop_sink::NoopSink;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());

    let layer_config = LayerConfig {
        max_level: Level::WARN,
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
    };

    init_tracing_with_config(sink, layer_config).expect("install subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    // Only the warnings pass `max_level`; the info events never reach the sink.
    for i in 0..n {
        if i % 2 == 0 {
            warn!(target: "app::checkout", iteration = i, "payment retried");
        } else {
            info!(target: "app::checkout", iteration = i, "cart updated");
        }
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sleep(Duration::from_secs(2)).await;
}
