use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use loki_log_sink::init::init_tracing;
use loki_log_sink::noop_sink::NoopSink;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink::default());
    init_tracing(sink).expect("install subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    // Default max level is INFO: the debug events are filtered by the layer,
    // the rest become records whose category is the event target.
    for i in 0..n {
        match i % 3 {
            0 => info!(target: "app::http", iteration = i, "GET /orders served"),
            1 => debug!(target: "app::cache", iteration = i, "cache lookup skipped"),
            _ => error!(target: "app::db", iteration = i, "default load test error"),
        }
    }

    let elapsed = start.elapsed();
    println!("default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
}
