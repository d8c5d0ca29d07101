use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{error, info};
use loki_log_sink::{
    init::init_tracing,
    record::LogRecord,
    sink::LogSink,
};

/// Example of plugging a different destination into the layer by
/// implementing `LogSink` directly. Here every batch is just printed.
struct StdoutBatchSink;

#[async_trait]
impl LogSink for StdoutBatchSink {
    async fn send(&self, records: &[LogRecord]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("[stdout-batch] {} records", records.len());
        for record in records {
            println!("  {:?}", record);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let sink: Arc<dyn LogSink> = Arc::new(StdoutBatchSink);

    init_tracing(sink).expect("install subscriber");

    info!("custom backend example started");
    error!(db = "orders", "simulated error sent via custom backend");

    sleep(Duration::from_secs(2)).await;
}
