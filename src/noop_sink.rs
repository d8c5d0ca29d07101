use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops every batch.
///
/// Useful for measuring the overhead of the layer itself without any
/// network I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _records: &[LogRecord]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
