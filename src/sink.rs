use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for batches of [`LogRecord`]s.
///
/// [`LokiTarget`](crate::target::LokiTarget) is the production
/// implementation. The tracing layer calls `send` from its background task
/// once per flush, never on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Ship one buffered batch.
    ///
    /// **Parameters**
    /// - `records`: every record buffered since the previous flush, in
    ///   capture order.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the batch.
    /// - `Err(..)` if encoding or delivery failed. The caller owns the
    ///   decision to re-send; the layer drops the batch.
    async fn send(&self, records: &[LogRecord]) -> Result<(), Box<dyn Error + Send + Sync>>;
}
