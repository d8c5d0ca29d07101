use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::batch::batch;
use crate::client::PushClient;
use crate::config::LokiConfig;
use crate::encode::{default_compressor, encode, Compressor, NoopCompressor};
use crate::error::ExportError;
use crate::format::Formatter;
use crate::record::LogRecord;
use crate::sink::LogSink;

/// Produces the host context block (request, session, server info)
/// appended to lines at the configured context levels.
pub type ContextProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Counts from one successful export call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub streams: usize,
    pub entries: usize,
    pub suppressed: usize,
}

/// Ships buffered [`LogRecord`]s to Loki.
///
/// Each export formats, groups, encodes and pushes its records in order
/// and keeps no state between calls, so concurrent exports do not
/// interfere (though Loki may receive them in any order).
#[derive(Clone)]
pub struct LokiTarget {
    formatter: Formatter,
    compressor: Arc<dyn Compressor>,
    client: PushClient,
    context: Option<ContextProvider>,
}

impl fmt::Debug for LokiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LokiTarget")
            .field("url", &self.client.url())
            .field("formatter", &self.formatter)
            .finish_non_exhaustive()
    }
}

impl LokiTarget {
    pub fn new(config: LokiConfig) -> Result<Self, ExportError> {
        let compressor: Arc<dyn Compressor> = if config.compress {
            default_compressor()
        } else {
            Arc::new(NoopCompressor)
        };

        Ok(LokiTarget {
            formatter: Formatter::new(&config),
            compressor,
            client: PushClient::new(&config)?,
            context: None,
        })
    }

    /// Replace the body compression strategy.
    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_context_provider(mut self, provider: ContextProvider) -> Self {
        self.context = Some(provider);
        self
    }

    /// Export with the context from the configured provider, if any.
    pub async fn export(&self, records: &[LogRecord]) -> Result<ExportSummary, ExportError> {
        let context = self.context.as_ref().map(|f| f()).unwrap_or_default();
        self.export_with_context(records, &context).await
    }

    /// Format, group, encode and push `records` as one request.
    ///
    /// Suppressed records are dropped silently. When nothing is left to send
    /// no request is made. A failed push fails the whole call; nothing is
    /// retried.
    pub async fn export_with_context(
        &self,
        records: &[LogRecord],
        context: &str,
    ) -> Result<ExportSummary, ExportError> {
        let formatted: Vec<_> = records
            .iter()
            .filter_map(|record| self.formatter.format(record, context))
            .collect();
        let suppressed = records.len() - formatted.len();

        let batch = batch(formatted);
        let summary = ExportSummary {
            streams: batch.streams.len(),
            entries: batch.entry_count(),
            suppressed,
        };

        if batch.is_empty() {
            debug!(suppressed, "nothing to push to Loki");
            return Ok(summary);
        }

        let payload = encode(&batch, self.compressor.as_ref())?;
        let bytes = payload.body.len();

        if let Err(e) = self.client.push(payload).await {
            warn!(
                error = %e,
                streams = summary.streams,
                entries = summary.entries,
                "Loki push failed"
            );
            return Err(e.into());
        }

        debug!(
            streams = summary.streams,
            entries = summary.entries,
            suppressed,
            bytes,
            "pushed logs to Loki"
        );
        Ok(summary)
    }
}

#[async_trait]
impl LogSink for LokiTarget {
    async fn send(&self, records: &[LogRecord]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.export(records).await?;
        Ok(())
    }
}
