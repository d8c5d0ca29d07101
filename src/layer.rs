use crate::level::Level as RecordLevel;
use crate::record::{LogRecord, Message};
use crate::sink::LogSink;
use std::fmt::Write as _;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::field::{Field, Visit};
use tracing::{warn, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events from this crate are never shipped, so a failing push cannot feed
/// its own warning back into the next batch.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`LogSink`] in batches.
///
/// Records travel over a bounded channel to a background task, which calls
/// [`LogSink::send`] whenever `batch_size` records are buffered, every
/// `flush_interval`, and once more when the channel closes. Network I/O
/// never runs on application threads.
pub struct LokiLayer {
    sender: mpsc::Sender<LogRecord>,
    max_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl LokiLayer {
    /// Create a new layer and spawn the background flush task.
    ///
    /// Must be called inside a Tokio runtime. Events less severe than
    /// `max_level` are ignored. Minimal thresholds are enforced for
    /// `buffer`, `batch_size` and `flush_interval` to avoid degenerate
    /// configurations.
    pub fn new(
        sink: Arc<dyn LogSink>,
        max_level: Level,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<LogRecord>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(run_flush_loop(sink, rx, batch_size, flush_interval));

        (
            Self {
                sender: tx,
                max_level,
                total_events,
                enqueued_events,
                dropped_events,
            },
            handle,
        )
    }
}

async fn run_flush_loop(
    sink: Arc<dyn LogSink>,
    mut rx: mpsc::Receiver<LogRecord>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut batch = Vec::with_capacity(batch_size);
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(record) => {
                    batch.push(record);
                    if batch.len() >= batch_size {
                        flush(&*sink, &mut batch).await;
                    }
                }
                None => {
                    flush(&*sink, &mut batch).await;
                    return;
                }
            },
            _ = ticker.tick() => flush(&*sink, &mut batch).await,
        }
    }
}

/// Send and clear `batch`. Failed batches are dropped, not retried.
async fn flush(sink: &dyn LogSink, batch: &mut Vec<LogRecord>) {
    if batch.is_empty() {
        return;
    }

    if let Err(e) = sink.send(batch.as_slice()).await {
        warn!(error = %e, records = batch.len(), "log batch dropped");
    }
    batch.clear();
}

impl<S> Layer<S> for LokiLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if *meta.level() > self.max_level || is_own_target(meta.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(
            RecordLevel::from(meta.level()),
            meta.target(),
            visitor.into_text(),
        );
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_trace(file, line);
        }

        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Collects the `message` field as text and renders every other field as
/// ` key=value` after it.
#[derive(Default)]
pub struct FieldVisitor {
    message: String,
    fields: String,
}

impl FieldVisitor {
    pub fn into_text(self) -> Message {
        Message::Text(self.message + &self.fields)
    }

    fn push_field(&mut self, field: &Field, value: &dyn std::fmt::Display) {
        let _ = write!(self.fields, " {}={}", field.name(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, &format_args!("{value:?}"));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_field(field, &value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_field(field, &value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_field(field, &value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, &format_args!("{value:?}"));
        }
    }
}
