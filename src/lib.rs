pub mod level;
pub mod record;
pub mod dump;
pub mod format;
pub mod batch;
pub mod encode;
pub mod error;
pub mod client;
pub mod config;
pub mod env;
pub mod target;

pub mod sink;
pub mod noop_sink;
pub mod layer;
pub mod init;

pub use config::{default_labels, LokiConfig};
pub use error::{DeliveryError, EncodeError, ExportError};
pub use level::{Level, LevelMap, LevelTarget, RemapOutcome};
pub use record::{LogRecord, Message};
pub use target::{ExportSummary, LokiTarget};
