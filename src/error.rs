use std::io;

/// Failure to deliver an encoded batch to Loki.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("Loki returned error: status {status} - {body}")]
    Status { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DeliveryError {
    /// HTTP status of a rejected push, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status, .. } => Some(*status),
            DeliveryError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Failure to turn a batch into a request body.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to serialize push request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to compress push request: {0}")]
    Compress(#[source] io::Error),
}

/// Error returned by a whole export call.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("unable to send request to Loki: {0}")]
    Delivery(#[from] DeliveryError),
}
