use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING};
use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter};
use std::io::{self, Write};
use std::sync::Arc;

use crate::batch::PushBatch;
use crate::error::EncodeError;
use crate::format::LabelSet;

/// Request body of one push, plus the headers that describe its encoding.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Body compression applied after serialization.
pub trait Compressor: Send + Sync {
    /// Value of the `Content-Encoding` header, `None` for identity.
    fn content_encoding(&self) -> Option<&'static str>;

    fn compress(&self, body: Vec<u8>) -> io::Result<Vec<u8>>;
}

/// Sends bodies as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompressor;

impl Compressor for NoopCompressor {
    fn content_encoding(&self) -> Option<&'static str> {
        None
    }

    fn compress(&self, body: Vec<u8>) -> io::Result<Vec<u8>> {
        Ok(body)
    }
}

#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCompressor {
    level: flate2::Compression,
}

#[cfg(feature = "gzip")]
impl GzipCompressor {
    pub fn new(level: u32) -> Self {
        GzipCompressor {
            level: flate2::Compression::new(level),
        }
    }
}

#[cfg(feature = "gzip")]
impl Compressor for GzipCompressor {
    fn content_encoding(&self) -> Option<&'static str> {
        Some("gzip")
    }

    fn compress(&self, body: Vec<u8>) -> io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::with_capacity(body.len() / 4), self.level);
        encoder.write_all(&body)?;
        encoder.finish()
    }
}

/// Gzip when the `gzip` feature is compiled in, identity otherwise.
pub fn default_compressor() -> Arc<dyn Compressor> {
    #[cfg(feature = "gzip")]
    {
        Arc::new(GzipCompressor::default())
    }

    #[cfg(not(feature = "gzip"))]
    {
        Arc::new(NoopCompressor)
    }
}

// Wire shape of https://grafana.com/docs/loki/latest/reference/loki-http-api/#ingest-logs
#[derive(Serialize)]
struct PushRequest<'a> {
    streams: Vec<PushStream<'a>>,
}

#[derive(Serialize)]
struct PushStream<'a> {
    stream: &'a LabelSet,
    // Nanosecond timestamps go out as strings; JSON numbers lose precision.
    values: Vec<(String, &'a str)>,
}

impl<'a> From<&'a PushBatch> for PushRequest<'a> {
    fn from(batch: &'a PushBatch) -> Self {
        PushRequest {
            streams: batch
                .streams
                .iter()
                .map(|stream| PushStream {
                    stream: &stream.labels,
                    values: stream
                        .entries
                        .iter()
                        .map(|e| (e.timestamp_ns.to_string(), e.line.as_str()))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Compact JSON with `"` and `'` inside strings written as `\u0022` and
/// `\u0027`, so the payload can be embedded in quoted contexts.
struct HexQuoteFormatter;

impl Formatter for HexQuoteFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut rest = fragment;
        while let Some(pos) = rest.find('\'') {
            writer.write_all(rest[..pos].as_bytes())?;
            writer.write_all(b"\\u0027")?;
            rest = &rest[pos + 1..];
        }
        writer.write_all(rest.as_bytes())
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match char_escape {
            CharEscape::Quote => writer.write_all(b"\\u0022"),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// Serialize `batch` to the JSON body of a Loki push request.
pub fn to_json(batch: &PushBatch) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, HexQuoteFormatter);
    PushRequest::from(batch).serialize(&mut serializer)?;
    Ok(body)
}

/// Serialize and compress `batch`, returning the body and its
/// `Content-Encoding` header if any.
pub fn encode(batch: &PushBatch, compressor: &dyn Compressor) -> Result<EncodedPayload, EncodeError> {
    let json = to_json(batch)?;
    let body = compressor.compress(json).map_err(EncodeError::Compress)?;

    let mut headers = HeaderMap::new();
    if let Some(encoding) = compressor.content_encoding() {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
    }

    Ok(EncodedPayload { body, headers })
}
