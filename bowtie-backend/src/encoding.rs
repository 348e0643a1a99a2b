//! Content encoding applied to request and response bodies.
//!
//! An adapter configured with [`Encoding::Gzip`] advertises
//! `Accept-Encoding: gzip`, compresses non-empty request bodies and
//! decompresses responses that arrive with `Content-Encoding: gzip`.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to compress body: {0}")]
    Compress(#[source] std::io::Error),

    #[error("failed to decompress body: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("unsupported content encoding: {0}")]
    Unsupported(String),
}

/// Body encoding negotiated with the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Bodies are sent and expected as-is.
    #[default]
    None,
    Gzip,
}

impl Encoding {
    /// Token used in `Accept-Encoding` and `Content-Encoding`.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            Encoding::None => None,
            Encoding::Gzip => Some("gzip"),
        }
    }

    /// Maps a `Content-Encoding` value to an encoding.
    pub fn from_content_encoding(value: &str) -> Result<Encoding, EncodingError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => Ok(Encoding::None),
            "gzip" | "x-gzip" => Ok(Encoding::Gzip),
            other => Err(EncodingError::Unsupported(other.to_owned())),
        }
    }

    pub fn encode(&self, data: &[u8]) -> Result<Bytes, EncodingError> {
        match self {
            Encoding::None => Ok(Bytes::copy_from_slice(data)),
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).map_err(EncodingError::Compress)?;
                let encoded = encoder.finish().map_err(EncodingError::Compress)?;
                trace!(from = data.len(), to = encoded.len(), "gzip encode");
                Ok(Bytes::from(encoded))
            }
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Bytes, EncodingError> {
        match self {
            Encoding::None => Ok(Bytes::copy_from_slice(data)),
            Encoding::Gzip => {
                let mut decoded = Vec::new();
                GzDecoder::new(data)
                    .read_to_end(&mut decoded)
                    .map_err(EncodingError::Decompress)?;
                trace!(from = data.len(), to = decoded.len(), "gzip decode");
                Ok(Bytes::from(decoded))
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token().unwrap_or("none"))
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Encoding::None),
            "gzip" => Ok(Encoding::Gzip),
            other => Err(EncodingError::Unsupported(other.to_owned())),
        }
    }
}
