use bowtie_backend::{EncodingError, SerializerError, StoreError};
use bowtie_core::{KeyError, TransportError};
use http::StatusCode;
use smol_str::SmolStr;
use thiserror::Error;

/// Errors surfaced by adapters, proxies and deferred calls.
///
/// Cache store failures during an invocation never show up here: they are
/// logged and the call falls back to the network.
#[derive(Debug, Error)]
pub enum BowtieError {
    /// A declared method cannot be turned into a request template.
    ///
    /// Raised while the proxy is created, never at call time.
    #[error("unsupported signature for `{method}`: {reason}")]
    UnsupportedMethodSignature { method: SmolStr, reason: String },

    /// The proxy has no method with this name.
    #[error("unknown method `{0}`")]
    UnknownMethod(SmolStr),

    /// A required parameter was not supplied.
    #[error("missing argument `{argument}` for `{method}`")]
    MissingArgument { method: SmolStr, argument: SmolStr },

    /// A supplied argument cannot be placed into the request.
    #[error("invalid argument `{argument}` for `{method}`: {reason}")]
    InvalidArgument {
        method: SmolStr,
        argument: SmolStr,
        reason: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] SerializerError),

    #[error("failed to deserialize response body: {0}")]
    Deserialization(#[source] SerializerError),

    /// An entity was requested but the origin answered with a non-success status.
    #[error("unexpected response status {status}")]
    UnexpectedStatus { status: StatusCode },

    #[error(transparent)]
    InvalidKeyInput(#[from] KeyError),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Explicit store operations such as invalidation.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("settings error: {0}")]
    Settings(String),

    /// A spawned deferred call was cancelled before completing.
    #[error("deferred call was cancelled")]
    Cancelled,
}

impl BowtieError {
    pub(crate) fn unsupported(method: &str, reason: impl Into<String>) -> Self {
        BowtieError::UnsupportedMethodSignature {
            method: SmolStr::new(method),
            reason: reason.into(),
        }
    }
}
