//! Error types for cache store operations.

use thiserror::Error;

/// Error type for cache store operations.
///
/// The invocation engine treats every variant as non-fatal: a failed read
/// falls through to a live request and a failed write is logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// The store refused the entry, e.g. because it exceeds a size limit.
    #[error("entry rejected by store: {0}")]
    Rejected(String),
}
