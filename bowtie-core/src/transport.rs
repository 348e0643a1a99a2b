//! Transport and filter capabilities.
//!
//! The invocation engine never talks to the network itself. It hands a bound
//! [`HttpRequest`] to a [`Transport`] and gets an [`HttpResponse`] back.
//! Connection pooling, TLS and retries belong to the transport.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use bowtie_core::{HttpRequest, HttpResponse, Transport, TransportError};
//! use http::{HeaderMap, StatusCode};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Transport for Echo {
//!     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
//!         Ok(HttpResponse::new(StatusCode::OK, HeaderMap::new(), request.body().clone()))
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Failure to complete an HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be converted for the underlying client.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network interaction error.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// The exchange did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(Box<dyn std::error::Error + Send + Sync>),
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Name used in log records.
    fn name(&self) -> &str {
        "transport"
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Interceptor around every exchange.
///
/// Filters are applied in declaration order to outgoing requests and in
/// reverse order to incoming responses. Cache hits do not pass through
/// response filters.
pub trait Filter: Send + Sync {
    fn on_request(&self, _request: &mut HttpRequest) {}

    fn on_response(&self, _response: &mut HttpResponse) {}
}

impl<F> Filter for Arc<F>
where
    F: Filter + ?Sized,
{
    fn on_request(&self, request: &mut HttpRequest) {
        (**self).on_request(request)
    }

    fn on_response(&self, response: &mut HttpResponse) {
        (**self).on_response(response)
    }
}
