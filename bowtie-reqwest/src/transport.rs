use std::time::Duration;

use async_trait::async_trait;
use bowtie_core::{HttpRequest, HttpResponse, Transport, TransportError};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use tracing::debug;

/// Sends bowtie requests through a reqwest client and its middleware chain.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(client: ClientWithMiddleware) -> Self {
        ReqwestTransport {
            client,
            timeout: None,
        }
    }

    /// Wraps a plain client without middleware.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestTransport::new(ClientBuilder::new(client).build())
    }

    /// Per-request timeout applied on top of the client's own settings.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        ReqwestTransport::from_client(reqwest::Client::new())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (method, url, headers, body) = request.into_parts();
        debug!(%method, %url, "reqwest send");

        let mut builder = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(into_transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|error| {
            if error.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(Box::new(error))
            }
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "reqwest response");

        Ok(HttpResponse::new(status, headers, body))
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

fn into_transport_error(error: reqwest_middleware::Error) -> TransportError {
    match error {
        reqwest_middleware::Error::Reqwest(error) if error.is_timeout() => TransportError::Timeout,
        reqwest_middleware::Error::Reqwest(error) if error.is_builder() => {
            TransportError::InvalidRequest(error.to_string())
        }
        reqwest_middleware::Error::Reqwest(error) => TransportError::Connection(Box::new(error)),
        reqwest_middleware::Error::Middleware(error) => TransportError::Connection(error.into()),
    }
}
