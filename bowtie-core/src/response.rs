//! HTTP response as seen by the invocation engine and the cache.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::directives::CacheControlDirectives;

/// A fully buffered HTTP response.
///
/// Responses are small REST payloads, so the body is always buffered. This
/// keeps cache storage and replay trivial: the bytes returned on a cache hit
/// are exactly the bytes received on the original miss.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        HttpResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Body interpreted as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parsed `Cache-Control` directives, or `None` when the header is absent.
    pub fn cache_control(&self) -> Option<CacheControlDirectives> {
        CacheControlDirectives::from_headers(&self.headers)
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
