//! Bound HTTP request handed to the transport.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, header::HeaderName};
use url::Url;

use crate::directives::CacheControlDirectives;

/// A fully bound HTTP request.
///
/// Produced by the invocation engine after every argument of a declared
/// method has been substituted into its request template. The `path` is kept
/// separately from the `url`, relative to the base URL and percent-encoded
/// exactly as on the wire, because cache keys are derived from it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    url: Url,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: Url, path: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Replaces the header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a single header value, keeping existing values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Encoded bound path without base, query or fragment, e.g. `/user/j%20doe`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
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

    /// Query pairs in the order they appear in the URL.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect()
    }

    /// Parsed `Cache-Control` directives, or `None` when the header is absent.
    pub fn cache_control(&self) -> Option<CacheControlDirectives> {
        CacheControlDirectives::from_headers(&self.headers)
    }

    /// Decomposes the request into its parts.
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Bytes) {
        (self.method, self.url, self.headers, self.body)
    }
}
