//! Cacheability policy for REST requests and responses.
//!
//! [`RestCachingPolicy`] answers three questions:
//!
//! - may a response to this request be served from or stored in the cache
//!   ([`is_request_cachable`](RestCachingPolicy::is_request_cachable))
//! - may this response be stored
//!   ([`is_response_cachable`](RestCachingPolicy::is_response_cachable))
//! - both at once, for a concrete exchange
//!   ([`is_cachable`](RestCachingPolicy::is_cachable))
//!
//! ## Modes
//!
//! [`PolicyMode::Strict`] is the default. A response is cacheable only when
//! its status is one of [`CACHEABLE_STATUSES`] and it carries a
//! `Cache-Control` header with an acceptable directive and no unacceptable
//! one.
//!
//! [`PolicyMode::Lenient`] reproduces the older combined policy. It caches by
//! default unless the status is one of [`CACHEABLE_STATUSES`] (the status test
//! is inverted relative to strict mode), and lets headers override that
//! default: an unacceptable directive always vetoes, an acceptable directive
//! always allows, and an `Expires` header allows.
//!
//! The request side is identical in both modes: only a GET request carrying
//! an unacceptable directive is rejected. The combined check additionally
//! rejects every non-GET request.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::EXPIRES;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Statuses a response may carry to be considered for caching.
pub const CACHEABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::MULTIPLE_CHOICES,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::GONE,
];

/// How response status and headers combine into a caching decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Cacheable status, `Cache-Control` present, acceptable and not unacceptable.
    #[default]
    Strict,
    /// Cacheable unless vetoed, with the inverted status default.
    Lenient,
}

/// Pure decision logic over request and response metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestCachingPolicy {
    mode: PolicyMode,
}

impl RestCachingPolicy {
    pub const fn new(mode: PolicyMode) -> Self {
        RestCachingPolicy { mode }
    }

    pub const fn strict() -> Self {
        Self::new(PolicyMode::Strict)
    }

    pub const fn lenient() -> Self {
        Self::new(PolicyMode::Lenient)
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Request-side check.
    ///
    /// Only GET requests can be rejected here; every other verb passes and
    /// must be filtered by the caller if mutating calls should bypass the cache.
    pub fn is_request_cachable(&self, request: &HttpRequest) -> bool {
        debug!(method = %request.method(), "checking request cacheability");
        if request.method() != Method::GET {
            return true;
        }
        let cachable = match request.cache_control() {
            Some(directives) if directives.has_unacceptable() => {
                debug!(%directives, "unacceptable Cache-Control in request");
                false
            }
            _ => true,
        };
        debug!(cachable, "request cacheability decided");
        cachable
    }

    /// Response-side check according to the configured [`PolicyMode`].
    pub fn is_response_cachable(&self, response: &HttpResponse) -> bool {
        let cachable = match self.mode {
            PolicyMode::Strict => strict_response_check(response),
            PolicyMode::Lenient => lenient_response_check(response),
        };
        debug!(
            status = response.status().as_u16(),
            mode = ?self.mode,
            cachable,
            "response cacheability decided"
        );
        cachable
    }

    /// Combined check for a concrete exchange. Non-GET requests are never cacheable.
    pub fn is_cachable(&self, request: &HttpRequest, response: &HttpResponse) -> bool {
        if request.method() != Method::GET {
            debug!(method = %request.method(), "non-GET exchange is not cacheable");
            return false;
        }
        self.is_request_cachable(request) && self.is_response_cachable(response)
    }

    /// How long a stored response stays fresh.
    ///
    /// `max-age` wins over `Expires`. An `Expires` value in the past, or one
    /// that cannot be parsed, means the response is already stale. `None`
    /// means the origin gave no lifetime and the store decides.
    pub fn freshness(&self, response: &HttpResponse) -> Option<Duration> {
        if let Some(max_age) = response.cache_control().and_then(|d| d.max_age()) {
            return Some(max_age);
        }
        let expires = response.headers().get(EXPIRES)?;
        let lifetime = expires
            .to_str()
            .ok()
            .and_then(|value| DateTime::parse_from_rfc2822(value.trim()).ok())
            .map(|at| at.with_timezone(&Utc) - Utc::now())
            .and_then(|delta| delta.to_std().ok())
            .unwrap_or(Duration::ZERO);
        Some(lifetime)
    }
}

fn strict_response_check(response: &HttpResponse) -> bool {
    if !CACHEABLE_STATUSES.contains(&response.status()) {
        return false;
    }
    let Some(directives) = response.cache_control() else {
        debug!("no Cache-Control header in response");
        return false;
    };
    if directives.has_unacceptable() {
        debug!(%directives, "unacceptable Cache-Control in response");
        return false;
    }
    directives.has_acceptable()
}

fn lenient_response_check(response: &HttpResponse) -> bool {
    if let Some(directives) = response.cache_control() {
        if directives.has_unacceptable() {
            debug!(%directives, "unacceptable Cache-Control in response");
            return false;
        }
        if directives.has_acceptable() {
            return true;
        }
    }
    if has_expires(response.headers()) {
        return true;
    }
    !CACHEABLE_STATUSES.contains(&response.status())
}

fn has_expires(headers: &HeaderMap) -> bool {
    headers.contains_key(EXPIRES)
}
