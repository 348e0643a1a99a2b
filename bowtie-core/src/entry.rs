//! Stored response snapshot.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};

use crate::response::HttpResponse;

/// A cached response: decoded body bytes plus the status and headers needed
/// to replay it.
///
/// Entries are owned by the cache store and are never mutated; refreshing a
/// key replaces the whole entry.
///
/// ```
/// use bowtie_core::{CacheEntry, HttpResponse};
/// use http::{HeaderMap, StatusCode};
///
/// let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), r#"{"name":"Bob Doe"}"#);
/// let entry = CacheEntry::from_response(&response, None);
/// assert_eq!(entry.status(), StatusCode::OK);
/// assert_eq!(entry.to_response(), response);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    body: Bytes,
    status: StatusCode,
    headers: HeaderMap,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        CacheEntry {
            body: body.into(),
            status,
            headers,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Snapshots `response`, expiring after `freshness` when given.
    pub fn from_response(response: &HttpResponse, freshness: Option<Duration>) -> Self {
        let entry = CacheEntry::new(
            response.status(),
            response.headers().clone(),
            response.body().clone(),
        );
        match freshness {
            Some(freshness) => entry.expires_in(freshness),
            None => entry,
        }
    }

    /// Sets the expiry relative to the creation time.
    pub fn expires_in(mut self, freshness: Duration) -> Self {
        let delta = chrono::Duration::from_std(freshness).unwrap_or(chrono::Duration::MAX);
        self.expires_at = self.created_at.checked_add_signed(delta);
        self
    }

    /// Cached response bytes, identical to what the origin sent after decoding.
    #[inline]
    pub fn cached_bytes(&self) -> &Bytes {
        &self.body
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
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Remaining lifetime, `None` when the entry never expires.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at.map(|expires_at| {
            (expires_at - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Rebuilds the response this entry was created from.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::new(self.status, self.headers.clone(), self.body.clone())
    }
}
