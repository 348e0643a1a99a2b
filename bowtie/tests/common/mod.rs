#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bowtie_backend::{CacheStore, InvalidateStatus, StoreError, StoreResult};
use bowtie_core::{CacheEntry, CacheKey, HttpRequest, HttpResponse, Transport, TransportError};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeUser {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FakeUsers {
    pub users: Vec<FakeUser>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FakeUserAddress {
    pub address: String,
}

struct Route {
    method: Method,
    path: String,
    response: HttpResponse,
}

/// In-process transport answering from fixed routes and recording requests.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Every send sleeps for `delay` before answering.
    pub fn delayed(delay: Duration) -> Self {
        MockTransport {
            delay: Some(delay),
            ..MockTransport::default()
        }
    }

    pub fn route(&self, method: Method, path: &str, response: HttpResponse) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_owned(),
            response,
        });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|route| route.method == request.method() && route.path == request.url().path())
            .map(|route| route.response.clone())
            .unwrap_or_else(|| HttpResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), ""));
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Transport that always times out.
pub struct TimeoutTransport;

#[async_trait]
impl Transport for TimeoutTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Timeout)
    }
}

/// Store whose every operation fails.
#[derive(Default)]
pub struct BrokenStore {
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::ConnectionError("store is down".into()))
    }

    async fn put(&self, _key: &CacheKey, _entry: CacheEntry) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::ConnectionError("store is down".into()))
    }

    async fn invalidate(&self, _key: &CacheKey) -> StoreResult<InvalidateStatus> {
        Err(StoreError::ConnectionError("store is down".into()))
    }
}

pub fn json(status: StatusCode, body: &str) -> HttpResponse {
    HttpResponse::new(status, HeaderMap::new(), body.to_owned())
}

pub fn json_cached(body: &str, cache_control: &'static str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    HttpResponse::new(StatusCode::OK, headers, body.to_owned())
}
