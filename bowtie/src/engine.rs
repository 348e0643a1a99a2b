//! Invocation engine.
//!
//! Turns a resolved [`RequestTemplate`] plus [`Arguments`] into an HTTP
//! exchange, consulting the cache store around the network call:
//!
//! ```text
//! Resolved ─► CacheCheck ─┬─► CacheHit                                      (terminal)
//!    │                    └─► CacheMiss ─► NetworkCall ─► ResponseEvaluated ─┬─► CacheStore ─► Complete
//!    └──────────────────────────────────► NetworkCall                        └──────────────► Complete
//! ```
//!
//! The cache is only consulted for GET calls whose method declares a cache
//! namespace, and only when a store is configured. Store failures are logged
//! and the call continues as if the cache were empty.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bowtie_backend::{CacheStore, Encoding, EncodingError, InvalidateStatus, SerializerExt};
use bowtie_core::{CacheEntry, CacheKey, HttpRequest, HttpResponse, Transport, derive_key};
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH};
use http::{HeaderValue, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::arguments::Arguments;
use crate::config::AdapterConfig;
use crate::deferred::Deferred;
use crate::error::BowtieError;
use crate::metadata::ReturnShape;
use crate::template::{BoundRequest, RequestTemplate};

/// Steps of a single invocation. A state is never entered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvocationState {
    Resolved,
    CacheCheck,
    CacheHit,
    CacheMiss,
    NetworkCall,
    ResponseEvaluated,
    CacheStore,
    Complete,
}

impl InvocationState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Resolved => "resolved",
            InvocationState::CacheCheck => "cache_check",
            InvocationState::CacheHit => "cache_hit",
            InvocationState::CacheMiss => "cache_miss",
            InvocationState::NetworkCall => "network_call",
            InvocationState::ResponseEvaluated => "response_evaluated",
            InvocationState::CacheStore => "cache_store",
            InvocationState::Complete => "complete",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the response of an exchange came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store without a network call.
    Hit,
    /// Looked up, not found, fetched from the network.
    Miss,
    /// The cache was not consulted.
    Bypass,
}

impl CacheStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// Outcome of one call.
#[derive(Debug)]
pub enum InvocationResult<T> {
    Response(HttpResponse),
    Entity(T),
    Deferred(Deferred<T>),
}

impl<T> InvocationResult<T> {
    pub fn shape(&self) -> ReturnShape {
        match self {
            InvocationResult::Response(_) => ReturnShape::Response,
            InvocationResult::Entity(_) => ReturnShape::Entity,
            InvocationResult::Deferred(_) => ReturnShape::Deferred,
        }
    }
}

/// A response together with how the cache took part in producing it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub response: HttpResponse,
    pub cache_status: CacheStatus,
    /// Key the call maps to, when the method is cacheable at all.
    pub key: Option<CacheKey>,
    /// Final state reached, [`InvocationState::CacheHit`] or
    /// [`InvocationState::Complete`].
    pub state: InvocationState,
}

struct Invocation<'a> {
    method: &'a str,
    state: InvocationState,
}

impl<'a> Invocation<'a> {
    fn new(method: &'a str) -> Self {
        debug!(method, state = %InvocationState::Resolved, "invocation started");
        Invocation {
            method,
            state: InvocationState::Resolved,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        debug_assert!(
            next > self.state,
            "invocation cannot move from {} to {}",
            self.state,
            next
        );
        debug!(method = self.method, from = %self.state, to = %next, "invocation state");
        self.state = next;
    }
}

/// Executes calls for one adapter.
///
/// Cheap to clone; every clone shares the configuration and transport.
#[derive(Clone)]
pub struct Engine {
    base_url: Url,
    config: Arc<AdapterConfig>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Engine {
    pub fn new(base_url: Url, config: Arc<AdapterConfig>, transport: Arc<dyn Transport>) -> Self {
        Engine {
            base_url,
            config,
            transport,
        }
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[inline]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Runs the call and converts the response into the template's
    /// [`ReturnShape`]. A deferred result performs no I/O until awaited.
    pub async fn invoke<T>(
        &self,
        template: Arc<RequestTemplate>,
        args: Arguments,
    ) -> Result<InvocationResult<T>, BowtieError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match template.return_shape() {
            ReturnShape::Response => {
                let exchange = self.exchange(&template, &args).await?;
                Ok(InvocationResult::Response(exchange.response))
            }
            ReturnShape::Entity => Ok(InvocationResult::Entity(
                self.entity(&template, &args).await?,
            )),
            ReturnShape::Deferred => Ok(InvocationResult::Deferred(self.deferred(template, args))),
        }
    }

    /// Runs the call and deserializes a successful response body.
    pub async fn entity<T>(
        &self,
        template: &RequestTemplate,
        args: &Arguments,
    ) -> Result<T, BowtieError>
    where
        T: DeserializeOwned,
    {
        let exchange = self.exchange(template, args).await?;
        self.to_entity(exchange.response)
    }

    /// Wraps the call into a lazy [`Deferred`].
    pub fn deferred<T>(&self, template: Arc<RequestTemplate>, args: Arguments) -> Deferred<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let engine = self.clone();
        Deferred::new(async move { engine.entity(&template, &args).await })
    }

    /// Runs the call and returns the raw response with its cache status.
    pub async fn exchange(
        &self,
        template: &RequestTemplate,
        args: &Arguments,
    ) -> Result<Exchange, BowtieError> {
        let mut invocation = Invocation::new(template.name());
        let bound = template.bind(&self.base_url, args, self.config.serializer())?;
        let key = self.derive(template, &bound)?;
        let request = bound.request;
        let store = self.config.store().filter(|_| key.is_some());

        let mut cache_status = CacheStatus::Bypass;
        if let (Some(store), Some(key)) = (store, key.as_ref()) {
            invocation.advance(InvocationState::CacheCheck);
            if self.config.policy().is_request_cachable(&request) {
                if let Some(entry) = self.lookup(store.as_ref(), key).await {
                    invocation.advance(InvocationState::CacheHit);
                    return Ok(Exchange {
                        response: entry.to_response(),
                        cache_status: CacheStatus::Hit,
                        key: Some(key.clone()),
                        state: invocation.state,
                    });
                }
                cache_status = CacheStatus::Miss;
                invocation.advance(InvocationState::CacheMiss);
            } else {
                debug!(%key, "request forbids caching");
            }
        }

        invocation.advance(InvocationState::NetworkCall);
        let response = self.send(request.clone()).await?;
        invocation.advance(InvocationState::ResponseEvaluated);

        if let (Some(store), Some(key)) = (store, key.as_ref())
            && self.config.policy().is_cachable(&request, &response)
        {
            let freshness = self.config.policy().freshness(&response);
            if freshness == Some(Duration::ZERO) {
                debug!(%key, "response is already stale, not storing");
            } else {
                invocation.advance(InvocationState::CacheStore);
                let entry = CacheEntry::from_response(&response, freshness);
                if let Err(error) = store.put(key, entry).await {
                    warn!(%key, store = store.name(), %error, "cache write failed");
                }
            }
        }

        invocation.advance(InvocationState::Complete);
        Ok(Exchange {
            response,
            cache_status,
            key,
            state: invocation.state,
        })
    }

    /// Key the call would be cached under, `None` for non-GET calls and
    /// methods without a cache namespace.
    pub fn cache_key(
        &self,
        template: &RequestTemplate,
        args: &Arguments,
    ) -> Result<Option<CacheKey>, BowtieError> {
        let bound = template.bind(&self.base_url, args, self.config.serializer())?;
        self.derive(template, &bound)
    }

    /// Removes the entry the call would be served from.
    pub async fn invalidate(
        &self,
        template: &RequestTemplate,
        args: &Arguments,
    ) -> Result<InvalidateStatus, BowtieError> {
        let (Some(store), Some(key)) = (self.config.store(), self.cache_key(template, args)?) else {
            return Ok(InvalidateStatus::Missing);
        };
        let status = store.invalidate(&key).await?;
        debug!(%key, ?status, "cache entry invalidated");
        Ok(status)
    }

    fn derive(
        &self,
        template: &RequestTemplate,
        bound: &BoundRequest,
    ) -> Result<Option<CacheKey>, BowtieError> {
        let Some(namespace) = template.cache_namespace() else {
            return Ok(None);
        };
        if bound.request.method() != Method::GET {
            return Ok(None);
        }
        let discriminating = bound
            .discriminating
            .iter()
            .map(|(name, value)| (name.clone(), value.as_str()));
        Ok(Some(derive_key(
            namespace,
            bound.request.path(),
            discriminating,
        )?))
    }

    async fn lookup(&self, store: &dyn CacheStore, key: &CacheKey) -> Option<CacheEntry> {
        match store.get(key).await {
            Ok(Some(entry)) if entry.is_expired() => {
                debug!(%key, "cached entry expired");
                None
            }
            Ok(entry) => entry,
            Err(error) => {
                warn!(%key, store = store.name(), %error, "cache read failed");
                None
            }
        }
    }

    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, BowtieError> {
        for filter in self.config.filters() {
            filter.on_request(&mut request);
        }

        let encoding = self.config.encoding();
        if let Some(token) = encoding.token() {
            let token = HeaderValue::from_static(token);
            request.headers_mut().insert(ACCEPT_ENCODING, token.clone());
            if !request.body().is_empty() {
                let encoded = encoding.encode(request.body())?;
                request.set_body(encoded);
                request.headers_mut().insert(CONTENT_ENCODING, token);
            }
        }

        debug!(
            method = %request.method(),
            url = %request.url(),
            transport = self.transport.name(),
            "sending request"
        );
        let mut response = self.transport.send(request).await?;
        decode(&mut response)?;

        for filter in self.config.filters().iter().rev() {
            filter.on_response(&mut response);
        }
        Ok(response)
    }

    fn to_entity<T>(&self, response: HttpResponse) -> Result<T, BowtieError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(BowtieError::UnexpectedStatus { status });
        }
        self.config
            .serializer()
            .deserialize(response.body())
            .map_err(BowtieError::Deserialization)
    }
}

/// Undoes `Content-Encoding` so callers and the cache only see plain bodies.
fn decode(response: &mut HttpResponse) -> Result<(), BowtieError> {
    let Some(value) = response.headers().get(CONTENT_ENCODING) else {
        return Ok(());
    };
    let value = value
        .to_str()
        .map_err(|_| EncodingError::Unsupported("non-ascii Content-Encoding".to_owned()))?;
    let encoding = Encoding::from_content_encoding(value)?;
    if encoding != Encoding::None && !response.body().is_empty() {
        let decoded = encoding.decode(response.body())?;
        response.set_body(decoded);
        response.headers_mut().remove(CONTENT_LENGTH);
    }
    response.headers_mut().remove(CONTENT_ENCODING);
    Ok(())
}
