use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bowtie_backend::InvalidateStatus;
use bowtie_core::{CacheKey, HttpResponse};
use serde::de::DeserializeOwned;
use smol_str::SmolStr;

use crate::arguments::Arguments;
use crate::deferred::Deferred;
use crate::engine::{Engine, Exchange, InvocationResult};
use crate::error::BowtieError;
use crate::template::RequestTemplate;

/// Registry of resolved templates for one declared interface, dispatching
/// calls by method name.
///
/// Cloning is cheap and every clone shares the same templates, configuration
/// and transport.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    engine: Engine,
    templates: HashMap<SmolStr, Arc<RequestTemplate>>,
}

impl Proxy {
    pub(crate) fn new(engine: Engine, templates: Vec<RequestTemplate>) -> Self {
        let templates = templates
            .into_iter()
            .map(|template| (SmolStr::new(template.name()), Arc::new(template)))
            .collect();
        Proxy {
            inner: Arc::new(ProxyInner { engine, templates }),
        }
    }

    /// Calls `method` and returns its declared [`ReturnShape`](crate::ReturnShape).
    pub async fn invoke<T>(
        &self,
        method: &str,
        args: Arguments,
    ) -> Result<InvocationResult<T>, BowtieError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let template = self.template(method)?;
        self.inner.engine.invoke(template, args).await
    }

    /// Calls `method` and deserializes the response body.
    pub async fn call<T>(&self, method: &str, args: Arguments) -> Result<T, BowtieError>
    where
        T: DeserializeOwned,
    {
        let template = self.template(method)?;
        self.inner.engine.entity(&template, &args).await
    }

    /// Calls `method` and returns the raw response.
    pub async fn response(
        &self,
        method: &str,
        args: Arguments,
    ) -> Result<HttpResponse, BowtieError> {
        Ok(self.exchange(method, args).await?.response)
    }

    /// Prepares a lazy call of `method`. Nothing is sent until it is awaited.
    pub fn deferred<T>(&self, method: &str, args: Arguments) -> Result<Deferred<T>, BowtieError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let template = self.template(method)?;
        Ok(self.inner.engine.deferred(template, args))
    }

    /// Calls `method` and reports whether the cache answered.
    pub async fn exchange(&self, method: &str, args: Arguments) -> Result<Exchange, BowtieError> {
        let template = self.template(method)?;
        self.inner.engine.exchange(&template, &args).await
    }

    /// Key a call of `method` with `args` is cached under, if any.
    pub fn cache_key(
        &self,
        method: &str,
        args: &Arguments,
    ) -> Result<Option<CacheKey>, BowtieError> {
        let template = self.template(method)?;
        self.inner.engine.cache_key(&template, args)
    }

    /// Evicts the entry a call of `method` with `args` would be served from.
    pub async fn invalidate(
        &self,
        method: &str,
        args: Arguments,
    ) -> Result<InvalidateStatus, BowtieError> {
        let template = self.template(method)?;
        self.inner.engine.invalidate(&template, &args).await
    }

    pub fn template(&self, method: &str) -> Result<Arc<RequestTemplate>, BowtieError> {
        self.inner
            .templates
            .get(method)
            .cloned()
            .ok_or_else(|| BowtieError::UnknownMethod(SmolStr::new(method)))
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.inner.templates.keys().map(SmolStr::as_str)
    }

    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.inner.engine
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("engine", &self.inner.engine)
            .field("methods", &self.inner.templates.len())
            .finish()
    }
}
