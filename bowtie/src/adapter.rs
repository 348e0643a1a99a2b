//! Entry point for building clients.

use std::collections::HashSet;
use std::sync::Arc;

use bowtie_core::Transport;
use tracing::debug;
use url::Url;

use crate::config::AdapterConfig;
use crate::engine::Engine;
use crate::error::BowtieError;
use crate::metadata::MethodSpec;
use crate::proxy::Proxy;
use crate::settings::Settings;
use crate::template::RequestTemplate;

/// A declared REST interface.
///
/// Implementors list their endpoints in [`declare`](Self::declare) and wrap
/// the resulting [`Proxy`] with typed methods.
///
/// ```
/// use bowtie::{Arguments, BowtieError, MethodSpec, Param, Proxy, RestInterface};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// struct UserClient {
///     proxy: Proxy,
/// }
///
/// impl RestInterface for UserClient {
///     fn declare() -> Vec<MethodSpec> {
///         vec![MethodSpec::get("getUser", "/user/{username}").param(Param::path("username"))]
///     }
///
///     fn from_proxy(proxy: Proxy) -> Self {
///         UserClient { proxy }
///     }
/// }
///
/// impl UserClient {
///     async fn get_user(&self, username: &str) -> Result<User, BowtieError> {
///         self.proxy
///             .call("getUser", Arguments::new().with("username", username))
///             .await
///     }
/// }
/// ```
pub trait RestInterface: Sized {
    fn declare() -> Vec<MethodSpec>;

    fn from_proxy(proxy: Proxy) -> Self;
}

/// Creates proxies for declared interfaces against one base URL.
#[derive(Debug, Clone)]
pub struct RestAdapter {
    engine: Engine,
}

impl RestAdapter {
    pub fn new<T>(base_url: &str, config: AdapterConfig, transport: T) -> Result<Self, BowtieError>
    where
        T: Transport + 'static,
    {
        let base_url = Url::parse(base_url)
            .map_err(|e| BowtieError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(RestAdapter::from_parts(base_url, config, Arc::new(transport)))
    }

    /// Creates an adapter from the client profile `name` in `settings`.
    ///
    /// Encoding and policy set in the profile replace the ones in `config`.
    pub fn named<T>(
        name: &str,
        settings: &Settings,
        config: AdapterConfig,
        transport: T,
    ) -> Result<Self, BowtieError>
    where
        T: Transport + 'static,
    {
        let client = settings.client(name)?;
        let mut config = config;
        if let Some(encoding) = client.encoding() {
            config = config.with_encoding(encoding);
        }
        if let Some(mode) = client.policy() {
            config = config.with_policy_mode(mode);
        }
        debug!(client = name, "adapter created from settings");
        Ok(RestAdapter::from_parts(
            client.base_url()?,
            config,
            Arc::new(transport),
        ))
    }

    pub fn from_parts(base_url: Url, config: AdapterConfig, transport: Arc<dyn Transport>) -> Self {
        RestAdapter {
            engine: Engine::new(base_url, Arc::new(config), transport),
        }
    }

    /// Resolves every method of `I` and wraps the proxy.
    ///
    /// Fails with [`BowtieError::UnsupportedMethodSignature`] on the first
    /// method whose metadata cannot be resolved.
    pub fn create<I: RestInterface>(&self) -> Result<I, BowtieError> {
        Ok(I::from_proxy(self.proxy(I::declare())?))
    }

    /// Resolves `specs` into a proxy without a typed wrapper.
    pub fn proxy(&self, specs: Vec<MethodSpec>) -> Result<Proxy, BowtieError> {
        let mut names = HashSet::new();
        let mut templates = Vec::with_capacity(specs.len());
        for spec in &specs {
            if !names.insert(spec.name()) {
                return Err(BowtieError::unsupported(
                    spec.name(),
                    "method is declared twice",
                ));
            }
            templates.push(RequestTemplate::resolve(spec)?);
        }
        debug!(
            base_url = %self.engine.base_url(),
            methods = templates.len(),
            "proxy created"
        );
        Ok(Proxy::new(self.engine.clone(), templates))
    }

    #[inline]
    pub fn config(&self) -> &AdapterConfig {
        self.engine.config()
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        self.engine.base_url()
    }
}
