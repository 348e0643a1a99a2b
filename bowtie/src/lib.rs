//! # bowtie
//!
//! Declarative REST client with response caching.
//!
//! Describe each endpoint once with a [`MethodSpec`]: the verb, the path
//! template, how arguments bind into the request, an optional cache namespace
//! and the shape handed back to the caller. A [`RestAdapter`] resolves the
//! specs into immutable [`RequestTemplate`]s and returns a [`Proxy`] that
//! turns calls into HTTP exchanges.
//!
//! GET calls of methods with a cache namespace are served from the configured
//! [`CacheStore`](bowtie_backend::CacheStore) when the
//! [`RestCachingPolicy`](bowtie_core::RestCachingPolicy) allows it; misses are
//! fetched through the [`Transport`](bowtie_core::Transport) and stored when
//! the exchange qualifies.
//!
//! ```no_run
//! # async fn run(transport: impl bowtie_core::Transport + 'static) -> Result<(), bowtie::BowtieError> {
//! use bowtie::{AdapterConfig, Arguments, MethodSpec, Param, RestAdapter};
//! use bowtie_moka::MokaStore;
//!
//! let config = AdapterConfig::builder()
//!     .store(MokaStore::builder().max_entries(10_000).build())
//!     .build();
//! let adapter = RestAdapter::new("http://localhost:9090", config, transport)?;
//! let proxy = adapter.proxy(vec![
//!     MethodSpec::get("getCachedUser", "/user/{username}")
//!         .param(Param::path("username"))
//!         .cache("userCache"),
//! ])?;
//!
//! let user: serde_json::Value = proxy
//!     .call("getCachedUser", Arguments::new().with("username", "bdoe"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod adapter;
mod arguments;
pub mod config;
mod deferred;
pub mod engine;
mod error;
pub mod metadata;
mod proxy;
pub mod settings;
pub mod template;

pub use adapter::{RestAdapter, RestInterface};
pub use arguments::Arguments;
pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use deferred::{Deferred, DeferredHandle};
pub use engine::{CacheStatus, Engine, Exchange, InvocationResult, InvocationState};
pub use error::BowtieError;
pub use metadata::{Binding, MethodSpec, Param, ReturnShape};
pub use proxy::Proxy;
pub use settings::{ClientSettings, Settings};
pub use template::{BoundRequest, RequestTemplate};
