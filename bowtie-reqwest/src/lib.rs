//! [`Transport`](bowtie_core::Transport) for bowtie on top of
//! [reqwest](https://docs.rs/reqwest) and
//! [reqwest-middleware](https://docs.rs/reqwest-middleware).
//!
//! Connection pooling, TLS, proxies and retries are configured on the reqwest
//! client; bowtie only hands it fully bound requests.
//!
//! ```no_run
//! use bowtie::{AdapterConfig, RestAdapter};
//! use bowtie_reqwest::ReqwestTransport;
//! use reqwest_middleware::ClientBuilder;
//!
//! let client = ClientBuilder::new(reqwest::Client::new()).build();
//! let adapter = RestAdapter::new(
//!     "http://localhost:9090",
//!     AdapterConfig::default(),
//!     ReqwestTransport::new(client),
//! )
//! .unwrap();
//! ```

mod transport;

pub use transport::ReqwestTransport;
