//! Named client profiles loaded from YAML.
//!
//! ```yaml
//! clients:
//!   sample-client:
//!     base_url: http://localhost:9090
//!     encoding: gzip
//!     policy: strict
//! ```
//!
//! A profile only carries what differs per deployment. Serializer, store and
//! filters stay in code on the [`AdapterConfig`](crate::AdapterConfig).

use std::collections::BTreeMap;
use std::path::Path;

use bowtie_backend::Encoding;
use bowtie_core::PolicyMode;
use serde::Deserialize;
use url::Url;

use crate::error::BowtieError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    clients: BTreeMap<String, ClientSettings>,
}

/// One named client profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    base_url: String,
    #[serde(default)]
    encoding: Option<Encoding>,
    #[serde(default)]
    policy: Option<PolicyMode>,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Settings, BowtieError> {
        serde_saphyr::from_str(yaml).map_err(|e| BowtieError::Settings(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Settings, BowtieError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| BowtieError::Settings(format!("{}: {e}", path.display())))?;
        Settings::from_yaml(&yaml)
    }

    pub fn client(&self, name: &str) -> Result<&ClientSettings, BowtieError> {
        self.clients
            .get(name)
            .ok_or_else(|| BowtieError::Settings(format!("no client named `{name}`")))
    }

    pub fn client_names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientSettings {
            base_url: base_url.into(),
            encoding: None,
            policy: None,
        }
    }

    pub fn base_url(&self) -> Result<Url, BowtieError> {
        Url::parse(&self.base_url)
            .map_err(|e| BowtieError::InvalidUrl(format!("{}: {e}", self.base_url)))
    }

    #[inline]
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    #[inline]
    pub fn policy(&self) -> Option<PolicyMode> {
        self.policy
    }
}
