//! Actual arguments of one call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smol_str::SmolStr;

type ErasedBody = Arc<dyn erased_serde::Serialize + Send + Sync>;

/// Named argument values for a single invocation.
///
/// Values are rendered with [`ToString`] when they are bound; the body is kept
/// as-is and serialized by the adapter's serializer.
///
/// ```
/// use bowtie::Arguments;
///
/// let args = Arguments::new()
///     .with("username", "bbelcher")
///     .with_optional("bySystem", Some("email"))
///     .with("session", "020835c7-cf7e-4ba5-b117-4402e5d79079");
/// assert_eq!(args.get("username"), Some("bbelcher"));
/// ```
#[derive(Clone, Default)]
pub struct Arguments {
    values: HashMap<SmolStr, String>,
    body: Option<ErasedBody>,
}

impl Arguments {
    pub fn new() -> Self {
        Arguments::default()
    }

    pub fn with(mut self, name: impl Into<SmolStr>, value: impl ToString) -> Self {
        self.values.insert(name.into(), value.to_string());
        self
    }

    /// Binds `value` when present. An absent value leaves the parameter unset,
    /// which is only accepted for optional parameters.
    pub fn with_optional<V: ToString>(self, name: impl Into<SmolStr>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Sets the value serialized as the request body.
    pub fn with_body<T>(mut self, body: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub(crate) fn body(&self) -> Option<&(dyn erased_serde::Serialize + Send + Sync)> {
        self.body.as_deref()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("values", &self.values)
            .field("body", &self.body.as_ref().map(|_| "..."))
            .finish()
    }
}
