//! Method metadata.
//!
//! A [`MethodSpec`] describes one endpoint of a REST interface: the verb, the
//! path template, how each argument is bound into the request, the cache
//! namespace and the shape of the value handed back to the caller. Specs are
//! plain data; they are validated when the adapter resolves them into
//! [`RequestTemplate`](crate::RequestTemplate)s.
//!
//! ```
//! use bowtie::{MethodSpec, Param, ReturnShape};
//!
//! let spec = MethodSpec::get("getCachedUser", "/user/{username}")
//!     .header("X-SESSION-ID", "55892d6d-77df-4617-b728-6f5de97f5752")
//!     .param(Param::path("username"))
//!     .cache("userCache")
//!     .returns(ReturnShape::Entity);
//! assert_eq!(spec.name(), "getCachedUser");
//! ```

use http::Method;
use smol_str::SmolStr;

/// Where an argument goes in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Substituted into the `{name}` placeholder of the path template.
    Path,
    /// Appended as a query parameter.
    Query { name: SmolStr },
    /// Sent as a request header. When `key_part` is set the value also
    /// discriminates the cache key.
    Header { name: SmolStr, key_part: bool },
    /// Sent as a cookie.
    Cookie { name: SmolStr },
    /// Serialized as the request body.
    Body,
}

/// One declared parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: SmolStr,
    binding: Binding,
    required: bool,
}

impl Param {
    pub fn path(name: impl Into<SmolStr>) -> Self {
        Param::new(name, Binding::Path)
    }

    /// Query parameter whose wire name equals the parameter name.
    pub fn query(name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        Param::new(name.clone(), Binding::Query { name })
    }

    pub fn header(name: impl Into<SmolStr>, header: impl Into<SmolStr>) -> Self {
        Param::new(
            name,
            Binding::Header {
                name: header.into(),
                key_part: false,
            },
        )
    }

    pub fn cookie(name: impl Into<SmolStr>, cookie: impl Into<SmolStr>) -> Self {
        Param::new(
            name,
            Binding::Cookie {
                name: cookie.into(),
            },
        )
    }

    pub fn body(name: impl Into<SmolStr>) -> Self {
        Param::new(name, Binding::Body)
    }

    fn new(name: impl Into<SmolStr>, binding: Binding) -> Self {
        Param {
            name: name.into(),
            binding,
            required: true,
        }
    }

    /// Allows the caller to omit the argument. Omitted query parameters,
    /// headers and cookies are left out of the request.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Renames the query parameter, header or cookie on the wire.
    pub fn wire_name(mut self, wire: impl Into<SmolStr>) -> Self {
        match &mut self.binding {
            Binding::Query { name } | Binding::Header { name, .. } | Binding::Cookie { name } => {
                *name = wire.into();
            }
            Binding::Path | Binding::Body => {}
        }
        self
    }

    /// Makes a header parameter part of the cache key.
    pub fn key_part(mut self) -> Self {
        if let Binding::Header { key_part, .. } = &mut self.binding {
            *key_part = true;
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// What a call hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// The raw [`HttpResponse`](bowtie_core::HttpResponse).
    Response,
    /// The response body deserialized into the caller's type.
    #[default]
    Entity,
    /// A lazy [`Deferred`](crate::Deferred) that performs the call when awaited.
    Deferred,
}

/// Declaration of one REST endpoint.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub(crate) name: SmolStr,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(SmolStr, String)>,
    pub(crate) cookies: Vec<(SmolStr, String)>,
    pub(crate) params: Vec<Param>,
    pub(crate) cache: Option<SmolStr>,
    pub(crate) returns: ReturnShape,
}

impl MethodSpec {
    pub fn new(method: Method, name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        MethodSpec {
            name: name.into(),
            method,
            path: path.into(),
            headers: Vec::new(),
            cookies: Vec::new(),
            params: Vec::new(),
            cache: None,
            returns: ReturnShape::default(),
        }
    }

    pub fn get(name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        MethodSpec::new(Method::GET, name, path)
    }

    pub fn post(name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        MethodSpec::new(Method::POST, name, path)
    }

    pub fn put(name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        MethodSpec::new(Method::PUT, name, path)
    }

    pub fn delete(name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        MethodSpec::new(Method::DELETE, name, path)
    }

    /// Adds a header sent with every call.
    pub fn header(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a cookie sent with every call.
    pub fn cookie(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Caches GET responses of this method under `namespace`.
    pub fn cache(mut self, namespace: impl Into<SmolStr>) -> Self {
        self.cache = Some(namespace.into());
        self
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.returns = shape;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[inline]
    pub fn cache_namespace(&self) -> Option<&str> {
        self.cache.as_deref()
    }

    #[inline]
    pub fn return_shape(&self) -> ReturnShape {
        self.returns
    }
}
