//! Request templates resolved from method metadata.

use std::collections::HashSet;

use bowtie_backend::{MessageSerializer, SerializerExt};
use bowtie_core::HttpRequest;
use http::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderName};
use http::{HeaderMap, HeaderValue, Method};
use smol_str::SmolStr;
use url::Url;

use crate::arguments::Arguments;
use crate::error::BowtieError;
use crate::metadata::{Binding, MethodSpec, ReturnShape};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder(SmolStr),
}

#[derive(Debug, Clone)]
enum Slot {
    Path,
    Query(SmolStr),
    Header { name: HeaderName, key_part: bool },
    Cookie(SmolStr),
    Body,
}

#[derive(Debug, Clone)]
struct ResolvedParam {
    name: SmolStr,
    slot: Slot,
    required: bool,
}

/// A request bound to concrete arguments.
#[derive(Debug, Clone)]
pub struct BoundRequest {
    pub request: HttpRequest,
    /// Query parameters and key-part headers, in declaration order.
    pub discriminating: Vec<(SmolStr, String)>,
}

/// Immutable description of how to build the request for one method.
///
/// Templates are resolved once per method when a proxy is created. Anything
/// ambiguous in the metadata is rejected there with
/// [`BowtieError::UnsupportedMethodSignature`], so binding at call time can
/// only fail on the arguments themselves.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    name: SmolStr,
    method: Method,
    path: String,
    segments: Vec<Vec<Piece>>,
    headers: HeaderMap,
    cookies: Vec<(SmolStr, String)>,
    params: Vec<ResolvedParam>,
    cache: Option<SmolStr>,
    returns: ReturnShape,
}

impl RequestTemplate {
    pub fn resolve(spec: &MethodSpec) -> Result<RequestTemplate, BowtieError> {
        let name = spec.name.as_str();
        let unsupported = |reason: String| BowtieError::unsupported(name, reason);

        if spec.path.is_empty() {
            return Err(unsupported("path template is empty".to_owned()));
        }
        if spec.path.contains(['?', '#']) {
            return Err(unsupported(format!(
                "path template `{}` must not contain `?` or `#`",
                spec.path
            )));
        }
        let Some(relative) = spec.path.strip_prefix('/') else {
            return Err(unsupported(format!(
                "path template `{}` must start with `/`",
                spec.path
            )));
        };
        let segments = relative
            .split('/')
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| unsupported(format!("path template `{}`: {reason}", spec.path)))?;

        let placeholders: Vec<&SmolStr> = segments
            .iter()
            .flatten()
            .filter_map(|piece| match piece {
                Piece::Placeholder(name) => Some(name),
                Piece::Literal(_) => None,
            })
            .collect();

        let mut seen = HashSet::new();
        let mut has_body = false;
        let mut params = Vec::with_capacity(spec.params.len());
        for param in &spec.params {
            if !seen.insert(param.name()) {
                return Err(unsupported(format!(
                    "parameter `{}` is declared twice",
                    param.name()
                )));
            }
            let slot = match param.binding() {
                Binding::Path => {
                    if !param.is_required() {
                        return Err(unsupported(format!(
                            "path parameter `{}` cannot be optional",
                            param.name()
                        )));
                    }
                    if !placeholders.iter().any(|p| p.as_str() == param.name()) {
                        return Err(unsupported(format!(
                            "path parameter `{}` has no placeholder in `{}`",
                            param.name(),
                            spec.path
                        )));
                    }
                    Slot::Path
                }
                Binding::Query { name } => Slot::Query(name.clone()),
                Binding::Header { name, key_part } => Slot::Header {
                    name: HeaderName::from_bytes(name.as_bytes())
                        .map_err(|_| unsupported(format!("invalid header name `{name}`")))?,
                    key_part: *key_part,
                },
                Binding::Cookie { name } => {
                    validate_cookie_name(name).map_err(unsupported)?;
                    Slot::Cookie(name.clone())
                }
                Binding::Body => {
                    if has_body {
                        return Err(unsupported(format!(
                            "parameter `{}` is a second body parameter",
                            param.name()
                        )));
                    }
                    has_body = true;
                    Slot::Body
                }
            };
            params.push(ResolvedParam {
                name: SmolStr::new(param.name()),
                slot,
                required: param.is_required(),
            });
        }

        for placeholder in &placeholders {
            let bound = params
                .iter()
                .any(|p| matches!(p.slot, Slot::Path) && p.name == **placeholder);
            if !bound {
                return Err(unsupported(format!(
                    "placeholder `{{{placeholder}}}` has no path parameter"
                )));
            }
        }

        let mut headers = HeaderMap::new();
        for (header, value) in &spec.headers {
            let header_name = HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| unsupported(format!("invalid header name `{header}`")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| unsupported(format!("invalid value for header `{header}`")))?;
            headers.append(header_name, header_value);
        }

        for (cookie, value) in &spec.cookies {
            validate_cookie_name(cookie).map_err(unsupported)?;
            validate_cookie_value(value)
                .map_err(|reason| unsupported(format!("cookie `{cookie}`: {reason}")))?;
        }

        if let Some(namespace) = &spec.cache
            && namespace.trim().is_empty()
        {
            return Err(unsupported("cache namespace is empty".to_owned()));
        }

        Ok(RequestTemplate {
            name: spec.name.clone(),
            method: spec.method.clone(),
            path: spec.path.clone(),
            segments,
            headers,
            cookies: spec.cookies.clone(),
            params,
            cache: spec.cache.clone(),
            returns: spec.returns,
        })
    }

    /// Binds `args` into a request against `base`.
    ///
    /// The body, if any, is serialized with `serializer` and the serializer's
    /// content type is sent as `Content-Type` and `Accept` unless the template
    /// sets them.
    pub fn bind(
        &self,
        base: &Url,
        args: &Arguments,
        serializer: &dyn MessageSerializer,
    ) -> Result<BoundRequest, BowtieError> {
        for param in &self.params {
            let supplied = match param.slot {
                Slot::Body => args.body().is_some(),
                _ => args.get(&param.name).is_some(),
            };
            if param.required && !supplied {
                return Err(BowtieError::MissingArgument {
                    method: self.name.clone(),
                    argument: param.name.clone(),
                });
            }
        }

        let mut bound_segments = Vec::with_capacity(self.segments.len());
        for pieces in &self.segments {
            let mut segment = String::new();
            for piece in pieces {
                match piece {
                    Piece::Literal(text) => segment.push_str(text),
                    Piece::Placeholder(name) => {
                        segment.push_str(args.get(name).unwrap_or_default())
                    }
                }
            }
            bound_segments.push(segment);
        }

        let mut url = base.clone();
        append_segments(&mut url, &bound_segments)?;

        // Keyed on the encoded path so that keys match wire URLs one to one.
        let mut relative = base.clone();
        relative.set_path("");
        append_segments(&mut relative, &bound_segments)?;
        let path = relative.path().to_owned();

        let mut headers = self.headers.clone();
        let mut query = Vec::new();
        let mut cookies: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let mut discriminating = Vec::new();

        for param in &self.params {
            let Some(value) = args.get(&param.name) else {
                continue;
            };
            match &param.slot {
                Slot::Path | Slot::Body => {}
                Slot::Query(name) => {
                    query.push((name.clone(), value.to_owned()));
                    discriminating.push((name.clone(), value.to_owned()));
                }
                Slot::Header { name, key_part } => {
                    let header_value = HeaderValue::from_str(value)
                        .map_err(|_| self.invalid(param, "not a valid header value"))?;
                    headers.insert(name.clone(), header_value);
                    if *key_part {
                        discriminating.push((SmolStr::new(name.as_str()), value.to_owned()));
                    }
                }
                Slot::Cookie(name) => {
                    validate_cookie_value(value).map_err(|reason| self.invalid(param, reason))?;
                    cookies.push(format!("{name}={value}"));
                }
            }
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &query {
                pairs.append_pair(name, value);
            }
        }

        if !cookies.is_empty() {
            let cookie = HeaderValue::from_str(&cookies.join("; "))
                .map_err(|_| BowtieError::InvalidArgument {
                    method: self.name.clone(),
                    argument: SmolStr::new_static("cookie"),
                    reason: "cookies do not form a valid header".to_owned(),
                })?;
            headers.insert(COOKIE, cookie);
        }

        let content_type = HeaderValue::from_static(serializer.content_type());
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, content_type.clone());
        }

        let mut request = HttpRequest::new(self.method.clone(), url, path);
        match (self.body_param(), args.body()) {
            (Some(_), Some(body)) => {
                let bytes = serializer
                    .serialize(&body)
                    .map_err(BowtieError::Serialization)?;
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, content_type);
                }
                request.set_body(bytes);
            }
            (None, Some(_)) => {
                return Err(BowtieError::InvalidArgument {
                    method: self.name.clone(),
                    argument: SmolStr::new_static("body"),
                    reason: "method declares no body parameter".to_owned(),
                });
            }
            _ => {}
        }

        Ok(BoundRequest {
            request: request.with_headers(headers),
            discriminating,
        })
    }

    fn body_param(&self) -> Option<&ResolvedParam> {
        self.params.iter().find(|p| matches!(p.slot, Slot::Body))
    }

    fn invalid(&self, param: &ResolvedParam, reason: &str) -> BowtieError {
        BowtieError::InvalidArgument {
            method: self.name.clone(),
            argument: param.name.clone(),
            reason: reason.to_owned(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path pattern as declared, e.g. `/user/{username}`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
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

fn parse_segment(segment: &str) -> Result<Vec<Piece>, String> {
    let mut pieces = Vec::new();
    let mut rest = segment;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err("unbalanced `}`".to_owned());
        }
        if open > 0 {
            pieces.push(Piece::Literal(rest[..open].to_owned()));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| "unclosed `{`".to_owned())?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err(format!("invalid placeholder `{{{name}}}`"));
        }
        pieces.push(Piece::Placeholder(SmolStr::new(name)));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(Piece::Literal(rest.to_owned()));
    }
    Ok(pieces)
}

fn validate_cookie_name(name: &str) -> Result<(), String> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
    if valid {
        Ok(())
    } else {
        Err(format!("invalid cookie name `{name}`"))
    }
}

fn validate_cookie_value(value: &str) -> Result<(), &'static str> {
    if value
        .bytes()
        .all(|b| b.is_ascii_graphic() && b != b';' && b != b',' && b != b'"' && b != b'\\')
    {
        Ok(())
    } else {
        Err("not a valid cookie value")
    }
}

/// Appends percent-encoded path segments to `url`.
fn append_segments(url: &mut Url, segments: &[String]) -> Result<(), BowtieError> {
    if url.cannot_be_a_base() {
        return Err(BowtieError::InvalidUrl(format!("`{url}` cannot be a base")));
    }
    if let Ok(mut url_segments) = url.path_segments_mut() {
        url_segments.pop_if_empty();
        url_segments.extend(segments.iter());
    }
    Ok(())
}
