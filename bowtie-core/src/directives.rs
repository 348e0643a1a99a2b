//! `Cache-Control` directive parsing and classification.
//!
//! A `Cache-Control` value is a comma separated list of directives, each
//! either a bare token (`public`) or a `name=value` pair (`max-age=300`).
//! Directive names are case-insensitive and are normalised to lowercase.
//!
//! Directives are classified for caching decisions:
//!
//! - **Unacceptable**: `no-store`, `no-cache`, `private`. Any of these vetoes
//!   caching regardless of what else is present.
//! - **Acceptable**: `max-age`, `must-revalidate`, `proxy-revalidate`, `public`.
//!
//! Every other directive (`no-transform`, `s-maxage`, extensions) is kept but
//! has no influence on cacheability.
//!
//! ```
//! use bowtie_core::CacheControlDirectives;
//!
//! let directives = CacheControlDirectives::parse("no-transform,public,max-age=300,s-maxage=900");
//! assert!(directives.has_acceptable());
//! assert!(!directives.has_unacceptable());
//! assert_eq!(directives.max_age().map(|d| d.as_secs()), Some(300));
//! ```

use std::fmt;
use std::time::Duration;

use http::HeaderMap;
use http::header::CACHE_CONTROL;
use smol_str::SmolStr;

/// Directives that forbid storing or reusing a response.
pub const UNACCEPTABLE_DIRECTIVES: [&str; 3] = ["no-store", "no-cache", "private"];

/// Directives that explicitly allow caching.
pub const ACCEPTABLE_DIRECTIVES: [&str; 4] =
    ["max-age", "must-revalidate", "proxy-revalidate", "public"];

/// A single `Cache-Control` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: SmolStr,
    value: Option<SmolStr>,
}

impl Directive {
    /// Lowercase directive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument of the directive with surrounding quotes removed.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_unacceptable(&self) -> bool {
        UNACCEPTABLE_DIRECTIVES.contains(&self.name.as_str())
    }

    pub fn is_acceptable(&self) -> bool {
        ACCEPTABLE_DIRECTIVES.contains(&self.name.as_str())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}

/// Parsed set of `Cache-Control` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControlDirectives {
    directives: Vec<Directive>,
}

impl CacheControlDirectives {
    /// Parses a single header value.
    ///
    /// Empty fragments and fragments without a name are skipped.
    pub fn parse(value: &str) -> Self {
        let directives = split_directives(value)
            .filter_map(|fragment| {
                let fragment = fragment.trim();
                if fragment.is_empty() {
                    return None;
                }
                let (name, value) = match fragment.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches('"');
                        (name.trim(), Some(SmolStr::new(value)))
                    }
                    None => (fragment, None),
                };
                if name.is_empty() {
                    return None;
                }
                Some(Directive {
                    name: SmolStr::new(name.to_ascii_lowercase()),
                    value,
                })
            })
            .collect();
        CacheControlDirectives { directives }
    }

    /// Collects directives from every `Cache-Control` value in `headers`.
    ///
    /// Returns `None` only when no `Cache-Control` header is present; a
    /// present but empty or non-UTF-8 header yields an empty set.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut values = headers.get_all(CACHE_CONTROL).iter().peekable();
        values.peek()?;
        let directives = values
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| CacheControlDirectives::parse(value).directives)
            .collect();
        Some(CacheControlDirectives { directives })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Returns `true` if a directive with this (case-insensitive) name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives
            .iter()
            .find(|directive| directive.name.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if any directive vetoes caching.
    pub fn has_unacceptable(&self) -> bool {
        self.directives.iter().any(Directive::is_unacceptable)
    }

    /// Returns `true` if any directive explicitly allows caching.
    pub fn has_acceptable(&self) -> bool {
        self.directives.iter().any(Directive::is_acceptable)
    }

    /// `max-age` as a duration. Unparseable values are ignored.
    pub fn max_age(&self) -> Option<Duration> {
        self.get("max-age")
            .and_then(Directive::value)
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

impl fmt::Display for CacheControlDirectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.directives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", directive)?;
        }
        Ok(())
    }
}

/// Splits on commas that are not inside a quoted string.
fn split_directives(value: &str) -> impl Iterator<Item = &str> {
    let mut fragments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fragments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fragments.push(&value[start..]);
    fragments.into_iter()
}
