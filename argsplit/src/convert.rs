//! Typed conversion of a decoded raw string into a user-facing value.
//!
//! [`ValueParser<T>`] is the composable unit options and the derive facade
//! build on; [`ParseFromStr`] is the trait-based replacement for reflective
//! `valueOf`/`of`/`parse` discovery. A default parser for any `T: FromStr`
//! is derived automatically (see the blanket impl below), so most element
//! types never need an explicit [`ValueParser`] at all.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConvertError;

/// A pure `&str -> T` parser that composes via [`ValueParser::or`].
///
/// Corresponds to a `ConverterResolver` having already been resolved for a
/// concrete `T`: everything upstream of this point (picking *which* rule
/// applies) happens once, at schema-construction time, rather than per
/// token, since Rust's generics make the target type static.
pub struct ValueParser<T> {
    f: Arc<dyn Fn(&str) -> Result<T, ConvertError> + Send + Sync>,
    manifest: ConverterManifest,
}

impl<T> Clone for ValueParser<T> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            manifest: self.manifest.clone(),
        }
    }
}

impl<T: 'static> ValueParser<T> {
    /// Build a parser from a raw closure, tagging it with a manifest entry
    /// for introspection (see [`ConverterManifest`]).
    pub fn new(resolver_name: &'static str, f: impl Fn(&str) -> Result<T, ConvertError> + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            manifest: ConverterManifest {
                resolver: resolver_name,
                target: std::any::type_name::<T>(),
                inner: None,
            },
        }
    }

    pub fn parse(&self, raw: &str) -> Result<T, ConvertError> {
        (self.f)(raw)
    }

    #[must_use]
    pub fn manifest(&self) -> &ConverterManifest {
        &self.manifest
    }

    /// Try `self` first; fall through to `other` on failure.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let manifest = ConverterManifest {
            resolver: "or",
            target: self.manifest.target,
            inner: Some(Box::new(self.manifest.clone())),
        };
        let (a, b) = (self.f, other.f);
        Self {
            f: Arc::new(move |raw| a(raw).or_else(|_| b(raw))),
            manifest,
        }
    }

    /// Only apply `self` when `predicate(raw)` holds; otherwise the parser
    /// reports failure, letting a subsequent `.or(...)` take over.
    #[must_use]
    pub fn when(self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        let manifest = self.manifest.clone();
        let f = self.f;
        Self {
            f: Arc::new(move |raw| {
                if predicate(raw) {
                    f(raw)
                } else {
                    Err(ConvertError::from_message("predicate did not match"))
                }
            }),
            manifest,
        }
    }
}

/// Read-only record of how a [`ValueParser`] was assembled.
///
/// A language-neutral stand-in for reflective "which converter fired"
/// introspection: each combinator tags the parser it produces so tests (or
/// diagnostics) can assert which rule actually ran, without the engine
/// needing real reflection. Purely optional; nothing in the splitter
/// inspects this at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterManifest {
    pub resolver: &'static str,
    pub target: &'static str,
    pub inner: Option<Box<ConverterManifest>>,
}

/// Trait-based replacement for reflective `valueOf`/`of`/`parse` discovery.
///
/// Implement this directly for a type you own whose parsing can fail in a
/// custom way; types that already implement [`FromStr`] get it for free via
/// the blanket implementation below, which covers the common case (numbers,
/// `String`, anything `derive(Debug)`-style libraries already give you
/// `FromStr` for).
pub trait ParseFromStr: Sized {
    type Err: std::error::Error + Send + Sync + 'static;

    fn parse_from_str(s: &str) -> Result<Self, Self::Err>;
}

impl<T> ParseFromStr for T
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    type Err = T::Err;

    fn parse_from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
    }
}

/// The default parser for `T`: delegates to [`ParseFromStr`], un-quoting is
/// handled upstream by the splitter, not here.
pub fn default_parser<T>() -> ValueParser<T>
where
    T: ParseFromStr + 'static,
{
    ValueParser::new("default", |raw| {
        T::parse_from_str(raw).map_err(ConvertError::new)
    })
}

/// Case-insensitive boolean parser matching the splitter's own `=`-attached
/// flag rule (`"true"` case-insensitively, anything else is `false`).
#[must_use]
pub fn bool_parser() -> ValueParser<bool> {
    ValueParser::new("bool", |raw| Ok(raw.eq_ignore_ascii_case("true")))
}

/// Identity parser for `String`, the base case every other parser eventually
/// bottoms out at.
#[must_use]
pub fn identity_parser() -> ValueParser<String> {
    ValueParser::new("identity", |raw| Ok(raw.to_owned()))
}

impl<T> fmt::Debug for ValueParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueParser")
            .field("manifest", &self.manifest)
            .finish()
    }
}
