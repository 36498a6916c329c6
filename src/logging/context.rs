//! Request-scoped context values and the keys that select them for logging.
//!
//! # Responsibilities
//! - Carry per-request values (request id, user id, tenant, ...) through a call chain
//! - Identify values by collision-free keys instead of strings
//! - Coerce a looked-up value into a log attribute value
//!
//! # Design Decisions
//! - A [`ContextKey`] is identified by the address of its `static` item, so two keys with
//!   the same name in different modules never collide
//! - [`RequestContext`] is immutable; adding a value yields a new context
//! - The active context is also available through a tokio task-local scope, so log calls
//!   deep in a handler need not receive it explicitly

use std::fmt;
use std::future::Future;
use std::ptr;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, Request};

use crate::logging::record::AttrValue;

/// Opaque key for a [`RequestContext`] value.
///
/// Keys must be declared as `static` items and used by reference; identity is the
/// address of the item, the name only shows up in debug output.
///
/// ```
/// use context_logger::logging::ContextKey;
///
/// static TENANT_KEY: ContextKey = ContextKey::new("tenant");
/// ```
pub struct ContextKey {
    name: &'static str,
}

impl ContextKey {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ContextKey {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ContextKey {}

impl fmt::Debug for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({}@{:p})", self.name, self)
    }
}

/// Value stored in a [`RequestContext`].
#[derive(Clone)]
pub enum ContextValue {
    Str(String),
    Int(i32),
    Int64(i64),
    Float(f64),
    Bool(bool),
    /// Anything else; logged through its `Debug` representation.
    Other(Arc<dyn fmt::Debug + Send + Sync>),
}

impl ContextValue {
    pub fn other(value: impl fmt::Debug + Send + Sync + 'static) -> Self {
        ContextValue::Other(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce into an attribute value. Empty strings count as absent.
    pub fn to_attr_value(&self) -> Option<AttrValue> {
        match self {
            ContextValue::Str(s) if s.is_empty() => None,
            ContextValue::Str(s) => Some(AttrValue::Str(s.clone())),
            ContextValue::Int(v) => Some(AttrValue::Int(i64::from(*v))),
            ContextValue::Int64(v) => Some(AttrValue::Int(*v)),
            ContextValue::Float(v) => Some(AttrValue::Float(*v)),
            ContextValue::Bool(v) => Some(AttrValue::Bool(*v)),
            ContextValue::Other(v) => Some(AttrValue::Any(format!("{v:?}"))),
        }
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Str(v) => f.debug_tuple("Str").field(v).finish(),
            ContextValue::Int(v) => f.debug_tuple("Int").field(v).finish(),
            ContextValue::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            ContextValue::Float(v) => f.debug_tuple("Float").field(v).finish(),
            ContextValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            ContextValue::Other(v) => f.debug_tuple("Other").field(v).finish(),
        }
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::Str(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::Str(v.to_string())
    }
}

impl From<i32> for ContextValue {
    fn from(v: i32) -> Self {
        ContextValue::Int(v)
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Int64(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        ContextValue::Float(v)
    }
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

tokio::task_local! {
    static CURRENT_CONTEXT: RequestContext;
}

/// Per-request value store.
#[derive(Clone, Default)]
pub struct RequestContext {
    values: Arc<Vec<(&'static ContextKey, ContextValue)>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `key` set to `value`.
    #[must_use]
    pub fn with_value(&self, key: &'static ContextKey, value: impl Into<ContextValue>) -> Self {
        let value = value.into();
        let mut values: Vec<_> = self
            .values
            .iter()
            .filter(|(k, _)| *k != key)
            .cloned()
            .collect();
        values.push((key, value));
        Self {
            values: Arc::new(values),
        }
    }

    pub fn get(&self, key: &'static ContextKey) -> Option<&ContextValue> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The context of the enclosing [`RequestContext::scope`], or an empty one.
    pub fn current() -> Self {
        CURRENT_CONTEXT
            .try_with(Clone::clone)
            .unwrap_or_default()
    }

    /// Run `fut` with this context as the current one.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CONTEXT.scope(self, fut).await
    }

    /// Context stored in request extensions, falling back to the current scope.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(Self::current)
    }

    /// Store this context in the request so later middleware and handlers see it.
    pub fn attach<B>(&self, request: &mut Request<B>) {
        request.extensions_mut().insert(self.clone());
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k.name(), v)))
            .finish()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}

/// Which context keys become which log attributes.
///
/// Built once before the logger and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContextKeys {
    entries: Vec<(&'static ContextKey, String)>,
}

impl ContextKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log values under `key` as attribute `name`. Re-declaring a key replaces its name.
    #[must_use]
    pub fn with(mut self, key: &'static ContextKey, name: impl Into<String>) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = name,
            None => self.entries.push((key, name)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static ContextKey, &str)> + '_ {
        self.entries.iter().map(|(k, n)| (*k, n.as_str()))
    }
}
