//! Context-enriching sink decorator.
//!
//! # Responsibilities
//! - Look up each declared context key at emission time
//! - Append the coerced values to the record before delegating
//! - Keep enrichment alive across `with_attrs` / `with_group` chaining
//!
//! # Design Decisions
//! - Filtering is never altered: `enabled` delegates unchanged
//! - Only keys declared in [`ContextKeys`] are emitted; other context values never leak
//! - A failure of the wrapped sink is tagged and returned, never swallowed

use std::sync::Arc;

use crate::logging::context::{ContextKeys, RequestContext};
use crate::logging::record::{Attr, Level, Record};
use crate::logging::sink::{LogResult, LogSink, SinkError};

const COMPONENT: &str = "context handler";

/// Sink decorator adding request-context attributes to every record.
#[derive(Debug, Clone)]
pub struct ContextLoggingHandler {
    inner: Arc<dyn LogSink>,
    keys: Arc<ContextKeys>,
}

impl ContextLoggingHandler {
    pub fn new(inner: Arc<dyn LogSink>, keys: ContextKeys) -> Self {
        Self {
            inner,
            keys: Arc::new(keys),
        }
    }
}

impl LogSink for ContextLoggingHandler {
    fn enabled(&self, ctx: &RequestContext, level: Level) -> bool {
        self.inner.enabled(ctx, level)
    }

    fn handle(&self, ctx: &RequestContext, mut record: Record) -> LogResult<()> {
        for (key, name) in self.keys.iter() {
            let Some(value) = ctx.get(key).and_then(|v| v.to_attr_value()) else {
                continue;
            };
            record.add_attr(Attr {
                key: name.to_string(),
                value,
            });
        }

        self.inner
            .handle(ctx, record)
            .map_err(|e| SinkError::component(COMPONENT, e))
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogSink> {
        Arc::new(Self {
            inner: self.inner.with_attrs(attrs),
            keys: Arc::clone(&self.keys),
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn LogSink> {
        Arc::new(Self {
            inner: self.inner.with_group(name),
            keys: Arc::clone(&self.keys),
        })
    }
}
