//! Sink that drops everything.

use std::sync::Arc;

use crate::logging::context::RequestContext;
use crate::logging::record::{Attr, Level, Record};
use crate::logging::sink::{LogResult, LogSink};

/// Disabled at every level, so callers skip building records at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn enabled(&self, _ctx: &RequestContext, _level: Level) -> bool {
        false
    }

    fn handle(&self, _ctx: &RequestContext, _record: Record) -> LogResult<()> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn LogSink> {
        Arc::new(*self)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn LogSink> {
        Arc::new(*self)
    }
}
