//! The log sink capability.
//!
//! Every destination for records (formatting sinks, the discard sink, the in-memory
//! capture sink) and every decorator over one implements [`LogSink`], so sinks compose to
//! any depth.

use std::fmt;
use std::sync::Arc;

use crate::logging::context::RequestContext;
use crate::logging::record::{Attr, Level, Record};

/// Errors returned by [`LogSink::handle`].
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("log writer lock poisoned")]
    Poisoned,

    /// Failure of a wrapped sink, tagged with the component that observed it.
    #[error("{component}: {source}")]
    Component {
        component: &'static str,
        #[source]
        source: Box<SinkError>,
    },
}

impl SinkError {
    pub fn component(component: &'static str, source: SinkError) -> Self {
        SinkError::Component {
            component,
            source: Box::new(source),
        }
    }
}

/// Result alias for log calls.
pub type LogResult<T> = Result<T, SinkError>;

/// Destination for structured log records.
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Whether a record at `level` would be handled.
    fn enabled(&self, ctx: &RequestContext, level: Level) -> bool;

    /// Handle one record.
    fn handle(&self, ctx: &RequestContext, record: Record) -> LogResult<()>;

    /// A sink that attaches `attrs` to every record it handles.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogSink>;

    /// A sink that nests all subsequent attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn LogSink>;
}
