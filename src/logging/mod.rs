//! Request-context structured logging.
//!
//! # Data Flow
//! ```text
//! Logger::info(msg, attrs)
//!     → Record (level, message, attrs, caller)
//!     → ContextLoggingHandler (adds declared RequestContext values)
//!     → JsonSink | PrettySink (bound attrs + groups, one line per record)
//!     → SharedWriter (stdout by default)
//! ```
//!
//! # Design Decisions
//! - No global logger: a `Logger` is built from `LoggerOptions` and passed explicitly
//! - Sinks are a trait so decorators compose to any depth
//! - Context keys are `static` items compared by address, never strings

pub mod context;
pub mod context_handler;
pub mod discard;
pub mod format;
pub mod logger;
pub mod memory;
pub mod options;
pub mod record;
pub mod sink;

pub use context::{ContextKey, ContextKeys, ContextValue, RequestContext};
pub use context_handler::ContextLoggingHandler;
pub use discard::DiscardSink;
pub use format::{FormatOptions, JsonSink, PrettySink, SharedWriter};
pub use logger::Logger;
pub use memory::{CapturedRecord, MemorySink};
pub use options::LoggerOptions;
pub use record::{attr, Attr, AttrValue, Level, Record};
pub use sink::{LogResult, LogSink, SinkError};
