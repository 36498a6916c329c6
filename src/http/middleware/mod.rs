//! Request middleware.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request_context (request id, context in extensions + task-local scope)
//!     → application middleware (may add values with RequestContext::attach)
//!     → request_logging ("request started", observed response body)
//!     → handler
//! ```

pub mod request_context;
pub mod request_logging;

pub use request_context::request_context;
pub use request_logging::{completion_level, request_logging};
