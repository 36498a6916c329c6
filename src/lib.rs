//! Request-context structured logging for axum services.
//!
//! Values attached to a request (request id, tenant, user) are carried in a
//! [`logging::RequestContext`] and added to every log record emitted while the request is
//! handled, without being threaded through each call. The HTTP middleware assigns the
//! request id and logs exactly one outcome record per request.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logging::{Logger, LoggerOptions, RequestContext};
