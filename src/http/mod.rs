//! HTTP surface of the request logger.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → middleware/ (request context, request logging)
//!     → handler
//!     → response.rs (error payloads, result rendering)
//!     → observed body → completion record
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, REQUEST_ID_KEY, X_REQUEST_ID};
pub use response::{render_error, respond, respond_with, ErrorResponse};
pub use server::{AppState, HttpServer, TENANT_KEY};
