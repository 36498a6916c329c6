//! Request identification.
//!
//! # Responsibilities
//! - Name the correlation header (`X-Request-ID`)
//! - Declare the context key the request id is stored under
//! - Expose the request id to handlers through request extensions
//!
//! # Design Decisions
//! - Request ID added as early as possible so every record can carry it
//! - A missing id at log time is reported as `"unknown"`, never as an error

use axum::http::{HeaderName, Request};

use crate::logging::ContextKey;

/// Correlation header, read on the way in and echoed on the way out.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Context key holding the request id.
pub static REQUEST_ID_KEY: ContextKey = ContextKey::new("request_id");

/// Substituted when no request id is available.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Request id as stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Access the request id of a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestId>().map(RequestId::as_str)
    }
}
