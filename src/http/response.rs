//! Error responses and handler result rendering.
//!
//! # Responsibilities
//! - Carry a user-facing status message, an application error text and optional details
//! - Render as JSON `{status, error?, details?}` with the carried HTTP status code
//! - Log as a single grouped attribute including the low-level cause
//! - Render handler results, falling back to a 422 payload when serialisation fails
//!
//! # Design Decisions
//! - The low-level cause and the status code never reach the response body

use std::fmt;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::logging::{attr, AttrValue, Logger, SinkError};

/// Status text used when a successful result cannot be serialised.
pub const RENDER_FAILURE_STATUS: &str = "Error rendering response.";

/// Error payload returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,
    #[serde(rename = "status")]
    pub status_text: String,
    #[serde(rename = "error", skip_serializing_if = "String::is_empty")]
    pub error_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip)]
    pub cause: Option<String>,
}

impl ErrorResponse {
    pub fn new(status_code: StatusCode, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            error_text: String::new(),
            details: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = text.into();
        self
    }

    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status_code, self.status_text)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

impl From<&ErrorResponse> for AttrValue {
    fn from(err: &ErrorResponse) -> Self {
        let details = err
            .details
            .as_ref()
            .map_or_else(|| "null".to_string(), Value::to_string);

        AttrValue::Group(vec![
            attr("error", err.cause.as_deref().unwrap_or_default()),
            attr("http_status_code", err.status_code.as_u16()),
            attr("status_text", &err.status_text),
            attr("error_text", &err.error_text),
            attr("details", AttrValue::Any(details)),
        ])
    }
}

/// 422 payload for a result that could not be serialised.
pub fn render_error(err: impl fmt::Display) -> ErrorResponse {
    let text = err.to_string();
    ErrorResponse::new(StatusCode::UNPROCESSABLE_ENTITY, RENDER_FAILURE_STATUS)
        .error_text(text.clone())
        .cause(text)
}

/// Render a handler result with `200 OK`.
pub fn respond<T: Serialize>(logger: &Logger, result: Result<T, ErrorResponse>) -> Response {
    respond_with(logger, StatusCode::OK, result)
}

/// Render a handler result, using `status` for the success case.
///
/// Errors are logged as "error in handler" and returned as-is. A success value that fails
/// to serialise is logged as "error rendering response" and replaced by [`render_error`].
pub fn respond_with<T: Serialize>(
    logger: &Logger,
    status: StatusCode,
    result: Result<T, ErrorResponse>,
) -> Response {
    match result {
        Ok(value) => match serde_json::to_vec(&value) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(err) => {
                log_failure(logger.error(
                    "error rendering response",
                    [attr("error", err.to_string())],
                ));
                render_error(err).into_response()
            }
        },
        Err(err) => {
            log_failure(logger.error("error in handler", [attr("error", &err)]));
            err.into_response()
        }
    }
}

fn log_failure(result: Result<(), SinkError>) {
    if let Err(err) = result {
        tracing::warn!(error = %err, "failed to emit handler log record");
    }
}
