//! Request context middleware.
//! Assigns or propagates the request id and makes the request context available.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::http::request::{RequestId, REQUEST_ID_KEY, X_REQUEST_ID};
use crate::logging::RequestContext;

/// Read `X-Request-ID` (or generate a UUID v4), store it in a fresh request context, run the
/// rest of the chain inside that context, and echo the id on the response.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext::new().with_value(&REQUEST_ID_KEY, request_id.clone());
    ctx.attach(&mut request);
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = ctx.scope(next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
