//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (request context, tenant, request logging, timeout, body limit)
//! - Bind server to listener and stop on the shutdown signal
//!
//! # Middleware Order
//! ```text
//! request_context → tenant_context → request_logging → body limit → timeout → handler
//! ```
//! Timeouts and oversized bodies are produced inside the logging layer, so they are
//! logged like any other response.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::{request_context, request_logging};
use crate::http::response::{respond, respond_with, ErrorResponse};
use crate::lifecycle::shutdown;
use crate::logging::{attr, ContextKey, Logger, RequestContext};

/// Header carrying the caller's tenant.
pub const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");

/// Context key holding the tenant, set by [`tenant_context`].
pub static TENANT_KEY: ContextKey = ContextKey::new("tenant");

/// An item managed by the demo API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct NewItem {
    #[serde(default)]
    name: String,
}

/// In-memory item storage.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: RwLock<HashMap<u64, Item>>,
    next_id: AtomicU64,
}

impl ItemStore {
    pub async fn get(&self, id: u64) -> Option<Item> {
        self.items.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, name: String) -> Item {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let item = Item { id, name };
        self.items.write().await.insert(id, item.clone());
        item
    }
}

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub logger: Logger,
    pub items: Arc<ItemStore>,
}

/// HTTP server for the demo service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, logger: Logger) -> Self {
        let state = AppState {
            logger,
            items: Arc::new(ItemStore::default()),
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let logger = state.logger.clone();

        Router::new()
            .route("/health", get(health))
            .route("/items", axum::routing::post(create_item))
            .route("/items/{id}", get(get_item))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(middleware::from_fn_with_state(logger, request_logging))
            .layer(middleware::from_fn(tenant_context))
            .layer(middleware::from_fn(request_context))
    }

    /// Router with every layer applied, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Add the `X-Tenant-ID` header value to the request context.
///
/// Must run after `request_context` so the request id is kept.
pub async fn tenant_context(mut request: Request, next: Next) -> Response {
    let tenant = request
        .headers()
        .get(&X_TENANT_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    match tenant {
        Some(tenant) => {
            let ctx = RequestContext::from_extensions(request.extensions())
                .with_value(&TENANT_KEY, tenant);
            ctx.attach(&mut request);
            ctx.scope(next.run(request)).await
        }
        None => next.run(request).await,
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match id.parse::<u64>() {
        Ok(id) => state.items.get(id).await.ok_or_else(|| {
            ErrorResponse::new(StatusCode::NOT_FOUND, "Resource not found.")
                .error_text(format!("item {id} does not exist"))
                .cause("no such item")
        }),
        Err(err) => Err(ErrorResponse::new(StatusCode::BAD_REQUEST, "Invalid request.")
            .error_text(format!("'{id}' is not an item id"))
            .cause(err)),
    };
    respond(&state.logger, result)
}

async fn create_item(State(state): State<AppState>, Json(input): Json<NewItem>) -> Response {
    let name = input.name.trim();
    if name.is_empty() {
        let err = ErrorResponse::new(StatusCode::BAD_REQUEST, "Invalid request.")
            .error_text("name must not be empty")
            .details(json!({"field": "name"}))
            .cause("empty name");
        return respond::<Item>(&state.logger, Err(err));
    }

    let item = state.items.insert(name.to_string()).await;
    if let Err(err) = state.logger.info("item created", [attr("item_id", item.id)]) {
        tracing::warn!(error = %err, "failed to emit handler log record");
    }
    respond_with(&state.logger, StatusCode::CREATED, Ok(item))
}
