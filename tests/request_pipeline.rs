//! End-to-end tests of the middleware chain, driven in-process.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use context_logger::http::middleware::{request_context, request_logging};
use context_logger::logging::{
    attr, AttrValue, ContextLoggingHandler, Level, Logger, LoggerOptions, MemorySink,
    RequestContext, SharedWriter,
};
use serde_json::Value;
use tower::ServiceExt;

mod common;

fn pipeline(logger: Logger) -> Router {
    Router::new()
        .route(
            "/items/{id}",
            get(|| async { (StatusCode::CREATED, "created") }),
        )
        .route(
            "/work",
            get(|logger: axum::extract::State<Logger>| async move {
                logger.info("doing work", [attr("step", 1)]).unwrap();
                "done"
            }),
        )
        .with_state(logger.clone())
        .layer(middleware::from_fn_with_state(logger, request_logging))
        .layer(middleware::from_fn(request_context))
}

async fn drive(router: Router, request: Request) -> axum::response::Response {
    let response = router.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    axum::response::Response::from_parts(parts, Body::from(bytes))
}

#[tokio::test]
async fn test_one_started_and_one_completed_record() {
    let (logger, memory) = common::capturing_logger();

    let response = drive(
        pipeline(logger),
        Request::builder()
            .uri("/items/42?x=1")
            .header("X-Request-ID", "r-1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "r-1");

    let records = memory.records();
    assert_eq!(records.len(), 2);

    let started = &records[0];
    assert_eq!(started.level, Level::Debug);
    assert_eq!(started.message, "request started");

    let completed = &records[1];
    assert_eq!(completed.level, Level::Info);
    assert_eq!(completed.message, "request completed");
    assert_eq!(completed.attr("status"), Some(&AttrValue::Uint(201)));
    assert_eq!(completed.attr("bytes"), Some(&AttrValue::Uint(7)));
    assert_eq!(completed.attr("method"), Some(&AttrValue::Str("GET".into())));
    assert_eq!(completed.attr("path"), Some(&AttrValue::Str("/items/42".into())));
    assert_eq!(completed.attr("request_id"), Some(&AttrValue::Str("r-1".into())));
    assert_eq!(
        completed.attr("query"),
        Some(&AttrValue::Group(vec![attr("x", "1")]))
    );
    assert_eq!(
        completed.attr("route_pattern"),
        Some(&AttrValue::Str("/items/{id}".into()))
    );
}

#[tokio::test]
async fn test_handler_records_carry_request_id() {
    let (logger, memory) = common::capturing_logger();

    drive(
        pipeline(logger),
        Request::builder()
            .uri("/work")
            .header("X-Request-ID", "r-2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let records = memory.records();
    let work = records.iter().find(|r| r.message == "doing work").unwrap();
    assert_eq!(work.attr("request_id"), Some(&AttrValue::Str("r-2".into())));
    assert_eq!(work.attr("step"), Some(&AttrValue::Int(1)));
}

#[tokio::test]
async fn test_concurrent_requests_do_not_mix_context() {
    let (logger, memory) = common::capturing_logger();
    let router = pipeline(logger);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            drive(
                router,
                Request::builder()
                    .uri("/work")
                    .header("X-Request-ID", format!("req-{i}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let records = memory.records();
    assert_eq!(records.len(), 16 * 3);
    for record in &records {
        let id = match record.attr("request_id") {
            Some(AttrValue::Str(id)) => id.clone(),
            other => panic!("missing request id: {other:?}"),
        };
        assert!(id.starts_with("req-"));
    }
    for i in 0..16 {
        let id = AttrValue::Str(format!("req-{i}"));
        let count = records
            .iter()
            .filter(|r| r.attr("request_id") == Some(&id))
            .count();
        assert_eq!(count, 3);
    }
}

#[tokio::test]
async fn test_context_value_outside_scope_is_absent() {
    let memory = MemorySink::new(Level::Debug);
    let sink = ContextLoggingHandler::new(Arc::new(memory.clone()), common::demo_keys());
    let logger = Logger::new(Arc::new(sink));

    logger
        .log(&RequestContext::new(), Level::Info, "outside", [])
        .unwrap();

    assert!(memory.last().unwrap().attr("request_id").is_none());
}

#[tokio::test]
async fn test_production_json_lines() {
    let buffer = common::Buffer::default();
    let options = LoggerOptions::default()
        .environment("production")
        .level("info")
        .app("Orders")
        .version("1.4.0")
        .context_keys(common::demo_keys());
    let logger = Logger::with_writer(&options, SharedWriter::new(buffer.clone()));

    drive(
        pipeline(logger),
        Request::builder()
            .uri("/items/5")
            .header("X-Request-ID", "json-1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "debug start record must be filtered: {lines:?}");

    let line: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["msg"], "request completed");
    assert_eq!(line["app"], "orders");
    assert_eq!(line["environment"], "production");
    assert_eq!(line["version"], "1.4.0");
    assert_eq!(line["commit"], "n/a");
    assert_eq!(line["request_id"], "json-1");
    assert_eq!(line["status"], 201);
    assert!(line.get("source").is_none());
}
