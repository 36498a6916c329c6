//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use context_logger::config::ServiceConfig;
use context_logger::http::{HttpServer, REQUEST_ID_KEY, TENANT_KEY};
use context_logger::lifecycle::Shutdown;
use context_logger::logging::{
    CapturedRecord, ContextKeys, ContextLoggingHandler, Level, Logger, MemorySink,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Context keys used by the demo service.
pub fn demo_keys() -> ContextKeys {
    ContextKeys::new()
        .with(&REQUEST_ID_KEY, "request_id")
        .with(&TENANT_KEY, "tenant")
}

/// Logger capturing every record (debug and up) with the demo context keys.
pub fn capturing_logger() -> (Logger, MemorySink) {
    let memory = MemorySink::new(Level::Debug);
    let sink = ContextLoggingHandler::new(Arc::new(memory.clone()), demo_keys());
    (Logger::new(Arc::new(sink)), memory)
}

/// In-memory writer whose contents can be read back as lines.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A demo server listening on an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), io::Error>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the demo server on `127.0.0.1:0`.
pub async fn start_server(config: ServiceConfig, logger: Logger) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(HttpServer::new(config, logger).run(listener, receiver));

    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

/// Wait until `memory` holds at least `count` records.
///
/// Completion records are written when the server finishes the response body, which can
/// happen just after the client has read it.
pub async fn wait_for_records(memory: &MemorySink, count: usize) -> Vec<CapturedRecord> {
    for _ in 0..100 {
        let records = memory.records();
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    memory.records()
}
