//! Logger front-end.
//!
//! A [`Logger`] is a cheap handle over a sink chain. It is built once from
//! [`LoggerOptions`] and passed explicitly (usually as axum state) to whatever logs.

use std::panic::Location;
use std::sync::Arc;

use crate::logging::context::RequestContext;
use crate::logging::context_handler::ContextLoggingHandler;
use crate::logging::discard::DiscardSink;
use crate::logging::format::{FormatOptions, JsonSink, PrettySink, SharedWriter};
use crate::logging::options::LoggerOptions;
use crate::logging::record::{attr, Attr, Level, Record};
use crate::logging::sink::{LogResult, LogSink};

/// Handle for emitting structured records.
#[derive(Debug, Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Logger writing to stdout.
    pub fn from_options(options: &LoggerOptions) -> Self {
        Self::with_writer(options, SharedWriter::stdout())
    }

    /// Logger writing to `writer`.
    ///
    /// Development environments get text lines with caller locations, everything else
    /// gets JSON. The sink is wrapped in a [`ContextLoggingHandler`] when context keys are
    /// declared, and the identity fields are bound to every record.
    pub fn with_writer(options: &LoggerOptions, writer: SharedWriter) -> Self {
        let format = FormatOptions {
            level: options.level,
            add_source: options.is_development(),
        };

        let mut sink: Arc<dyn LogSink> = if options.is_development() {
            Arc::new(PrettySink::new(writer, format))
        } else {
            Arc::new(JsonSink::new(writer, format))
        };

        if !options.context_keys.is_empty() {
            sink = Arc::new(ContextLoggingHandler::new(
                sink,
                options.context_keys.clone(),
            ));
        }

        Self::new(sink).with([
            attr("app", &options.app),
            attr("environment", &options.environment),
            attr("version", &options.version),
            attr("commit", &options.commit),
            attr("build_time", &options.build_time),
            attr("runtime_version", &options.runtime_version),
        ])
    }

    /// Logger that drops everything.
    pub fn discard() -> Self {
        Self::new(Arc::new(DiscardSink))
    }

    /// Logger attaching `attrs` to every record.
    #[must_use]
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        if attrs.is_empty() {
            return self.clone();
        }
        Self::new(self.sink.with_attrs(attrs))
    }

    /// Logger nesting subsequent attributes under `name`.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        Self::new(self.sink.with_group(name))
    }

    pub fn enabled(&self, ctx: &RequestContext, level: Level) -> bool {
        self.sink.enabled(ctx, level)
    }

    /// Emit a record with an explicit context.
    #[track_caller]
    pub fn log(
        &self,
        ctx: &RequestContext,
        level: Level,
        message: &str,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> LogResult<()> {
        if !self.sink.enabled(ctx, level) {
            return Ok(());
        }

        let mut record = Record::new(level, message).with_source(Location::caller());
        record.add_attrs(attrs);
        self.sink.handle(ctx, record)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) -> LogResult<()> {
        self.log(&RequestContext::current(), Level::Debug, message, attrs)
    }

    #[track_caller]
    pub fn info(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) -> LogResult<()> {
        self.log(&RequestContext::current(), Level::Info, message, attrs)
    }

    #[track_caller]
    pub fn warn(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) -> LogResult<()> {
        self.log(&RequestContext::current(), Level::Warn, message, attrs)
    }

    #[track_caller]
    pub fn error(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) -> LogResult<()> {
        self.log(&RequestContext::current(), Level::Error, message, attrs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::Mutex;

    use serde_json::Value;

    use super::*;
    use crate::logging::context::{ContextKey, ContextKeys};
    use crate::logging::memory::MemorySink;
    use crate::logging::record::AttrValue;

    static REQUEST_ID: ContextKey = ContextKey::new("request_id");

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn json_lines(buffer: &Buffer) -> Vec<Value> {
        String::from_utf8(buffer.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_production_logger_writes_json_with_identity() {
        let buffer = Buffer::default();
        let options = LoggerOptions::default()
            .environment("production")
            .app("Orders")
            .version("1.0.0")
            .context_keys(ContextKeys::new().with(&REQUEST_ID, "request_id"));
        let logger = Logger::with_writer(&options, SharedWriter::new(buffer.clone()));

        let ctx = RequestContext::new().with_value(&REQUEST_ID, "r-9");
        logger
            .log(&ctx, Level::Info, "order placed", [attr("order", 7)])
            .unwrap();

        let lines = json_lines(&buffer);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["msg"], "order placed");
        assert_eq!(line["app"], "orders");
        assert_eq!(line["environment"], "production");
        assert_eq!(line["version"], "1.0.0");
        assert_eq!(line["commit"], "n/a");
        assert_eq!(line["build_time"], "n/a");
        assert_eq!(line["runtime_version"], "n/a");
        assert_eq!(line["request_id"], "r-9");
        assert_eq!(line["order"], 7);
        assert!(line.get("source").is_none());
    }

    #[test]
    fn test_level_threshold_suppresses_records() {
        let buffer = Buffer::default();
        let options = LoggerOptions::default().environment("production").level("warn");
        let logger = Logger::with_writer(&options, SharedWriter::new(buffer.clone()));

        logger.info("ignored", []).unwrap();
        logger.warn("kept", []).unwrap();

        let lines = json_lines(&buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "WARN");
    }

    #[tokio::test]
    async fn test_convenience_methods_use_current_context() {
        let memory = MemorySink::new(Level::Debug);
        let logger = Logger::new(Arc::new(ContextLoggingHandler::new(
            Arc::new(memory.clone()),
            ContextKeys::new().with(&REQUEST_ID, "request_id"),
        )));

        let ctx = RequestContext::new().with_value(&REQUEST_ID, "r-1");
        ctx.scope(async { logger.info("inside", []).unwrap() }).await;
        logger.info("outside", []).unwrap();

        let records = memory.records();
        assert_eq!(
            records[0].attr("request_id"),
            Some(&AttrValue::Str("r-1".into()))
        );
        assert!(records[1].attr("request_id").is_none());
    }

    #[test]
    fn test_discard_logger() {
        let logger = Logger::discard().with([attr("a", 1)]).with_group("g");
        assert!(!logger.enabled(&RequestContext::new(), Level::Error));
        assert!(logger.error("dropped", []).is_ok());
    }
}
