//! Formatting sinks.
//!
//! # Responsibilities
//! - Render records as one JSON object per line (machine-readable)
//! - Render records as `key=value` text lines (human-readable)
//! - Serialize writes from concurrent requests through one shared writer
//!
//! # Design Decisions
//! - Each record is encoded fully before the writer lock is taken, then written with a
//!   single `write_all`, so lines from concurrent requests never interleave
//! - JSON groups become nested objects; text groups become dotted key prefixes
//! - A group with no attributes is omitted

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::SecondsFormat;
use serde_json::{Map, Value};

use crate::logging::context::RequestContext;
use crate::logging::record::{upsert, Attr, AttrValue, Level, Record};
use crate::logging::sink::{LogResult, LogSink, SinkError};

/// Writer shared by every sink derived from the same root.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn write_line(&self, line: &[u8]) -> LogResult<()> {
        let mut writer = self.inner.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(line)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

/// Options common to the formatting sinks.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Minimum level handled.
    pub level: Level,
    /// Include the caller location of each record.
    pub add_source: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            add_source: false,
        }
    }
}

/// One JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonSink {
    writer: SharedWriter,
    options: FormatOptions,
    bound: Map<String, Value>,
    groups: Vec<String>,
}

impl JsonSink {
    pub fn new(writer: SharedWriter, options: FormatOptions) -> Self {
        Self {
            writer,
            options,
            bound: Map::new(),
            groups: Vec::new(),
        }
    }

    /// Reserved fields (`time`, `level`, `source`, `msg`) always come first and are never
    /// replaced by an attribute of the same name.
    fn encode(&self, record: &Record) -> LogResult<Vec<u8>> {
        let mut attrs = self.bound.clone();
        insert_attrs(&mut attrs, &self.groups, record.attrs());

        let mut root = Map::new();
        root.insert(
            "time".into(),
            Value::String(record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        root.insert("level".into(), Value::String(record.level.label().into()));
        if self.options.add_source {
            if let Some(source) = record.source {
                let mut location = Map::new();
                location.insert("file".into(), Value::String(source.file().into()));
                location.insert("line".into(), Value::from(source.line()));
                root.insert("source".into(), Value::Object(location));
            }
        }
        root.insert("msg".into(), Value::String(record.message.clone()));

        for (key, value) in attrs {
            if !root.contains_key(&key) {
                root.insert(key, value);
            }
        }

        let mut line = serde_json::to_vec(&Value::Object(root))?;
        line.push(b'\n');
        Ok(line)
    }
}

impl LogSink for JsonSink {
    fn enabled(&self, _ctx: &RequestContext, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, _ctx: &RequestContext, record: Record) -> LogResult<()> {
        let line = self.encode(&record)?;
        self.writer.write_line(&line)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogSink> {
        let mut sink = self.clone();
        insert_attrs(&mut sink.bound, &self.groups, &attrs);
        Arc::new(sink)
    }

    fn with_group(&self, name: &str) -> Arc<dyn LogSink> {
        let mut sink = self.clone();
        if !name.is_empty() {
            sink.groups.push(name.to_string());
        }
        Arc::new(sink)
    }
}

fn insert_attrs(root: &mut Map<String, Value>, groups: &[String], attrs: &[Attr]) {
    if attrs.is_empty() {
        return;
    }

    let mut target = root;
    for group in groups {
        let entry = target
            .entry(group.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        target = next;
    }

    for attr in attrs {
        target.insert(attr.key.clone(), to_json(&attr.value));
    }
}

fn to_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::Str(s) | AttrValue::Any(s) => Value::String(s.clone()),
        AttrValue::Int(v) => Value::from(*v),
        AttrValue::Uint(v) => Value::from(*v),
        // Non-finite floats become null.
        AttrValue::Float(v) => Value::from(*v),
        AttrValue::Bool(v) => Value::Bool(*v),
        AttrValue::Group(attrs) => Value::Object(
            attrs
                .iter()
                .map(|a| (a.key.clone(), to_json(&a.value)))
                .collect(),
        ),
    }
}

/// Human-readable `key=value` lines for development.
#[derive(Debug, Clone)]
pub struct PrettySink {
    writer: SharedWriter,
    options: FormatOptions,
    bound: Vec<Attr>,
    prefix: String,
}

impl PrettySink {
    pub fn new(writer: SharedWriter, options: FormatOptions) -> Self {
        Self {
            writer,
            options,
            bound: Vec::new(),
            prefix: String::new(),
        }
    }

    fn prefixed(&self, attr: &Attr) -> Attr {
        Attr {
            key: format!("{}{}", self.prefix, attr.key),
            value: attr.value.clone(),
        }
    }

    fn encode(&self, record: &Record) -> String {
        let mut attrs = self.bound.clone();
        for attr in record.attrs() {
            upsert(&mut attrs, self.prefixed(attr));
        }

        let mut line = format!(
            "{} {:<5} {}",
            record.time.format("%H:%M:%S%.3f"),
            record.level.label(),
            record.message
        );
        if self.options.add_source {
            if let Some(source) = record.source {
                let _ = write!(line, " source={}:{}", source.file(), source.line());
            }
        }
        for attr in &attrs {
            write_text_attr(&mut line, &attr.key, &attr.value);
        }
        line.push('\n');
        line
    }
}

impl LogSink for PrettySink {
    fn enabled(&self, _ctx: &RequestContext, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, _ctx: &RequestContext, record: Record) -> LogResult<()> {
        let line = self.encode(&record);
        self.writer.write_line(line.as_bytes())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogSink> {
        let mut sink = self.clone();
        for attr in &attrs {
            upsert(&mut sink.bound, self.prefixed(attr));
        }
        Arc::new(sink)
    }

    fn with_group(&self, name: &str) -> Arc<dyn LogSink> {
        let mut sink = self.clone();
        if !name.is_empty() {
            sink.prefix = format!("{}{}.", self.prefix, name);
        }
        Arc::new(sink)
    }
}

fn write_text_attr(out: &mut String, key: &str, value: &AttrValue) {
    match value {
        AttrValue::Group(attrs) => {
            for attr in attrs {
                write_text_attr(out, &format!("{key}.{}", attr.key), &attr.value);
            }
        }
        AttrValue::Str(s) | AttrValue::Any(s) if needs_quoting(s) => {
            let _ = write!(out, " {key}={s:?}");
        }
        other => {
            let _ = write!(out, " {key}={other}");
        }
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '=')
}
