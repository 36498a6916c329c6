//! In-memory capture sink.
//!
//! Keeps every handled record (with bound attributes resolved and group prefixes applied
//! as dotted keys) so tests can assert on what would have been written.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::logging::context::RequestContext;
use crate::logging::record::{upsert, Attr, AttrValue, Level, Record};
use crate::logging::sink::{LogResult, LogSink, SinkError};

/// A record as seen by a [`MemorySink`].
#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl CapturedRecord {
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}

/// Sink storing records in a shared vector. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemorySink {
    level: Level,
    records: Arc<Mutex<Vec<CapturedRecord>>>,
    bound: Vec<Attr>,
    prefix: String,
}

impl MemorySink {
    /// Capture records at `level` and above.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            records: Arc::default(),
            bound: Vec::new(),
            prefix: String::new(),
        }
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<CapturedRecord> {
        self.records().pop()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn prefixed(&self, attr: Attr) -> Attr {
        Attr {
            key: format!("{}{}", self.prefix, attr.key),
            value: attr.value,
        }
    }
}

impl LogSink for MemorySink {
    fn enabled(&self, _ctx: &RequestContext, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, _ctx: &RequestContext, record: Record) -> LogResult<()> {
        let mut attrs = self.bound.clone();
        for attr in record.attrs() {
            upsert(&mut attrs, self.prefixed(attr.clone()));
        }

        let captured = CapturedRecord {
            time: record.time,
            level: record.level,
            message: record.message,
            attrs,
        };

        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(captured);
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn LogSink> {
        let mut sink = self.clone();
        for attr in attrs {
            let attr = self.prefixed(attr);
            upsert(&mut sink.bound, attr);
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
