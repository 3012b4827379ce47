use std::thread;

use chrono::{DateTime, Utc};

use crate::Severity;

/// One log event. Created once per log call and never mutated afterwards;
/// the pipeline only ever borrows it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    module: String,
    severity: Severity,
    message: String,
    source_file: &'static str,
    source_line: u32,
    timestamp: DateTime<Utc>,
    thread_id: String,
}

impl LogRecord {
    pub fn new(
        module: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        source_file: &'static str,
        source_line: u32,
    ) -> Self {
        LogRecord {
            module: module.into(),
            severity,
            message: message.into(),
            source_file,
            source_line,
            timestamp: Utc::now(),
            thread_id: format!("{:?}", thread::current().id()),
        }
    }

    /// Dot separated hierarchical origin, e.g. `agent.collect.disk`.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_file(&self) -> &'static str {
        self.source_file
    }

    pub fn source_line(&self) -> u32 {
        self.source_line
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}
