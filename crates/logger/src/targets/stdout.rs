use std::any::Any;
use std::io::Write;

use super::line_prefix;
use crate::{
    Backend, ConfigurableBackend, LogConsumer, LogRecord, NonReentrantMutex, Severity,
    SeverityFilter,
};

/// Backend writing formatted records straight to standard output. Always
/// initialized, no configurable properties, no header block.
pub struct StdoutBackend {
    filter: NonReentrantMutex<SeverityFilter>,
}

impl StdoutBackend {
    pub fn new() -> Self {
        StdoutBackend {
            filter: NonReentrantMutex::new(SeverityFilter::new()),
        }
    }
}

impl Default for StdoutBackend {
    fn default() -> Self {
        StdoutBackend::new()
    }
}

impl LogConsumer for StdoutBackend {
    fn log_item(&self, record: &LogRecord) {
        let filter = self.filter.lock();
        if filter.is_loggable(record) {
            let _ = writeln!(
                std::io::stdout(),
                "{}{}",
                line_prefix(record),
                record.message()
            );
        }
    }

    fn effective_severity(&self, module: &str) -> Severity {
        self.filter.lock().severity_threshold(module)
    }

    /// Nothing to rotate for a console stream.
    fn handle_log_rotate(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConfigurableBackend for StdoutBackend {
    fn set_property(&self, _key: &str, _value: &str) {}

    fn is_initialized(&self) -> bool {
        true
    }
}

impl Backend for StdoutBackend {
    fn set_severity_threshold(&self, module: &str, severity: Severity) -> bool {
        self.filter.lock().set_severity_threshold(module, severity)
    }

    fn clear_severity_threshold(&self, module: &str) -> bool {
        self.filter.lock().clear_severity_threshold(module)
    }

    fn min_active_severity_threshold(&self) -> Severity {
        self.filter.lock().min_active_severity_threshold()
    }
}
