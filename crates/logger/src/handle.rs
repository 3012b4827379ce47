use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crate::{FileConfigurator, LogConsumer, LogRecord, Mediator, Severity};

/// Per-module front end handed to call sites.
///
/// Carries the module's aggregated threshold cached next to the config
/// version it was computed under, so the hot path can drop a record nobody
/// would accept without building it or touching any lock. The cache is
/// refreshed whenever the configurator version moves.
pub struct LogHandle {
    module: String,
    mediator: Arc<Mediator>,
    configurator: Arc<FileConfigurator>,
    cached_version: AtomicU64,
    cached_threshold: AtomicU8,
}

impl LogHandle {
    pub fn new(
        module: impl Into<String>,
        mediator: Arc<Mediator>,
        configurator: Arc<FileConfigurator>,
    ) -> Self {
        LogHandle {
            module: module.into(),
            mediator,
            configurator,
            // Anything but a real version, so the first use refreshes.
            cached_version: AtomicU64::new(u64::MAX),
            cached_threshold: AtomicU8::new(Severity::NotSet as u8),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Submit one record. The severity check against the cached threshold is
    /// the only work done for records that nobody would accept.
    pub fn log(
        &self,
        severity: Severity,
        message: impl Into<String>,
        source_file: &'static str,
        source_line: u32,
    ) {
        if severity == Severity::NotSet || severity < self.effective_severity() {
            return;
        }
        let record = LogRecord::new(&self.module, severity, message, source_file, source_line);
        self.mediator.log_item(&record);
    }

    /// The aggregated threshold for this handle's module, refreshed when the
    /// configuration version changes.
    pub fn effective_severity(&self) -> Severity {
        let version = self.configurator.config_version();
        if self.cached_version.load(Ordering::Acquire) != version {
            let severity = self.mediator.effective_severity(&self.module);
            self.cached_threshold.store(severity as u8, Ordering::Release);
            self.cached_version.store(version, Ordering::Release);
        }
        Severity::from_raw(self.cached_threshold.load(Ordering::Acquire))
    }
}
