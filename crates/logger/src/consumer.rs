use std::any::Any;
use std::sync::Arc;

use crate::{LogRecord, Severity};

/// Anything that can accept log records: concrete backends, but also the
/// mediator itself and the mock consumers used in tests.
pub trait LogConsumer: Send + Sync {
    /// Submit one record. Implementations apply their own filtering; a
    /// rejected record has no side effect. Never fails toward the caller.
    fn log_item(&self, record: &LogRecord);

    /// The threshold a record from `module` would be held against.
    fn effective_severity(&self, module: &str) -> Severity;

    /// React to an external log-rotate notification.
    fn handle_log_rotate(&self);

    fn as_any(&self) -> &dyn Any;
}

/// The configuration surface the generic config reader drives. Split out of
/// [`Backend`] so the reader can build test doubles that implement nothing
/// else.
pub trait ConfigurableBackend: Send + Sync {
    /// Backend specific key/value configuration; unknown keys are silently
    /// ignored.
    fn set_property(&self, key: &str, value: &str);

    /// True once the backend has the minimum configuration to operate.
    fn is_initialized(&self) -> bool;
}

/// A pluggable output sink. Owns a [`SeverityFilter`](crate::SeverityFilter)
/// which the threshold operations delegate to, each under the backend's own
/// lock.
pub trait Backend: LogConsumer + ConfigurableBackend {
    fn set_severity_threshold(&self, module: &str, severity: Severity) -> bool;

    fn clear_severity_threshold(&self, module: &str) -> bool;

    fn min_active_severity_threshold(&self) -> Severity;
}

/// Stable opaque identity of a consumer, used for set membership in the
/// mediator. The `Arc` data pointer survives trait-object upcasting, so a
/// backend deregisters under the same key it registered with.
pub(crate) fn consumer_key(consumer: &Arc<dyn LogConsumer>) -> usize {
    Arc::as_ptr(consumer) as *const () as usize
}
