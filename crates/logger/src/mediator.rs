use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::consumer::consumer_key;
use crate::{LogConsumer, LogRecord, NonReentrantMutex, Severity};

/// Fan-out point of the pipeline. Holds the set of registered consumers and
/// forwards every record to all of them; each consumer applies its own
/// filter. Dispatch order across the set is unspecified.
pub struct Mediator {
    consumers: NonReentrantMutex<BTreeMap<usize, Arc<dyn LogConsumer>>>,
}

impl Mediator {
    pub fn new() -> Self {
        Mediator {
            consumers: NonReentrantMutex::new(BTreeMap::new()),
        }
    }

    /// Register a consumer. Registering one that is already present is
    /// idempotent (set semantics).
    pub fn register_consumer(&self, consumer: Arc<dyn LogConsumer>) -> bool {
        let mut consumers = self.consumers.lock();
        consumers.insert(consumer_key(&consumer), consumer);
        true
    }

    /// Remove a consumer. Returns false if it was not registered.
    pub fn deregister_consumer(&self, consumer: &Arc<dyn LogConsumer>) -> bool {
        let mut consumers = self.consumers.lock();
        consumers.remove(&consumer_key(consumer)).is_some()
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Mediator::new()
    }
}

impl LogConsumer for Mediator {
    /// Blocking fan-out: the calling thread dispatches to every registered
    /// consumer before returning.
    fn log_item(&self, record: &LogRecord) {
        let consumers = self.consumers.lock();
        for consumer in consumers.values() {
            consumer.log_item(record);
        }
    }

    /// Minimum across all consumers, short-circuiting on `Hysterical` since
    /// nothing is more verbose. With no consumers, `Suppress`.
    fn effective_severity(&self, module: &str) -> Severity {
        let consumers = self.consumers.lock();
        let mut effective = Severity::Suppress;
        for consumer in consumers.values() {
            let severity = consumer.effective_severity(module);
            if severity < effective {
                effective = severity;
            }
            if effective == Severity::Hysterical {
                return Severity::Hysterical;
            }
        }
        effective
    }

    fn handle_log_rotate(&self) {
        let consumers = self.consumers.lock();
        for consumer in consumers.values() {
            consumer.handle_log_rotate();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
