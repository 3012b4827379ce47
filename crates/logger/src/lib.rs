//! Structured-logging pipeline of the monitoring agent.
//!
//! Records flow from per-module [`LogHandle`]s through the [`Mediator`] to
//! every registered backend, each of which applies its own hierarchical
//! [`SeverityFilter`]. The [`FileConfigurator`] owns the live backend set
//! and hot-reloads the configuration file from a background thread.

mod config_reader;
mod configurator;
mod consumer;
mod factory;
mod filter;
mod handle;
mod lock;
mod logger_macro;
mod mediator;
mod policy;
mod record;
mod severity;
mod targets;

pub use config_reader::{parse_config_file, ConfigConsumer};
pub use configurator::FileConfigurator;
pub use consumer::{Backend, ConfigurableBackend, LogConsumer};
pub use factory::HandleFactory;
#[cfg(unix)]
pub use factory::LOG_ROTATE_SIGNAL;
pub use filter::SeverityFilter;
pub use handle::LogHandle;
pub use lock::{NonReentrantMutex, NonReentrantMutexGuard};
pub use mediator::Mediator;
pub use policy::LogPolicy;
pub use record::LogRecord;
pub use severity::Severity;
pub use targets::{FileBackend, StdoutBackend};

/// Handle for `module` from the process-wide factory.
pub fn log_handle(module: impl Into<String>) -> LogHandle {
    HandleFactory::log_handle(module)
}
