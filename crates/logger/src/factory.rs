use std::sync::{Arc, LazyLock};

use crate::{FileConfigurator, LogHandle, LogPolicy, Mediator};

static FACTORY: LazyLock<HandleFactory> = LazyLock::new(HandleFactory::new);

/// Process-wide wiring: one mediator plus one file configurator, built on
/// first use from the environment policy, handing out per-module handles.
/// Also installs the rotate-signal handler on unix.
pub struct HandleFactory {
    mediator: Arc<Mediator>,
    configurator: Arc<FileConfigurator>,
}

impl HandleFactory {
    fn new() -> Self {
        let mediator = Arc::new(Mediator::new());
        let configurator = Arc::new(FileConfigurator::new(
            Arc::clone(&mediator),
            LogPolicy::from_env(),
        ));
        install_log_rotate_handler();
        HandleFactory {
            mediator,
            configurator,
        }
    }

    pub fn instance() -> &'static HandleFactory {
        &FACTORY
    }

    pub fn log_handle(module: impl Into<String>) -> LogHandle {
        let factory = Self::instance();
        LogHandle::new(
            module,
            Arc::clone(&factory.mediator),
            Arc::clone(&factory.configurator),
        )
    }

    pub fn mediator() -> Arc<Mediator> {
        Arc::clone(&Self::instance().mediator)
    }

    pub fn configurator() -> Arc<FileConfigurator> {
        Arc::clone(&Self::instance().configurator)
    }
}

/// Signal an external log rotation is announced with. SIGCONT, because it is
/// harmless to a process that has no handler installed yet; the HUP/USR
/// family terminates the agent and its collection threads with it.
#[cfg(unix)]
pub const LOG_ROTATE_SIGNAL: libc::c_int = libc::SIGCONT;

#[cfg(unix)]
fn install_log_rotate_handler() {
    unsafe {
        libc::signal(LOG_ROTATE_SIGNAL, handle_log_rotate_signal as libc::sighandler_t);
    }
}

#[cfg(unix)]
extern "C" fn handle_log_rotate_signal(_signal: libc::c_int) {
    use crate::LogConsumer;

    HandleFactory::instance().mediator.handle_log_rotate();
}

#[cfg(not(unix))]
fn install_log_rotate_handler() {}
