use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::config_reader::{self, ConfigConsumer};
use crate::targets::{FileBackend, StdoutBackend};
use crate::{Backend, LogConsumer, LogPolicy, Mediator, NonReentrantMutex, Severity};

/// Owns the live set of configured backends and keeps it in sync with the
/// configuration file.
///
/// Construction parses the file, or falls back to a single default file
/// backend when the file is missing or invalid. A dedicated background
/// thread then polls the file's existence and modification time and reruns
/// the whole configuration step when either changes. Dropping the
/// configurator stops and joins that thread before any state is released.
pub struct FileConfigurator {
    shared: Arc<Shared>,
    stop_tx: Sender<()>,
    reload_thread: Option<JoinHandle<()>>,
}

struct Shared {
    mediator: Arc<Mediator>,
    policy: LogPolicy,
    state: NonReentrantMutex<State>,
}

struct State {
    backends: Vec<Arc<dyn Backend>>,
    /// Incremented exactly once per call that produced an observable change.
    config_version: u64,
    /// Minimum over all backends' own minimums; the cheap upstream-skip
    /// threshold.
    min_active: Severity,
    /// What the config file looked like when last loaded.
    snapshot: FileSnapshot,
}

/// Existence plus modification time, enough to detect external edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileSnapshot {
    exists: bool,
    modified: Option<SystemTime>,
}

impl FileSnapshot {
    fn capture(path: &Path) -> FileSnapshot {
        match fs::metadata(path) {
            Ok(metadata) => FileSnapshot {
                exists: true,
                modified: metadata.modified().ok(),
            },
            Err(_) => FileSnapshot {
                exists: false,
                modified: None,
            },
        }
    }
}

impl FileConfigurator {
    pub fn new(mediator: Arc<Mediator>, policy: LogPolicy) -> Self {
        let refresh_interval = policy.refresh_interval;
        let shared = Arc::new(Shared {
            mediator,
            policy,
            state: NonReentrantMutex::new(State {
                backends: Vec::new(),
                config_version: 0,
                min_active: Severity::Suppress,
                snapshot: FileSnapshot {
                    exists: false,
                    modified: None,
                },
            }),
        });

        {
            let mut state = shared.state.lock();
            shared.parse_or_fallback(&mut state);
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let reload_shared = Arc::clone(&shared);
        let reload_thread = thread::Builder::new()
            .name("log-config-reload".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(refresh_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        if reload_shared.configuration_changed() {
                            reload_shared.restore_configuration();
                        }
                    }
                }
            })
            .expect("failed to spawn log-config-reload thread");

        FileConfigurator {
            shared,
            stop_tx,
            reload_thread: Some(reload_thread),
        }
    }

    /// Set a threshold on every configured backend. Bumps the config version
    /// exactly once if any backend actually changed.
    pub fn set_severity_threshold(&self, module: &str, severity: Severity) {
        let mut state = self.shared.state.lock();
        let mut changed = false;
        for backend in &state.backends {
            if backend.set_severity_threshold(module, severity) {
                changed = true;
            }
        }
        if changed {
            if severity < state.min_active {
                state.min_active = severity;
            }
            state.config_version += 1;
        }
    }

    /// Clear a threshold on every configured backend. Clearing may raise the
    /// minimum, so it is recomputed from scratch.
    pub fn clear_severity_threshold(&self, module: &str) {
        let mut state = self.shared.state.lock();
        let mut changed = false;
        for backend in &state.backends {
            if backend.clear_severity_threshold(module) {
                changed = true;
            }
        }
        if changed {
            state.config_version += 1;
            let mut min = Severity::Suppress;
            for backend in &state.backends {
                let severity = backend.min_active_severity_threshold();
                if severity < min {
                    min = severity;
                }
            }
            state.min_active = min;
        }
    }

    pub fn config_version(&self) -> u64 {
        self.shared.state.lock().config_version
    }

    /// The most verbose threshold in effect on any backend. Producers use
    /// this to skip building records nobody will accept.
    pub fn min_active_severity_threshold(&self) -> Severity {
        self.shared.state.lock().min_active
    }

    /// Throw away the current backend set and rerun the parse-or-fallback
    /// step. Always bumps the config version.
    pub fn restore_configuration(&self) {
        self.shared.restore_configuration();
    }

    /// Snapshot of the live backend list, in no particular order.
    pub fn backends(&self) -> Vec<Arc<dyn Backend>> {
        self.shared.state.lock().backends.clone()
    }
}

impl Drop for FileConfigurator {
    fn drop(&mut self) {
        // Wake the reload thread and wait for it to exit; it must not touch
        // configurator state after this returns.
        let _ = self.stop_tx.send(());
        if let Some(reload_thread) = self.reload_thread.take() {
            let _ = reload_thread.join();
        }
    }
}

impl Shared {
    /// Parse the config file into a fresh backend set, or install the single
    /// default backend. Expects `state.backends` to be empty on entry.
    fn parse_or_fallback(&self, state: &mut State) {
        state.snapshot = FileSnapshot::capture(&self.policy.config_file);

        let valid = {
            let mut builder = BackendBuilder {
                mediator: &self.mediator,
                default_severity: self.policy.default_severity,
                state,
            };
            config_reader::parse_config_file(&self.policy.config_file, &mut builder)
        };

        if !valid {
            // A failed parse may have registered some backends before the
            // broken block; tear them down so the fallback is exactly one.
            for backend in state.backends.drain(..) {
                let consumer: Arc<dyn LogConsumer> = backend;
                self.mediator.deregister_consumer(&consumer);
            }

            let fallback = Arc::new(FileBackend::with_path(self.policy.default_log_file.clone()));
            fallback.set_severity_threshold("", self.policy.default_severity);
            let backend: Arc<dyn Backend> = fallback;
            state.backends.push(Arc::clone(&backend));
            self.mediator.register_consumer(backend);
            state.min_active = self.policy.default_severity;
        }

        state.config_version += 1;
    }

    fn restore_configuration(&self) {
        let mut state = self.state.lock();
        for backend in state.backends.drain(..) {
            let consumer: Arc<dyn LogConsumer> = backend;
            self.mediator.deregister_consumer(&consumer);
        }
        state.min_active = Severity::Suppress;
        self.parse_or_fallback(&mut state);
    }

    /// The stat itself runs without the configurator lock; only the snapshot
    /// comparison takes it.
    fn configuration_changed(&self) -> bool {
        let current = FileSnapshot::capture(&self.policy.config_file);
        let state = self.state.lock();
        current != state.snapshot
    }
}

/// The configurator's side of the generic config-reader capability: creates
/// real backends, seeds their root threshold from the policy, and registers
/// accepted ones with the mediator.
struct BackendBuilder<'a> {
    mediator: &'a Mediator,
    default_severity: Severity,
    state: &'a mut State,
}

impl ConfigConsumer<dyn Backend> for BackendBuilder<'_> {
    fn create(&mut self, header: &str) -> Option<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = match header {
            "FILE (" => Arc::new(FileBackend::new()),
            "STDOUT (" => Arc::new(StdoutBackend::new()),
            _ => return None,
        };
        let default_severity = self.default_severity;
        self.set_severity_threshold(&backend, "", default_severity);
        Some(backend)
    }

    fn add(&mut self, backend: Arc<dyn Backend>) {
        self.state.backends.push(Arc::clone(&backend));
        self.mediator.register_consumer(backend);
    }

    fn set_severity_threshold(
        &mut self,
        backend: &Arc<dyn Backend>,
        module: &str,
        severity: Severity,
    ) -> bool {
        if backend.set_severity_threshold(module, severity) {
            if severity < self.state.min_active {
                self.state.min_active = severity;
            }
            return true;
        }
        false
    }
}
