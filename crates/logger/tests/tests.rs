use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use logger::{
    trace, Backend, FileBackend, FileConfigurator, LogConsumer, LogHandle, LogPolicy, LogRecord,
    Mediator, Severity,
};
use tempfile::TempDir;

#[derive(Debug, PartialEq)]
enum Event {
    Record(String),
    Rotate,
}

/// Consumer that reports a fixed severity and forwards everything it sees
/// over a channel.
struct ChannelConsumer {
    severity: Severity,
    events: Sender<Event>,
}

impl ChannelConsumer {
    fn new(severity: Severity, events: Sender<Event>) -> Self {
        ChannelConsumer { severity, events }
    }
}

impl LogConsumer for ChannelConsumer {
    fn log_item(&self, record: &LogRecord) {
        let _ = self.events.send(Event::Record(record.message().to_string()));
    }

    fn effective_severity(&self, _module: &str) -> Severity {
        self.severity
    }

    fn handle_log_rotate(&self) {
        let _ = self.events.send(Event::Rotate);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn record(module: &str, severity: Severity, message: &str) -> LogRecord {
    LogRecord::new(module, severity, message, file!(), line!())
}

fn test_policy(dir: &Path, refresh_ms: u64) -> LogPolicy {
    LogPolicy {
        config_file: dir.join("log.conf"),
        default_log_file: dir.join("default.log"),
        default_severity: Severity::Info,
        refresh_interval: Duration::from_millis(refresh_ms),
    }
}

#[test]
fn mediator_fans_out_to_every_consumer() {
    let mediator = Mediator::new();
    let (tx_a, rx_a) = unbounded();
    let (tx_b, rx_b) = unbounded();
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Trace, tx_a)));
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Error, tx_b)));

    mediator.log_item(&record("a.b", Severity::Info, "fan out"));

    assert_eq!(rx_a.try_recv().unwrap(), Event::Record("fan out".to_string()));
    assert_eq!(rx_b.try_recv().unwrap(), Event::Record("fan out".to_string()));
}

#[test]
fn mediator_aggregates_the_minimum_severity() {
    let mediator = Mediator::new();
    assert_eq!(mediator.effective_severity("any"), Severity::Suppress);

    let (tx, _rx) = unbounded();
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Warning, tx.clone())));
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Trace, tx.clone())));
    assert_eq!(mediator.effective_severity("any"), Severity::Trace);

    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Hysterical, tx)));
    assert_eq!(mediator.effective_severity("any"), Severity::Hysterical);
}

#[test]
fn mediator_register_and_deregister_have_set_semantics() {
    let mediator = Mediator::new();
    let (tx, rx) = unbounded();
    let consumer: Arc<dyn LogConsumer> =
        Arc::new(ChannelConsumer::new(Severity::Trace, tx));

    assert!(mediator.register_consumer(Arc::clone(&consumer)));
    assert!(mediator.register_consumer(Arc::clone(&consumer)));

    mediator.log_item(&record("m", Severity::Info, "once"));
    assert_eq!(rx.try_recv().unwrap(), Event::Record("once".to_string()));
    assert!(rx.try_recv().is_err(), "duplicate registration must not double-deliver");

    assert!(mediator.deregister_consumer(&consumer));
    assert!(!mediator.deregister_consumer(&consumer));

    mediator.log_item(&record("m", Severity::Info, "gone"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn mediator_forwards_rotate_to_every_consumer() {
    let mediator = Mediator::new();
    let (tx, rx) = unbounded();
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Trace, tx)));

    mediator.handle_log_rotate();
    assert_eq!(rx.try_recv().unwrap(), Event::Rotate);
}

/// Consumer that calls back into the mediator from inside the dispatch.
struct ReentrantConsumer {
    mediator: OnceLock<Arc<Mediator>>,
}

impl LogConsumer for ReentrantConsumer {
    fn log_item(&self, record: &LogRecord) {
        if let Some(mediator) = self.mediator.get() {
            mediator.log_item(record);
        }
    }

    fn effective_severity(&self, _module: &str) -> Severity {
        Severity::Suppress
    }

    fn handle_log_rotate(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
#[should_panic(expected = "reentrant acquisition")]
fn reentrant_dispatch_into_the_mediator_fails_fast() {
    let mediator = Arc::new(Mediator::new());
    let consumer = Arc::new(ReentrantConsumer {
        mediator: OnceLock::new(),
    });
    consumer.mediator.set(Arc::clone(&mediator)).ok();
    mediator.register_consumer(consumer);

    mediator.log_item(&record("m", Severity::Error, "boom"));
}

#[test]
fn parsed_configuration_drives_effective_severities() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 60_000);
    let log_path = dir.path().join("example.log");
    fs::write(
        &policy.config_file,
        format!(
            "FILE (\nPATH: {}\nMODULE: WARNING\nMODULE: some.module TRACE\n)\n",
            log_path.display()
        ),
    )
    .unwrap();

    let mediator = Arc::new(Mediator::new());
    let configurator = FileConfigurator::new(Arc::clone(&mediator), policy);

    let backends = configurator.backends();
    assert_eq!(backends.len(), 1);
    let file_backend = backends[0]
        .as_any()
        .downcast_ref::<FileBackend>()
        .expect("the FILE block must produce a file backend");
    assert_eq!(file_backend.path(), log_path);

    assert_eq!(
        mediator.effective_severity("some.module"),
        Severity::Trace
    );
    assert_eq!(
        mediator.effective_severity("some.module.child"),
        Severity::Trace
    );
    assert_eq!(
        mediator.effective_severity("other.module"),
        Severity::Warning
    );
    assert_eq!(
        configurator.min_active_severity_threshold(),
        Severity::Trace
    );
}

#[test]
fn invalid_configuration_falls_back_to_one_default_backend() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 60_000);
    // A valid STDOUT block followed by a FILE block missing its closing
    // paren; the truncated block fails the whole parse.
    fs::write(
        &policy.config_file,
        "STDOUT (\nMODULE: ERROR\n)\nFILE (\nPATH: /tmp/partial.log\n",
    )
    .unwrap();
    let default_log_file = policy.default_log_file.clone();

    let mediator = Arc::new(Mediator::new());
    let configurator = FileConfigurator::new(Arc::clone(&mediator), policy);

    let backends = configurator.backends();
    assert_eq!(backends.len(), 1, "partially accepted backends must be torn down");
    let file_backend = backends[0]
        .as_any()
        .downcast_ref::<FileBackend>()
        .expect("the fallback must be a file backend");
    assert_eq!(file_backend.path(), default_log_file);
    assert_eq!(backends[0].effective_severity("any.module"), Severity::Info);
    assert_eq!(configurator.config_version(), 1);

    // Removing the fallback leaves nothing: the accepted STDOUT block was
    // deregistered along with the rest of the failed parse.
    let fallback: Arc<dyn LogConsumer> = backends[0].clone();
    assert!(mediator.deregister_consumer(&fallback));
    assert_eq!(mediator.effective_severity("any"), Severity::Suppress);
}

#[test]
fn config_version_moves_only_on_observable_change() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 60_000);
    let mediator = Arc::new(Mediator::new());
    let configurator = FileConfigurator::new(mediator, policy);

    let base = configurator.config_version();
    assert_eq!(base, 1);

    configurator.set_severity_threshold("x.y", Severity::Trace);
    assert_eq!(configurator.config_version(), base + 1);

    // Same value again: no observable change, no version bump.
    configurator.set_severity_threshold("x.y", Severity::Trace);
    assert_eq!(configurator.config_version(), base + 1);

    configurator.clear_severity_threshold("x.y");
    assert_eq!(configurator.config_version(), base + 2);

    configurator.clear_severity_threshold("x.y");
    assert_eq!(configurator.config_version(), base + 2);

    // Restore always bumps, even when the resulting state is identical.
    configurator.restore_configuration();
    assert_eq!(configurator.config_version(), base + 3);
    configurator.restore_configuration();
    assert_eq!(configurator.config_version(), base + 4);
}

#[test]
fn min_active_threshold_is_lowered_on_set_and_recomputed_on_clear() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 60_000);
    let mediator = Arc::new(Mediator::new());
    let configurator = FileConfigurator::new(mediator, policy);

    assert_eq!(configurator.min_active_severity_threshold(), Severity::Info);
    assert_eq!(
        configurator.min_active_severity_threshold().config_name(),
        "INFO"
    );

    configurator.set_severity_threshold("x.y", Severity::Trace);
    assert_eq!(configurator.min_active_severity_threshold(), Severity::Trace);

    configurator.clear_severity_threshold("x.y");
    assert_eq!(configurator.min_active_severity_threshold(), Severity::Info);
}

#[test]
fn rewriting_the_config_file_triggers_a_live_reload() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 50);
    let log_path = dir.path().join("live.log");
    fs::write(
        &policy.config_file,
        format!("FILE (\nPATH: {}\nMODULE: ERROR\n)\n", log_path.display()),
    )
    .unwrap();

    let mediator = Arc::new(Mediator::new());
    let configurator = FileConfigurator::new(Arc::clone(&mediator), policy.clone());
    let version = configurator.config_version();
    assert_eq!(mediator.effective_severity("any"), Severity::Error);

    // Filesystems with coarse mtime resolution need the rewrite to land in
    // a later second than the first write.
    thread::sleep(Duration::from_millis(1100));
    fs::write(
        &policy.config_file,
        format!("FILE (\nPATH: {}\nMODULE: TRACE\n)\n", log_path.display()),
    )
    .unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while configurator.config_version() == version {
        assert!(
            std::time::Instant::now() < deadline,
            "reload did not happen within the deadline"
        );
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(mediator.effective_severity("any"), Severity::Trace);
}

#[test]
fn file_backend_writes_header_and_formatted_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("format.log");
    let backend = FileBackend::with_path(&path);
    backend.set_severity_threshold("", Severity::Trace);

    backend.log_item(&record("agent.collect.disk", Severity::Info, "tab\there"));

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("*\n* Monitoring Agent Log\n"));
    assert!(contents.contains(&format!("* Process id: {}\n", std::process::id())));
    assert!(contents.contains("* Log format: <date> <severity>"));
    assert!(!contents.contains("* Log file number:"));

    let line = contents.lines().last().unwrap();
    assert!(line.contains("Info      "));
    assert!(line.contains("[agent.collect.disk:"));
    assert!(line.contains("tab[0x009]here"));
    assert!(line.ends_with("(* Message contained unprintable (?) characters *)"));
}

#[test]
fn file_backend_rotation_reopens_with_updated_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rotate.log");
    let backend = FileBackend::with_path(&path);
    backend.set_severity_threshold("", Severity::Info);

    backend.log_item(&record("m", Severity::Info, "before rotation"));
    backend.handle_log_rotate();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("* Log file number: 2"));
    assert!(contents.contains("Log rotation complete"));
}

#[test]
fn rejected_records_never_touch_the_file_system() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("untouched.log");
    let backend = FileBackend::with_path(&path);
    backend.set_severity_threshold("", Severity::Error);

    backend.log_item(&record("m", Severity::Info, "dropped"));

    assert!(!path.exists(), "the file opens lazily on the first accepted write");
}

#[test]
fn handle_skips_cheaply_and_refreshes_when_the_version_moves() {
    let dir = TempDir::new().unwrap();
    let policy = test_policy(dir.path(), 60_000);
    let mediator = Arc::new(Mediator::new());
    let configurator = Arc::new(FileConfigurator::new(Arc::clone(&mediator), policy));

    let (tx, rx) = unbounded();
    mediator.register_consumer(Arc::new(ChannelConsumer::new(Severity::Suppress, tx)));

    let handle = LogHandle::new(
        "agent.collect.process",
        Arc::clone(&mediator),
        Arc::clone(&configurator),
    );
    assert_eq!(handle.effective_severity(), Severity::Info);

    trace!(handle, "below threshold {}", 1);
    assert!(rx.try_recv().is_err());

    configurator.set_severity_threshold("", Severity::Trace);
    trace!(handle, "now accepted {}", 2);
    assert_eq!(
        rx.try_recv().unwrap(),
        Event::Record("now accepted 2".to_string())
    );
}
