use std::thread;
use std::time::Duration;

use dotenv::dotenv;
use logger::{info, HandleFactory, LogHandle};

mod collectors;

const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 30_000;

fn main() {
    dotenv().ok();

    let handle = logger::log_handle("agent.main");
    info!(handle, "monitoring agent {} starting", env!("CARGO_PKG_VERSION"));

    let configurator = HandleFactory::configurator();
    info!(
        handle,
        "log configuration version {}, most verbose threshold {}",
        configurator.config_version(),
        configurator.min_active_severity_threshold().config_name()
    );

    let interval = sample_interval();
    let mut workers = Vec::new();
    for (name, module, sample) in [
        (
            "collect-load",
            "agent.collect.load",
            collectors::sample_load as fn(&LogHandle),
        ),
        (
            "collect-memory",
            "agent.collect.memory",
            collectors::sample_memory as fn(&LogHandle),
        ),
    ] {
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let handle = logger::log_handle(module);
                loop {
                    sample(&handle);
                    thread::sleep(interval);
                }
            })
            .expect("failed to spawn collector thread");
        workers.push(worker);
    }

    for worker in workers {
        let _ = worker.join();
    }
}

fn sample_interval() -> Duration {
    std::env::var("AGENT_SAMPLE_MS")
        .ok()
        .and_then(|millis| millis.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS))
}
