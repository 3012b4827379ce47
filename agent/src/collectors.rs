use std::fs;

use logger::{trace, warn, LogHandle};

const HIGH_LOAD: f64 = 8.0;

/// One-minute load average from /proc/loadavg.
pub fn sample_load(handle: &LogHandle) {
    let Some(load) = read_load_average() else {
        warn!(handle, "could not read /proc/loadavg");
        return;
    };
    trace!(handle, "load average: {:.2}", load);
    if load >= HIGH_LOAD {
        warn!(handle, "high load average: {:.2}", load);
    }
}

fn read_load_average() -> Option<f64> {
    let contents = fs::read_to_string("/proc/loadavg").ok()?;
    contents.split_whitespace().next()?.parse().ok()
}

/// MemAvailable from /proc/meminfo, in kilobytes.
pub fn sample_memory(handle: &LogHandle) {
    let Some(available_kb) = read_available_memory_kb() else {
        warn!(handle, "could not read /proc/meminfo");
        return;
    };
    trace!(handle, "available memory: {} kB", available_kb);
}

fn read_available_memory_kb() -> Option<u64> {
    let contents = fs::read_to_string("/proc/meminfo").ok()?;
    let line = contents
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    line.split_whitespace().nth(1)?.parse().ok()
}
