mod file;
mod stdout;

pub use file::FileBackend;
pub use stdout::StdoutBackend;

use chrono::SecondsFormat;

use crate::{LogRecord, Severity};

/// Severity column of a log line, padded to 10 characters. Severities above
/// `Error` have no label and render numerically.
fn severity_label(severity: Severity) -> String {
    let name = match severity {
        Severity::NotSet => "NotSet",
        Severity::Hysterical => "Hysterical",
        Severity::Trace => "Trace",
        Severity::Info => "Info",
        Severity::Warning => "Warning",
        Severity::Error => "Error",
        other => return format!("Unknown {}", other as u8),
    };
    format!("{:<10}", name)
}

/// Everything before the message:
/// `<timestamp> <severity> [<module>:<line>:<pid>:<tid>] `
fn line_prefix(record: &LogRecord) -> String {
    format!(
        "{} {} [{}:{}:{}:{}] ",
        record.timestamp().to_rfc3339_opts(SecondsFormat::Micros, true),
        severity_label(record.severity()),
        record.module(),
        record.source_line(),
        std::process::id(),
        record.thread_id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_padded_to_ten_characters() {
        assert_eq!(severity_label(Severity::Info), "Info      ");
        assert_eq!(severity_label(Severity::Hysterical), "Hysterical");
        assert_eq!(severity_label(Severity::Warning), "Warning   ");
    }

    #[test]
    fn out_of_range_severities_render_numerically() {
        assert_eq!(severity_label(Severity::Suppress), "Unknown 6");
    }

    #[test]
    fn prefix_carries_module_line_pid_and_thread() {
        let record = LogRecord::new("a.b", Severity::Error, "x", file!(), 42);
        let prefix = line_prefix(&record);
        let expected = format!("[a.b:42:{}:{}] ", std::process::id(), record.thread_id());
        assert!(prefix.contains(&expected), "prefix was {:?}", prefix);
        assert!(prefix.contains("Error     "));
    }
}
