use std::collections::BTreeMap;

use crate::{LogRecord, Severity};

/// Per-backend severity threshold table.
///
/// Thresholds are set on exact module paths and inherited by descendant
/// modules: the threshold for `a.b.c` is the explicit entry for `a.b.c`, or
/// failing that the entry for `a.b`, then `a`, then the default. The one
/// exception is `Hysterical`, which is deliberately so verbose that it never
/// propagates downward; an inherited `Hysterical` entry is skipped and the
/// walk continues toward the root.
#[derive(Debug)]
pub struct SeverityFilter {
    default_severity: Severity,
    module_map: BTreeMap<String, Severity>,
}

impl Default for SeverityFilter {
    fn default() -> Self {
        SeverityFilter::new()
    }
}

impl SeverityFilter {
    pub fn new() -> Self {
        SeverityFilter {
            default_severity: Severity::NotSet,
            module_map: BTreeMap::new(),
        }
    }

    /// Whether a record passes this filter. Records with `NotSet` severity
    /// never pass, and neither does anything when the effective threshold
    /// itself is `NotSet`.
    pub fn is_loggable(&self, record: &LogRecord) -> bool {
        if record.severity() == Severity::NotSet {
            return false;
        }
        let threshold = self.severity_threshold(record.module());
        if threshold == Severity::NotSet {
            return false;
        }
        record.severity() >= threshold
    }

    /// Resolve the effective threshold for a module by walking from the full
    /// path toward the root, truncating at the last `.` each step.
    pub fn severity_threshold(&self, module: &str) -> Severity {
        let mut effective = module;
        loop {
            if let Some(&severity) = self.module_map.get(effective) {
                // Hysterical applies only to the exact module it was set on.
                if severity != Severity::Hysterical || effective == module {
                    return severity;
                }
            }
            match effective.rfind('.') {
                Some(dot) => effective = &effective[..dot],
                None => break,
            }
        }
        self.default_severity
    }

    /// Set the threshold for a module; an empty module sets the root
    /// (default) threshold. The root refuses `Hysterical`. Returns whether
    /// the filter actually changed.
    pub fn set_severity_threshold(&mut self, module: &str, severity: Severity) -> bool {
        if module.is_empty() {
            if self.default_severity != severity && severity != Severity::Hysterical {
                self.default_severity = severity;
                return true;
            }
            return false;
        }
        match self.module_map.insert(module.to_string(), severity) {
            Some(previous) => previous != severity,
            None => true,
        }
    }

    /// Remove the explicit threshold for a module; an empty module resets
    /// the root threshold to `NotSet`. Returns whether anything changed.
    pub fn clear_severity_threshold(&mut self, module: &str) -> bool {
        if module.is_empty() {
            if self.default_severity != Severity::NotSet {
                self.default_severity = Severity::NotSet;
                return true;
            }
            return false;
        }
        self.module_map.remove(module).is_some()
    }

    /// The most verbose threshold in effect anywhere in this filter.
    pub fn min_active_severity_threshold(&self) -> Severity {
        let mut min = self.default_severity;
        for &severity in self.module_map.values() {
            if severity < min {
                min = severity;
            }
        }
        min
    }
}
