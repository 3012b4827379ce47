/// Severity of a log record or of a filtering threshold.
///
/// The ordering is significant: lower values are more verbose. `NotSet` and
/// `Suppress` are sentinels. A record carrying `NotSet` means "unclassified"
/// and is never logged; `Suppress` is only meaningful as a threshold that
/// rejects everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    NotSet = 0,
    Hysterical = 1,
    Trace = 2,
    Info = 3,
    Warning = 4,
    Error = 5,
    Suppress = 6,
}

impl Severity {
    /// Translate a configuration file token. Tokens are case sensitive;
    /// anything unrecognized maps to `NotSet`.
    pub fn from_config_token(token: &str) -> Severity {
        match token {
            "HYSTERICAL" => Severity::Hysterical,
            "TRACE" => Severity::Trace,
            "INFO" => Severity::Info,
            "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            "SUPPRESS" => Severity::Suppress,
            _ => Severity::NotSet,
        }
    }

    /// The name used in configuration files and on the configurator surface.
    pub fn config_name(self) -> &'static str {
        match self {
            Severity::NotSet => "NOTSET",
            Severity::Hysterical => "HYSTERICAL",
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Suppress => "SUPPRESS",
        }
    }

    pub(crate) fn from_raw(raw: u8) -> Severity {
        match raw {
            1 => Severity::Hysterical,
            2 => Severity::Trace,
            3 => Severity::Info,
            4 => Severity::Warning,
            5 => Severity::Error,
            6 => Severity::Suppress,
            _ => Severity::NotSet,
        }
    }
}
