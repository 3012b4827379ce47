use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::Severity;

/// Where the pipeline looks for its configuration and what it does when none
/// is found. The defaults match the installed agent layout; tests and
/// embedders construct their own.
#[derive(Debug, Clone)]
pub struct LogPolicy {
    /// Configuration file watched by the background reload thread.
    pub config_file: PathBuf,
    /// Target of the single fallback backend when no valid config exists.
    pub default_log_file: PathBuf,
    /// Root threshold given to every freshly created backend.
    pub default_severity: Severity,
    /// How often the reload thread re-checks the configuration file.
    pub refresh_interval: Duration,
}

impl Default for LogPolicy {
    fn default() -> Self {
        LogPolicy {
            config_file: PathBuf::from("/etc/opt/agent/log.conf"),
            default_log_file: PathBuf::from("/var/opt/agent/log/agent.log"),
            default_severity: Severity::Info,
            refresh_interval: Duration::from_millis(10_000),
        }
    }
}

impl LogPolicy {
    /// The default policy with `AGENT_LOG_CONF`, `AGENT_LOG_FILE` and
    /// `AGENT_LOG_REFRESH_MS` environment overrides applied.
    pub fn from_env() -> LogPolicy {
        let mut policy = LogPolicy::default();
        if let Ok(path) = env::var("AGENT_LOG_CONF") {
            policy.config_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("AGENT_LOG_FILE") {
            policy.default_log_file = PathBuf::from(path);
        }
        if let Ok(millis) = env::var("AGENT_LOG_REFRESH_MS") {
            if let Ok(millis) = millis.parse::<u64>() {
                policy.refresh_interval = Duration::from_millis(millis);
            }
        }
        policy
    }
}
