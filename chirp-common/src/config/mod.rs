//! Process configuration for chirp.
//!
//! Values resolve from built-in defaults, then `CHIRP_*` environment
//! variables, then command-line flags. Each resolved value remembers where it
//! came from. None of this affects which settings file is chosen; that is
//! decided by [`crate::paths`] from `HOME` and friends alone.

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use crate::lock::DEFAULT_LOCK_TIMEOUT;
use crate::logging::{LogConfig, LogFormat};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChirpConfig {
    /// How long to wait for the settings lock.
    #[serde(with = "sourced_duration")]
    pub lock_timeout: Sourced<Duration>,
    /// Executable path written into generated hooks.
    pub exec_path: Sourced<Option<String>>,
    pub log_level: Sourced<String>,
    pub log_format: Sourced<LogFormat>,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Sourced::default_value(DEFAULT_LOCK_TIMEOUT),
            exec_path: Sourced::default_value(None),
            log_level: Sourced::default_value(DEFAULT_LOG_LEVEL.to_string()),
            log_format: Sourced::default_value(LogFormat::default()),
        }
    }
}

impl ChirpConfig {
    /// Parse the environment, returning the config and every invalid value.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let config = Self {
            lock_timeout: parser.get_duration("LOCK_TIMEOUT", DEFAULT_LOCK_TIMEOUT),
            exec_path: parser.get_optional_string("EXEC_PATH"),
            log_level: parser.get_log_filter("LOG", DEFAULT_LOG_LEVEL),
            log_format: parser.get_log_format("LOG_FORMAT", LogFormat::default()),
        };
        (config, parser.take_errors())
    }

    /// Logging setup for this configuration.
    pub fn log_config(&self) -> LogConfig {
        LogConfig::new(self.log_level.value.clone()).with_format(self.log_format.value)
    }

    /// Apply command-line overrides; `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        lock_timeout: Option<Duration>,
        exec_path: Option<String>,
    ) -> Self {
        self.lock_timeout = self.lock_timeout.override_with(lock_timeout);
        if exec_path.is_some() {
            self.exec_path = Sourced::from_cli(exec_path);
        }
        self
    }
}

mod sourced_duration {
    use super::Sourced;
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Sourced<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .clone()
            .map(|d| humantime::format_duration(d).to_string())
            .serialize(serializer)
    }
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
