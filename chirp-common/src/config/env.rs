//! Environment variable parsing with type safety.
//!
//! Every `CHIRP_*` variable goes through [`EnvParser`], which records invalid
//! values instead of failing so they can all be reported together.

use super::source::Sourced;
use crate::logging::LogFormat;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Invalid duration format.
    #[error("Invalid duration for {var}: {value} ({reason})")]
    InvalidDuration {
        var: String,
        value: String,
        reason: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Type-safe environment variable parser.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser with the CHIRP_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "CHIRP_",
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Get an optional string (None if not set or empty).
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) if value.is_empty() => Sourced::from_env(None, var_name),
            Ok(value) => Sourced::from_env(Some(value), var_name),
            Err(_) => Sourced::default_value(None),
        }
    }

    /// Get a human-readable duration (`250ms`, `10s`, `1m 30s`).
    ///
    /// Zero is rejected; an unparseable value falls back to `default`.
    pub fn get_duration(&mut self, name: &str, default: Duration) -> Sourced<Duration> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match humantime::parse_duration(value.trim()) {
                Ok(d) if !d.is_zero() => Sourced::from_env(d, var_name),
                Ok(_) => {
                    self.errors.push(EnvError::InvalidDuration {
                        var: var_name,
                        value,
                        reason: "must be greater than zero".to_string(),
                    });
                    Sourced::default_value(default)
                }
                Err(e) => {
                    self.errors.push(EnvError::InvalidDuration {
                        var: var_name,
                        value,
                        reason: e.to_string(),
                    });
                    Sourced::default_value(default)
                }
            },
            Err(_) => Sourced::default_value(default),
        }
    }

    /// Get a log filter: a bare level, or `target=level` directives.
    pub fn get_log_filter(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match normalize_log_filter(&value) {
                Some(filter) => Sourced::from_env(filter, var_name),
                None => {
                    self.errors.push(EnvError::InvalidLogLevel {
                        var: var_name,
                        value,
                    });
                    Sourced::default_value(default.to_string())
                }
            },
            Err(_) => Sourced::default_value(default.to_string()),
        }
    }

    /// Get the log output format (`pretty` or `json`).
    pub fn get_log_format(&mut self, name: &str, default: LogFormat) -> Sourced<LogFormat> {
        let var_name = self.var_name(name);
        match env::var(&var_name) {
            Ok(value) => match value.parse::<LogFormat>() {
                Ok(format) => Sourced::from_env(format, var_name),
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: "log format (pretty/json)".to_string(),
                        value,
                    });
                    Sourced::default_value(default)
                }
            },
            Err(_) => Sourced::default_value(default),
        }
    }
}

fn normalize_log_filter(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Some(lower),
        _ if trimmed.contains('=') && EnvFilter::try_new(trimmed).is_ok() => {
            Some(trimmed.to_string())
        }
        _ => None,
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}
