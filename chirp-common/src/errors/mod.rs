//! Error types for chirp.
//!
//! [`ChirpError`] is the single error type returned by every component of
//! the install/uninstall core. Each variant maps onto one [`ErrorKind`] from
//! the [`catalog`].

pub mod catalog;

pub use catalog::ErrorKind;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the settings core.
#[derive(Debug, Error)]
pub enum ChirpError {
    #[error("invalid scope '{scope}' (expected 'user' or 'project')")]
    InvalidScope { scope: String },

    #[error("could not determine home directory")]
    NoHome,

    #[error("malformed JSON in {path}: {source}")]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings root in {path} is {kind}, expected an object")]
    NotAnObject { path: PathBuf, kind: &'static str },

    #[error("existing \"hooks\" entry is {kind}, expected an object")]
    ExistingHooksInvalid { kind: &'static str },

    #[error("hooks value to merge is {kind}, expected an object")]
    InvalidHooks { kind: &'static str },

    #[error("timed out after {waited:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock {path}: {source}")]
    LockIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("verification of {path} failed: {reason}")]
    VerifyFailed { path: PathBuf, reason: String },
}

impl ChirpError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The catalog entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScope { .. } => ErrorKind::InvalidScope,
            Self::NoHome => ErrorKind::NoHome,
            Self::MalformedJson { .. } => ErrorKind::MalformedJson,
            Self::NotAnObject { .. } => ErrorKind::NotAnObject,
            Self::ExistingHooksInvalid { .. } => ErrorKind::ExistingHooksInvalid,
            Self::InvalidHooks { .. } => ErrorKind::InvalidHooks,
            Self::LockTimeout { .. } => ErrorKind::LockTimeout,
            Self::Io { .. } | Self::LockIo { .. } => ErrorKind::IoError,
            Self::VerifyFailed { .. } => ErrorKind::VerifyFailed,
        }
    }

    /// The file this error is about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::MalformedJson { path, .. }
            | Self::NotAnObject { path, .. }
            | Self::LockTimeout { path, .. }
            | Self::Io { path, .. }
            | Self::LockIo { path, .. }
            | Self::VerifyFailed { path, .. } => Some(path),
            Self::InvalidScope { .. }
            | Self::NoHome
            | Self::ExistingHooksInvalid { .. }
            | Self::InvalidHooks { .. } => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChirpError>;

/// Human-readable type tag for a JSON value that was not the expected shape.
pub fn json_type_tag(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Array(_) => "array",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Object(_) => "object",
        serde_json::Value::Number(_) => "non-object value",
    }
}
