//! Error catalog for chirp.
//!
//! Every failure a workflow can surface maps onto exactly one [`ErrorKind`].
//! Each kind carries a stable name (printed in diagnostics), a numeric code
//! in the `CHIRP-Exxx` format and a short remediation hint.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                          |
//! |------------|-------------|--------------------------------------|
//! | E001-E009  | Input       | Invalid invocation or environment    |
//! | E010-E019  | Document    | Settings document shape problems     |
//! | E020-E029  | Lock        | Per-file lock contention             |
//! | E030-E039  | Filesystem  | Underlying I/O failures              |
//! | E040-E049  | Verify      | Post-write read-back mismatches      |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error kinds surfaced by the install/uninstall workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Scope not one of `user` or `project`
    InvalidScope,
    /// Home directory could not be determined
    NoHome,
    /// Settings file exists but is not valid JSON
    MalformedJson,
    /// Settings file is valid JSON but the root is not an object
    NotAnObject,
    /// The document's `hooks` key is present but not a mapping
    ExistingHooksInvalid,
    /// The hooks value handed to the merge engine is not a mapping
    InvalidHooks,
    /// The per-file lock could not be acquired before the deadline
    LockTimeout,
    /// Underlying filesystem failure
    IoError,
    /// Post-write read-back did not show the expected state
    VerifyFailed,
}

impl ErrorKind {
    /// All kinds, in code order.
    pub const ALL: [ErrorKind; 9] = [
        Self::InvalidScope,
        Self::NoHome,
        Self::MalformedJson,
        Self::NotAnObject,
        Self::ExistingHooksInvalid,
        Self::InvalidHooks,
        Self::LockTimeout,
        Self::IoError,
        Self::VerifyFailed,
    ];

    /// Stable name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InvalidScope => "InvalidScope",
            Self::NoHome => "NoHome",
            Self::MalformedJson => "MalformedJSON",
            Self::NotAnObject => "NotAnObject",
            Self::ExistingHooksInvalid => "ExistingHooksInvalid",
            Self::InvalidHooks => "InvalidHooks",
            Self::LockTimeout => "LockTimeout",
            Self::IoError => "IOError",
            Self::VerifyFailed => "VerifyFailed",
        }
    }

    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            // Input (001-009)
            Self::InvalidScope => 1,
            Self::NoHome => 2,
            // Document (010-019)
            Self::MalformedJson => 10,
            Self::NotAnObject => 11,
            Self::ExistingHooksInvalid => 12,
            Self::InvalidHooks => 13,
            // Lock (020-029)
            Self::LockTimeout => 20,
            // Filesystem (030-039)
            Self::IoError => 30,
            // Verify (040-049)
            Self::VerifyFailed => 40,
        }
    }

    /// Returns the error code string (e.g. `CHIRP-E010`).
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("CHIRP-E{:03}", self.code_number())
    }

    /// One-line hint printed under the diagnostic.
    #[must_use]
    pub const fn remediation(&self) -> &'static str {
        match self {
            Self::InvalidScope => "pass --scope user or --scope project",
            Self::NoHome => "set HOME (or USERPROFILE on Windows) and retry",
            Self::MalformedJson => "fix the JSON syntax in the settings file, then retry",
            Self::NotAnObject => "the settings file must contain a JSON object at the top level",
            Self::ExistingHooksInvalid => {
                "the \"hooks\" entry in the settings file must be a JSON object"
            }
            Self::InvalidHooks => "internal error: generated hooks were not a mapping",
            Self::LockTimeout => {
                "another chirp process is editing this file; retry or raise CHIRP_LOCK_TIMEOUT"
            }
            Self::IoError => "check permissions and free space for the settings directory",
            Self::VerifyFailed => "re-run the command; if it persists, inspect the settings file",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
