//! Shared library for chirp's editor-hook management.
//!
//! Installs and removes chirp's entries in the editor's `settings.json`
//! without disturbing anything else in the file. The pieces:
//!
//! - [`paths`] picks the settings file for a scope.
//! - [`document`] reads it and replaces it atomically.
//! - [`lock`] serializes concurrent writers through a sidecar lock file.
//! - [`hooks`] generates, merges, detects and removes hook entries.
//! - [`install`] ties them into the install, uninstall and status workflows.

pub mod config;
pub mod document;
pub mod errors;
pub mod fs;
pub mod hooks;
pub mod install;
pub mod lock;
pub mod logging;
pub mod paths;

pub use config::{ChirpConfig, ConfigSource, EnvError, EnvParser, Sourced};
pub use document::{Document, read_document, serialize_document, write_document};
pub use errors::{ChirpError, ErrorKind, Result};
pub use fs::{FaultOp, FileSystem, MemoryFs, OsFs};
pub use hooks::{HookDefinition, HookRegistry};
pub use install::{Action, HookStatus, Installer, Outcome, StatusReport, WorkflowReport};
pub use lock::FileLock;
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use paths::{PathResolver, Scope};
