//! Install, uninstall and status workflows.
//!
//! Every read-modify-write of a settings file happens under its sidecar lock,
//! and every write is followed by a read-back that confirms the file now says
//! what we meant it to say.

use crate::document::{Document, read_document, write_document};
use crate::errors::{ChirpError, Result};
use crate::fs::{DEFAULT_DIR_MODE, FileSystem};
use crate::hooks::{
    DetectedHook, HOOKS_KEY, HookRegistry, HookShape, detect, detect_names, generate, merge,
    remove_agent_hooks,
};
use crate::lock::{DEFAULT_LOCK_TIMEOUT, FileLock};
use crate::paths::{PathResolver, Scope, lock_path_for};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Which workflow produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Install,
    Uninstall,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        })
    }
}

/// What a workflow did to the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The file was rewritten.
    Changed,
    /// The file already had the desired content; nothing was written.
    Unchanged,
    /// Dry run: the file would have been rewritten.
    WouldChange,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::WouldChange => "would change",
        })
    }
}

/// Result of an install or uninstall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub action: Action,
    pub scope: Scope,
    pub path: PathBuf,
    pub outcome: Outcome,
    /// Hook names written (install) or found and removed (uninstall).
    pub hooks: Vec<String>,
}

/// Installation state of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStatus {
    /// Every enabled hook is present in the structured shape.
    Installed,
    /// Some agent hooks are present, but enabled ones are missing or legacy.
    NeedsUpdate,
    /// No agent hooks at all.
    NotInstalled,
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Installed => "installed",
            Self::NeedsUpdate => "needs update",
            Self::NotInstalled => "not installed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub scope: Scope,
    pub path: PathBuf,
    pub exists: bool,
    pub status: HookStatus,
    pub detected: Vec<DetectedHook>,
    /// Enabled registry names with no structured agent entry.
    pub missing: Vec<String>,
}

/// Runs workflows against one filesystem.
pub struct Installer<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    resolver: PathResolver,
    registry: HookRegistry,
    lock_timeout: Duration,
    exec_path: Option<String>,
    dry_run: bool,
}

impl<'a, F: FileSystem + ?Sized> Installer<'a, F> {
    pub fn new(fs: &'a F, resolver: PathResolver) -> Self {
        Self {
            fs,
            resolver,
            registry: HookRegistry::builtin(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            exec_path: None,
            dry_run: false,
        }
    }

    pub fn with_registry(mut self, registry: HookRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Command written into generated hooks; `None` means the running binary.
    pub fn with_exec_path(mut self, exec_path: Option<String>) -> Self {
        self.exec_path = exec_path;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The settings file a workflow for `scope` would operate on.
    pub fn settings_path(&self, scope: Scope) -> Result<PathBuf> {
        self.resolver.select(self.fs, scope)
    }

    /// Register every enabled hook in the settings file for `scope`.
    pub fn install(&self, scope: Scope) -> Result<WorkflowReport> {
        let path = self.settings_path(scope)?;
        let outcome = self.install_at(&path)?;
        let report = WorkflowReport {
            action: Action::Install,
            scope,
            path,
            outcome,
            hooks: self.enabled_names(),
        };
        info!(
            scope = %report.scope,
            path = %report.path.display(),
            outcome = %report.outcome,
            "install finished"
        );
        Ok(report)
    }

    /// Remove every agent-owned hook from the settings file for `scope`.
    pub fn uninstall(&self, scope: Scope) -> Result<WorkflowReport> {
        let path = self.settings_path(scope)?;
        let (outcome, hooks) = self.uninstall_at(&path)?;
        let report = WorkflowReport {
            action: Action::Uninstall,
            scope,
            path,
            outcome,
            hooks,
        };
        info!(
            scope = %report.scope,
            path = %report.path.display(),
            outcome = %report.outcome,
            removed = report.hooks.len(),
            "uninstall finished"
        );
        Ok(report)
    }

    /// Inspect the settings file for `scope` without locking or writing.
    pub fn status(&self, scope: Scope) -> Result<StatusReport> {
        let path = self.settings_path(scope)?;
        let exists = self.fs.exists(&path);
        let document = read_document(self.fs, &path)?;
        let detected = detect(&document);

        let missing: Vec<String> = self
            .registry
            .enabled()
            .filter(|def| {
                !detected
                    .iter()
                    .any(|d| d.name == def.name && d.shape == HookShape::Structured)
            })
            .map(|def| def.name.to_string())
            .collect();
        let has_legacy = detected.iter().any(|d| d.shape == HookShape::LegacyScalar);

        let status = if detected.is_empty() {
            HookStatus::NotInstalled
        } else if missing.is_empty() && !has_legacy {
            HookStatus::Installed
        } else {
            HookStatus::NeedsUpdate
        };
        debug!(%scope, path = %path.display(), %status, "checked hook status");

        Ok(StatusReport {
            scope,
            path,
            exists,
            status,
            detected,
            missing,
        })
    }

    fn install_at(&self, path: &Path) -> Result<Outcome> {
        let parent = parent_dir(path);
        if !self.dry_run {
            self.fs
                .create_dir_all(parent, DEFAULT_DIR_MODE)
                .map_err(|e| ChirpError::io("create directory", parent, e))?;
        }
        self.with_lock(path, || self.install_locked(path))
    }

    fn install_locked(&self, path: &Path) -> Result<Outcome> {
        let current = read_document(self.fs, path)?;
        let hooks_value = generate(self.fs, &self.registry, self.exec_path.as_deref());
        let merged = merge(&current, &hooks_value)?;

        if merged == current && self.fs.exists(path) {
            self.verify_installed(path)?;
            return Ok(Outcome::Unchanged);
        }
        if self.dry_run {
            return Ok(Outcome::WouldChange);
        }

        write_document(self.fs, path, &merged)?;
        self.verify_installed(path)?;
        Ok(Outcome::Changed)
    }

    fn uninstall_at(&self, path: &Path) -> Result<(Outcome, Vec<String>)> {
        if !self.fs.exists(parent_dir(path)) {
            debug!(path = %path.display(), "settings directory absent, nothing to uninstall");
            return Ok((Outcome::Unchanged, Vec::new()));
        }
        self.with_lock(path, || self.uninstall_locked(path))
    }

    fn uninstall_locked(&self, path: &Path) -> Result<(Outcome, Vec<String>)> {
        let current = read_document(self.fs, path)?;
        let detected = detect_names(&current);
        if detected.is_empty() {
            return Ok((Outcome::Unchanged, detected));
        }

        let cleaned = remove_agent_hooks(&current);
        if self.dry_run {
            return Ok((Outcome::WouldChange, detected));
        }

        write_document(self.fs, path, &cleaned)?;
        self.verify_uninstalled(path)?;
        Ok((Outcome::Changed, detected))
    }

    /// Run `body` while holding the sidecar lock for `path`.
    ///
    /// A dry run against a directory that does not exist yet has nothing to
    /// race with and runs unlocked.
    fn with_lock<T>(&self, path: &Path, body: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.dry_run && !self.fs.exists(parent_dir(path)) {
            return body();
        }

        let mut lock =
            FileLock::acquire_with_timeout(self.fs, &lock_path_for(path), self.lock_timeout)?;
        let result = body();
        let released = lock.release();
        let value = result?;
        released?;
        Ok(value)
    }

    fn verify_installed(&self, path: &Path) -> Result<()> {
        let document = self.read_back(path)?;
        let owned = detect(&document);
        for name in self.registry.enabled().map(|def| def.name) {
            let present = owned
                .iter()
                .any(|d| d.name == name && d.shape == HookShape::Structured);
            if !present {
                return Err(ChirpError::VerifyFailed {
                    path: path.to_path_buf(),
                    reason: format!("hook {name} is missing or not owned by chirp"),
                });
            }
        }
        debug!(path = %path.display(), "verified install");
        Ok(())
    }

    fn verify_uninstalled(&self, path: &Path) -> Result<()> {
        let document = self.read_back(path)?;
        let remaining = detect_names(&document);
        if !remaining.is_empty() {
            return Err(ChirpError::VerifyFailed {
                path: path.to_path_buf(),
                reason: format!("agent hooks still present: {}", remaining.join(", ")),
            });
        }
        debug!(path = %path.display(), "verified uninstall");
        Ok(())
    }

    fn read_back(&self, path: &Path) -> Result<Document> {
        let document = read_document(self.fs, path)?;
        match document.get(HOOKS_KEY) {
            Some(hooks) if !hooks.is_object() => Err(ChirpError::VerifyFailed {
                path: path.to_path_buf(),
                reason: "\"hooks\" entry is not an object after write".to_string(),
            }),
            _ => Ok(document),
        }
    }

    fn enabled_names(&self) -> Vec<String> {
        self.registry
            .enabled_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
