//! Settings-file location for a given scope.
//!
//! User scope resolves under the home directory (with the Windows fallbacks
//! `USERPROFILE`, `HOME`, `HOMEDRIVE`+`HOMEPATH`); project scope resolves
//! under the current working directory. Candidates are ordered
//! most-preferred first.

use crate::errors::{ChirpError, Result};
use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Directory the host editor keeps its configuration in.
pub const EDITOR_DIR: &str = ".claude";

/// Settings file name inside [`EDITOR_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Which settings file a workflow operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Per-user configuration under the home directory.
    User,
    /// Per-repository configuration under the working directory.
    Project,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ChirpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            other => Err(ChirpError::InvalidScope {
                scope: other.to_string(),
            }),
        }
    }
}

/// Home-directory conventions differ between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// The environment variables the resolver consults, captured once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeEnv {
    pub home: Option<String>,
    pub userprofile: Option<String>,
    pub homedrive: Option<String>,
    pub homepath: Option<String>,
}

impl HomeEnv {
    /// Snapshot the process environment.
    ///
    /// When `HOME` is unset on Unix, falls back to the platform's account
    /// database via `dirs`.
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let home = var("HOME").or_else(|| {
            if cfg!(unix) {
                dirs::home_dir().map(|p| p.to_string_lossy().into_owned())
            } else {
                None
            }
        });
        Self {
            home,
            userprofile: var("USERPROFILE"),
            homedrive: var("HOMEDRIVE"),
            homepath: var("HOMEPATH"),
        }
    }
}

/// Resolves candidate settings paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    env: HomeEnv,
    platform: Platform,
    cwd: PathBuf,
}

impl PathResolver {
    pub fn new(env: HomeEnv, platform: Platform, cwd: impl Into<PathBuf>) -> Self {
        Self {
            env,
            platform,
            cwd: cwd.into(),
        }
    }

    /// Resolver for the running process.
    pub fn from_process() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ChirpError::io("read current directory", PathBuf::from("."), e))?;
        Ok(Self::new(HomeEnv::from_process(), Platform::current(), cwd))
    }

    /// Candidate settings paths for `scope`, most-preferred first. Never empty.
    pub fn candidates(&self, scope: Scope) -> Result<Vec<PathBuf>> {
        let candidates = match scope {
            Scope::Project => vec![self.cwd.join(EDITOR_DIR).join(SETTINGS_FILE)],
            Scope::User => match self.platform {
                Platform::Unix => {
                    let home = non_empty(&self.env.home).ok_or(ChirpError::NoHome)?;
                    vec![Path::new(home).join(EDITOR_DIR).join(SETTINGS_FILE)]
                }
                Platform::Windows => self.windows_user_candidates()?,
            },
        };
        debug!(%scope, ?candidates, "resolved settings candidates");
        Ok(candidates)
    }

    fn windows_user_candidates(&self) -> Result<Vec<PathBuf>> {
        let mut bases: Vec<String> = Vec::new();
        if let Some(profile) = non_empty(&self.env.userprofile) {
            bases.push(profile.to_string());
        }
        if let Some(home) = non_empty(&self.env.home) {
            bases.push(normalize_windows_home(home));
        }
        if let (Some(drive), Some(path)) = (
            non_empty(&self.env.homedrive),
            non_empty(&self.env.homepath),
        ) {
            bases.push(format!("{drive}{path}"));
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        for base in bases {
            let candidate = PathBuf::from(windows_join(&base, &[EDITOR_DIR, SETTINGS_FILE]));
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        if candidates.is_empty() {
            return Err(ChirpError::NoHome);
        }
        Ok(candidates)
    }

    /// The first candidate that exists, or the most-preferred one if none do.
    pub fn select<F: FileSystem + ?Sized>(&self, fs: &F, scope: Scope) -> Result<PathBuf> {
        let candidates = self.candidates(scope)?;
        select_existing(fs, &candidates).ok_or(ChirpError::NoHome)
    }
}

/// First existing path in `candidates`, else the first one. `None` only when empty.
pub fn select_existing<F: FileSystem + ?Sized>(fs: &F, candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|p| fs.exists(p))
        .or_else(|| candidates.first())
        .cloned()
}

/// Sidecar lock path for a settings file: `<settings>.lock`.
pub fn lock_path_for(settings: &Path) -> PathBuf {
    let mut name = settings.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Rewrite shell-style drive prefixes (`/c/Users/me`) to `C:\Users\me`.
///
/// Anything that does not look like `/X` or `/X/...` is returned with
/// forward slashes turned into backslashes.
pub fn normalize_windows_home(home: &str) -> String {
    let bytes = home.as_bytes();
    let has_drive_prefix = bytes.len() >= 2
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && (bytes.len() == 2 || bytes[2] == b'/');
    if has_drive_prefix {
        let drive = (bytes[1] as char).to_ascii_uppercase();
        let rest = home[2..].trim_start_matches('/').replace('/', "\\");
        return format!("{drive}:\\{rest}");
    }
    home.replace('/', "\\")
}

fn windows_join(base: &str, parts: &[&str]) -> String {
    let mut out = base.trim_end_matches(['\\', '/']).to_string();
    for part in parts {
        out.push('\\');
        out.push_str(part);
    }
    out
}
