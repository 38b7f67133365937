//! Filesystem capability used by document I/O and the lock manager.
//!
//! Components never touch `std::fs` directly; they receive a [`FileSystem`]
//! at call time. [`OsFs`] is the real disk, [`MemoryFs`] is an in-memory
//! stand-in with per-operation fault injection for tests.

mod memory;
mod os;

pub use memory::{FaultOp, MemoryFs};
pub use os::OsFs;

use std::io;
use std::path::{Path, PathBuf};

/// Mode used for newly created settings files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode used for directories created on the way to a settings file.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// The subset of `stat` the core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Permission bits (`0o777` mask).
    pub mode: u32,
}

/// Minimal filesystem operation set.
pub trait FileSystem: Send + Sync {
    /// Stat a file. `Ok(None)` when it does not exist.
    fn metadata(&self, path: &Path) -> io::Result<Option<FileMeta>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write `data` to a new, uniquely named file inside `dir` and return its path.
    ///
    /// The name starts with `.{prefix}.` so temp files sort next to their target.
    fn write_temp(&self, dir: &Path, prefix: &str, data: &[u8]) -> io::Result<PathBuf>;

    /// Atomically replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Create `path` with `data`, failing with [`io::ErrorKind::AlreadyExists`]
    /// if it is already present.
    fn create_exclusive(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// Temp-file name for a write into `dir`.
pub(crate) fn temp_file_name(prefix: &str) -> String {
    format!(".{}.{}.tmp", prefix, uuid::Uuid::new_v4().simple())
}
