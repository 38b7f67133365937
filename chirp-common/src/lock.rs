//! Per-file advisory lock guarding settings read-modify-write cycles.
//!
//! Uses a sidecar lock file created with exclusive-create semantics. The file
//! records the holder's PID and acquisition time; if the recorded process is
//! no longer running the lock is considered stale and reclaimed.

use crate::errors::{ChirpError, Result};
use crate::fs::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bound on how long [`FileLock::acquire`] waits.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// How long an unparseable record is treated as live. Covers the window
/// between another process creating the file and writing its record.
const CORRUPT_RECORD_GRACE: Duration = Duration::from_secs(1);

/// Contents of a lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRecord {
    pub pid: u32,
    /// Unix epoch milliseconds at acquisition.
    pub acquired_at_ms: i64,
}

impl LockRecord {
    /// Record for the current process, stamped now.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{} {}\n", self.pid, self.acquired_at_ms)
    }

    /// Parse `"<pid> <millis>"`. A bare PID (older lock files) is accepted
    /// with a zero timestamp.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut parts = contents.split_whitespace();
        let pid = parts.next()?.parse::<u32>().ok()?;
        let acquired_at_ms = match parts.next() {
            Some(ts) => ts.parse::<i64>().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            pid,
            acquired_at_ms,
        })
    }
}

/// A held lock. Released explicitly with [`FileLock::release`] or on drop.
pub struct FileLock<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    path: PathBuf,
    record: LockRecord,
    released: bool,
}

impl<F: FileSystem + ?Sized> std::fmt::Debug for FileLock<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLock")
            .field("path", &self.path)
            .field("record", &self.record)
            .field("released", &self.released)
            .finish()
    }
}

impl<'a, F: FileSystem + ?Sized> FileLock<'a, F> {
    /// Acquire the lock at `path` with [`DEFAULT_LOCK_TIMEOUT`].
    pub fn acquire(fs: &'a F, path: &Path) -> Result<Self> {
        Self::acquire_with_timeout(fs, path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire the lock at `path`, retrying with bounded backoff until `timeout`.
    pub fn acquire_with_timeout(fs: &'a F, path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut backoff = INITIAL_BACKOFF;
        let mut corrupt_since: Option<Instant> = None;

        loop {
            let record = LockRecord::current();
            match fs.create_exclusive(path, record.encode().as_bytes()) {
                Ok(()) => {
                    debug!(path = %path.display(), waited = ?start.elapsed(), "acquired lock");
                    return Ok(Self {
                        fs,
                        path: path.to_path_buf(),
                        record,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(lock_io(path, e)),
            }

            if try_reclaim_stale(fs, path, &mut corrupt_since)? {
                // Retry immediately; another waiter may still win the create.
                continue;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ChirpError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            std::thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> LockRecord {
        self.record
    }

    /// Remove the lock file. Calling this again is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match self.fs.remove(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "released lock");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "lock file vanished before release");
                Ok(())
            }
            Err(e) => Err(lock_io(&self.path, e)),
        }
    }
}

impl<F: FileSystem + ?Sized> Drop for FileLock<'_, F> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to release lock on drop");
        }
    }
}

/// Remove the lock at `path` if its holder is gone. Returns whether a stale
/// lock was removed (or had already disappeared).
fn try_reclaim_stale<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    corrupt_since: &mut Option<Instant>,
) -> Result<bool> {
    let observed = match fs.read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(lock_io(path, e)),
    };

    match LockRecord::parse(&String::from_utf8_lossy(&observed)) {
        Some(record) => {
            *corrupt_since = None;
            if is_process_running(record.pid) {
                return Ok(false);
            }
            warn!(path = %path.display(), pid = record.pid, "reclaiming stale lock");
        }
        None => {
            let first_seen = *corrupt_since.get_or_insert_with(Instant::now);
            if first_seen.elapsed() < CORRUPT_RECORD_GRACE {
                return Ok(false);
            }
            warn!(path = %path.display(), "reclaiming lock with unreadable record");
            *corrupt_since = None;
        }
    }

    claim_stale(fs, path, &observed)
}

/// Move the lock file aside and delete it if it still holds `observed`.
///
/// Only the waiter whose rename succeeds reclaims the lock. A record moved
/// aside that is not `observed` belongs to a newer holder and is put back.
fn claim_stale<F: FileSystem + ?Sized>(fs: &F, path: &Path, observed: &[u8]) -> Result<bool> {
    let aside = stale_path_for(path);
    match fs.rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(lock_io(path, e)),
    }

    let claimed = fs.read(&aside).map_err(|e| lock_io(&aside, e))?;
    if claimed != observed {
        warn!(path = %path.display(), "lock changed hands while reclaiming, restoring it");
        match fs.create_exclusive(path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "lock re-taken before it could be restored");
            }
            Err(e) => return Err(lock_io(path, e)),
        }
    }
    match fs.remove(&aside) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(lock_io(&aside, e)),
    }
    Ok(claimed == observed)
}

/// Unique sibling name a stale lock is moved to before deletion.
fn stale_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".stale.{}", uuid::Uuid::new_v4().simple()));
    PathBuf::from(name)
}

fn lock_io(path: &Path, source: io::Error) -> ChirpError {
    ChirpError::LockIo {
        path: path.to_path_buf(),
        source,
    }
}

/// Check if a process is still running.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(target_os = "linux")]
    {
        // On Linux, check /proc filesystem
        Path::new(&format!("/proc/{}", pid)).exists()
    }

    #[cfg(target_os = "macos")]
    {
        // ps avoids unsafe kill(pid, 0)
        std::process::Command::new("ps")
            .args(["-p", &pid.to_string()])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    {
        // Unknown platform: never treat a lock as stale
        let _ = pid;
        true
    }
}
