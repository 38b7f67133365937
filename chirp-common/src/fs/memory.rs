//! In-memory filesystem with fault injection.

use super::{DEFAULT_FILE_MODE, FileMeta, FileSystem, temp_file_name};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Operations that can be made to fail on a [`MemoryFs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    Metadata,
    Read,
    WriteTemp,
    Rename,
    Remove,
    SetMode,
    CreateDirAll,
    CreateExclusive,
}

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    mode: u32,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MemFile>,
    dirs: BTreeSet<PathBuf>,
    faults: HashSet<FaultOp>,
}

impl State {
    fn check(&self, op: FaultOp) -> io::Result<()> {
        if self.faults.contains(&op) {
            return Err(io::Error::other(format!("injected fault: {op:?}")));
        }
        Ok(())
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        dir.as_os_str().is_empty() || dir.parent().is_none() || self.dirs.contains(dir)
    }

    fn require_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !self.dir_exists(parent) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent directory {} does not exist", parent.display()),
            )),
            _ => Ok(()),
        }
    }
}

/// Thread-safe in-memory [`FileSystem`].
///
/// Directories are tracked explicitly so that writes into a missing parent
/// fail the same way they do on disk. Cross-process locking is out of reach
/// by construction; exclusive-create semantics hold across threads.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not wedge the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file (and its parent directories) with the default mode.
    pub fn with_file(self, path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Self {
        self.insert_file(path, data, DEFAULT_FILE_MODE);
        self
    }

    pub fn insert_file(&self, path: impl AsRef<Path>, data: impl AsRef<[u8]>, mode: u32) {
        let path = path.as_ref();
        let mut state = self.state();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() || ancestor.parent().is_none() {
                continue;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                data: data.as_ref().to_vec(),
                mode,
            },
        );
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(path.as_ref()).map(|f| f.data.clone())
    }

    pub fn contents_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.contents(path)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.state().files.get(path.as_ref()).map(|f| f.mode)
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state().dirs.contains(path.as_ref())
    }

    /// Files directly inside `dir`, sorted.
    pub fn list_dir(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        self.state()
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    /// Make every subsequent `op` fail until [`MemoryFs::clear_faults`].
    pub fn inject_fault(&self, op: FaultOp) {
        self.state().faults.insert(op);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }
}

impl FileSystem for MemoryFs {
    fn metadata(&self, path: &Path) -> io::Result<Option<FileMeta>> {
        let state = self.state();
        state.check(FaultOp::Metadata)?;
        Ok(state.files.get(path).map(|f| FileMeta { mode: f.mode }))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let state = self.state();
        state.check(FaultOp::Read)?;
        state
            .files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write_temp(&self, dir: &Path, prefix: &str, data: &[u8]) -> io::Result<PathBuf> {
        let mut state = self.state();
        state.check(FaultOp::WriteTemp)?;
        if !state.dir_exists(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {} does not exist", dir.display()),
            ));
        }
        let path = dir.join(temp_file_name(prefix));
        state.files.insert(
            path.clone(),
            MemFile {
                data: data.to_vec(),
                mode: DEFAULT_FILE_MODE,
            },
        );
        Ok(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state();
        state.check(FaultOp::Rename)?;
        state.require_parent(to)?;
        let file = state
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, from.display().to_string()))?;
        state.files.insert(to.to_path_buf(), file);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        state.check(FaultOp::Remove)?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut state = self.state();
        state.check(FaultOp::SetMode)?;
        let file = state
            .files
            .get_mut(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        file.mode = mode & 0o777;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path, _mode: u32) -> io::Result<()> {
        let mut state = self.state();
        state.check(FaultOp::CreateDirAll)?;
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || ancestor.parent().is_none() {
                continue;
            }
            if state.files.contains_key(ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", ancestor.display()),
                ));
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn create_exclusive(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        state.check(FaultOp::CreateExclusive)?;
        state.require_parent(path)?;
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                path.display().to_string(),
            ));
        }
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                data: data.to_vec(),
                mode: DEFAULT_FILE_MODE,
            },
        );
        Ok(())
    }
}
