//! Settings document I/O.
//!
//! [`read_document`] tolerates a missing, blank or `null` file (all read as an
//! empty document). [`write_document`] writes through a sibling temp file and
//! renames it over the target, so readers only ever observe the old or the
//! new contents.

use crate::errors::{ChirpError, Result, json_type_tag};
use crate::fs::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, FileSystem};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// An untyped settings document: the root JSON object.
pub type Document = Map<String, Value>;

/// Read and parse the settings document at `path`.
pub fn read_document<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Document> {
    let bytes = match fs.read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file missing, using empty document");
            return Ok(Document::new());
        }
        Err(e) => return Err(ChirpError::io("read", path, e)),
    };
    parse_document(&bytes, path)
}

/// Parse raw settings bytes. `path` is only used for error reporting.
pub fn parse_document(bytes: &[u8], path: &Path) -> Result<Document> {
    let trimmed = trim_ascii_whitespace(bytes);
    if trimmed.is_empty() || trimmed == b"null" {
        return Ok(Document::new());
    }

    let value: Value =
        serde_json::from_slice(trimmed).map_err(|source| ChirpError::MalformedJson {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ChirpError::NotAnObject {
            path: path.to_path_buf(),
            kind: json_type_tag(&other),
        }),
    }
}

/// Serialize with stable two-space indentation and a trailing newline.
pub fn serialize_document(document: &Document) -> String {
    // Alternate Display on a Value is the two-space pretty printer.
    let mut out = format!("{:#}", Value::Object(document.clone()));
    out.push('\n');
    out
}

/// Atomically replace the settings document at `path`.
///
/// The parent directory is created if needed, the existing file's mode is
/// preserved (new files get `0644`), and on any failure after the temp file
/// exists it is removed before the error is returned.
pub fn write_document<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    document: &Document,
) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs.create_dir_all(parent, DEFAULT_DIR_MODE)
        .map_err(|e| ChirpError::io("create directory", parent, e))?;

    let mode = fs
        .metadata(path)
        .map_err(|e| ChirpError::io("stat", path, e))?
        .map(|meta| meta.mode)
        .unwrap_or(DEFAULT_FILE_MODE);

    let content = serialize_document(document);
    let prefix = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".to_string());

    let temp_path = fs
        .write_temp(parent, &prefix, content.as_bytes())
        .map_err(|e| ChirpError::io("write temp file in", parent, e))?;

    let finish = fs
        .set_mode(&temp_path, mode)
        .map_err(|e| ChirpError::io("set mode on", &temp_path, e))
        .and_then(|()| {
            fs.rename(&temp_path, path)
                .map_err(|e| ChirpError::io("replace", path, e))
        });

    if let Err(err) = finish {
        if let Err(cleanup) = fs.remove(&temp_path) {
            warn!(
                temp = %temp_path.display(),
                error = %cleanup,
                "failed to remove temp file after write error"
            );
        }
        return Err(err);
    }

    debug!(
        path = %path.display(),
        mode = format_args!("{mode:o}"),
        bytes = content.len(),
        "wrote settings"
    );
    Ok(())
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
