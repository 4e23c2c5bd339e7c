//! Whole-document JSON persistence
//!
//! Every store in the crate keeps its full state in memory and rewrites the
//! complete file after each mutation. A missing file is a fresh start, not an
//! error.

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Load a JSON document, or `T::default()` when the file does not exist.
pub fn load_json_or_default<T>(path: &Path) -> StorageResult<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!("No state at {}, starting fresh", path.display());
        return Ok(T::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite `path` with the pretty-printed JSON of `value`.
///
/// The document is written to a sibling temp file and renamed into place, so
/// readers never see a half-written file.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, json.as_bytes())?;
    debug!("Saved {}", path.display());
    Ok(())
}

/// Write `bytes` to `path` via temp file + rename, creating parent dirs.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
