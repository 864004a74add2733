//! Whole-document JSON file access.

use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracker_core::{Error, Result};

/// Reads a JSON document.
///
/// A missing file yields the default. A malformed file also yields the
/// default, with a warning; it is overwritten by the next write.
pub async fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(Error::storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    match serde_json::from_slice(&bytes) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed ledger file, starting empty");
            Ok(T::default())
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a JSON document to a temp file then renames it over `path`.
pub async fn write_atomic<T>(path: &Path, doc: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(doc)?;
    let tmp = temp_path(path);

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| Error::storage(format!("Failed to write {}: {}", tmp.display(), e)))?;

    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        Error::storage(format!(
            "Failed to replace {}: {}",
            path.display(),
            e
        ))
    })
}
