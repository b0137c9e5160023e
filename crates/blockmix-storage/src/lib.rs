//! blockmix storage layer
//!
//! Everything that touches the filesystem:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       STORAGE                                │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  CatalogStore ──── add/update/remove ───► blocks.json        │
//! │       │            (write-through, tmp + rename)             │
//! │       ▼                                                      │
//! │  BlockCatalog ───► ReplacementSet ◄──── ProjectSnapshot      │
//! │                          │               (project.json)      │
//! │                          ▼                                   │
//! │                    export_command ───► replace_command.txt   │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All files are JSON except the exported command, which is plain text.

pub mod catalog_store;
pub mod project;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use blockmix_core::ReplaceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog_store::CatalogStore;
pub use project::{export_command, ProjectSnapshot, ReplacementRecord};

// ============================================================================
// Errors
// ============================================================================

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("malformed block catalog {}: {reason}", path.display())]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("malformed project file {}: {reason}", path.display())]
    MalformedProject { path: PathBuf, reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] ReplaceError),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the error is just "the file is not there yet".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the block catalog file.
    pub catalog_path: PathBuf,
    /// Write JSON with two-space indentation.
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("blocks.json"),
            pretty: true,
        }
    }
}

// ============================================================================
// File helpers
// ============================================================================

pub(crate) fn to_json<T: Serialize>(value: &T, pretty: bool) -> StorageResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Write `contents` next to `path` and rename it into place, so readers see
/// either the old file or the new one.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, contents).map_err(|e| StorageError::io(&tmp, e))?;
    if let Err(err) = fs::rename(&tmp, path) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp file");
        }
        return Err(StorageError::io(path, err));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("blockmix"));
    name.push(".tmp");
    path.with_file_name(name)
}
