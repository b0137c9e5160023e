//! Write-through persistence for the block catalog.
//!
//! Every mutation is applied to a copy, written to disk, and only then
//! committed in memory. A failed write therefore leaves both the file and the
//! in-memory catalog as they were.

use std::fs;
use std::path::{Path, PathBuf};

use blockmix_core::{BlockCatalog, PropertyMap};

use crate::{to_json, write_atomic, StorageConfig, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
    pretty: bool,
    catalog: BlockCatalog,
}

impl CatalogStore {
    /// Read the catalog at `path`.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open(&StorageConfig {
            catalog_path: path.as_ref().to_path_buf(),
            ..StorageConfig::default()
        })
    }

    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let path = &config.catalog_path;
        let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        let catalog: BlockCatalog =
            serde_json::from_str(&text).map_err(|e| StorageError::MalformedCatalog {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), blocks = catalog.len(), "loaded block catalog");
        Ok(Self {
            path: path.clone(),
            pretty: config.pretty,
            catalog,
        })
    }

    /// Like [`CatalogStore::load`], but an unreadable or malformed file gives
    /// an empty catalog. The error is handed back for the caller to report.
    pub fn load_or_empty(path: impl AsRef<Path>) -> (Self, Option<StorageError>) {
        Self::open_or_empty(&StorageConfig {
            catalog_path: path.as_ref().to_path_buf(),
            ..StorageConfig::default()
        })
    }

    pub fn open_or_empty(config: &StorageConfig) -> (Self, Option<StorageError>) {
        match Self::open(config) {
            Ok(store) => (store, None),
            Err(err) => {
                tracing::warn!(
                    path = %config.catalog_path.display(),
                    error = %err,
                    "falling back to an empty block catalog"
                );
                (Self::empty(config), Some(err))
            }
        }
    }

    /// An empty store bound to the configured path. Nothing is written until
    /// the first mutation.
    pub fn empty(config: &StorageConfig) -> Self {
        Self {
            path: config.catalog_path.clone(),
            pretty: config.pretty,
            catalog: BlockCatalog::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    // ========================================================================
    // Write Operations
    // ========================================================================

    pub fn add(&mut self, block_id: &str, properties: PropertyMap) -> StorageResult<()> {
        self.write_through(|catalog| catalog.add(block_id, properties))
    }

    pub fn update(&mut self, block_id: &str, properties: PropertyMap) -> StorageResult<()> {
        self.write_through(|catalog| catalog.update(block_id, properties))
    }

    /// Returns whether a block was removed. Removing an absent block does not
    /// touch the file.
    pub fn remove(&mut self, block_id: &str) -> StorageResult<bool> {
        if !self.catalog.contains(block_id.trim()) {
            return Ok(false);
        }
        self.write_through(|catalog| {
            catalog.remove(block_id);
            Ok(())
        })?;
        Ok(true)
    }

    /// Write the current catalog to disk.
    pub fn save(&self) -> StorageResult<()> {
        Self::persist(&self.path, &self.catalog, self.pretty)
    }

    fn write_through<F>(&mut self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BlockCatalog) -> blockmix_core::ReplaceResult<()>,
    {
        let mut next = self.catalog.clone();
        mutate(&mut next)?;
        Self::persist(&self.path, &next, self.pretty)?;
        self.catalog = next;
        Ok(())
    }

    fn persist(path: &Path, catalog: &BlockCatalog, pretty: bool) -> StorageResult<()> {
        let text = to_json(catalog, pretty)?;
        write_atomic(path, text.as_bytes())?;
        tracing::info!(path = %path.display(), blocks = catalog.len(), "saved block catalog");
        Ok(())
    }
}
