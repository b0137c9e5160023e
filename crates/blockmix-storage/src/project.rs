//! Project snapshots: a saved replacement set plus UI preferences.
//!
//! `percent` in a saved record is the raw slider weight, not the normalized
//! share. State values are stored as strings; an empty string means unset.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use blockmix_core::{
    BlockCatalog, BlockNameResolver, ReplaceError, ReplacementSet, StructureType,
};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{to_json, write_atomic, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementRecord {
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub percent: i64,
    #[serde(default)]
    pub states: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    // UI preferences, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<serde_json::Value>,

    #[serde(default)]
    pub structure: StructureType,
    #[serde(default)]
    pub base: String,
    #[serde(default = "default_count", deserialize_with = "count_from_int_or_string")]
    pub count: usize,
    #[serde(default)]
    pub replacements: Vec<ReplacementRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn default_count() -> usize {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Number(u64),
    Text(String),
}

/// Older project files store the count as the menu text (`"3"`).
fn count_from_int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match CountRepr::deserialize(deserializer)? {
        CountRepr::Number(n) => usize::try_from(n).map_err(de::Error::custom),
        CountRepr::Text(text) => text
            .trim()
            .parse::<usize>()
            .map_err(|e| de::Error::custom(format!("count `{text}`: {e}"))),
    }
}

impl ProjectSnapshot {
    /// Record the current state of a replacement set.
    pub fn capture(set: &ReplacementSet) -> Self {
        Self {
            theme: None,
            accent: None,
            icons: None,
            structure: set.structure(),
            base: set.base().map(|b| b.id().to_string()).unwrap_or_default(),
            count: set.len(),
            replacements: set
                .entries()
                .iter()
                .map(|entry| ReplacementRecord {
                    block: entry.block.id().to_string(),
                    percent: entry.weight as i64,
                    states: entry.selections(),
                })
                .collect(),
            saved_at: None,
        }
    }

    /// Rebuild a replacement set against `catalog`.
    ///
    /// Blocks go through `resolver`, so records holding readable names
    /// ("Stone Brick Slab") restore too. State values the block no longer
    /// allows are skipped with a warning.
    pub fn restore(
        &self,
        catalog: &BlockCatalog,
        resolver: &dyn BlockNameResolver,
    ) -> StorageResult<ReplacementSet> {
        let mut set = ReplacementSet::new(catalog, self.structure);
        set.set_base_text(catalog, &self.base, resolver);
        set.set_entry_count(catalog, self.count)?;

        if self.replacements.len() > self.count {
            tracing::warn!(
                count = self.count,
                records = self.replacements.len(),
                "ignoring replacement records beyond the saved count"
            );
        }

        for (index, record) in self.replacements.iter().take(self.count).enumerate() {
            set.set_entry_text(catalog, index, &record.block, resolver)?;
            set.set_entry_weight(index, record.percent)?;
            for (key, value) in &record.states {
                let applied = if value.is_empty() {
                    set.clear_entry_property(index, key)
                } else {
                    set.set_entry_property(index, key, value)
                };
                match applied {
                    Ok(()) => {}
                    Err(err @ ReplaceError::InvalidPropertyValue { .. }) => {
                        tracing::warn!(index, key = %key, error = %err, "skipping saved state");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(set)
    }

    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        let snapshot: Self =
            serde_json::from_str(&text).map_err(|e| StorageError::MalformedProject {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            path = %path.display(),
            structure = %snapshot.structure,
            count = snapshot.count,
            "loaded project"
        );
        Ok(snapshot)
    }

    /// Stamp `saved_at` and write the snapshot as pretty JSON.
    pub fn save(&mut self, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        self.saved_at = Some(Utc::now());
        let text = to_json(self, true)?;
        write_atomic(path, text.as_bytes())?;
        tracing::info!(path = %path.display(), "saved project");
        Ok(())
    }
}

/// Write a command to a text file, trimmed.
pub fn export_command(path: impl AsRef<Path>, command: &str) -> StorageResult<()> {
    let path = path.as_ref();
    write_atomic(path, command.trim().as_bytes())?;
    tracing::info!(path = %path.display(), "exported command");
    Ok(())
}
