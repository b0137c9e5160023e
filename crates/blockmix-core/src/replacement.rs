//! Replacement set model
//!
//! A [`ReplacementSet`] is what the user is editing: a structure type, a base
//! block and 1..=10 weighted entries. Every operation that depends on which
//! blocks exist takes the [`BlockCatalog`] explicitly; the set only caches the
//! candidate list derived from it.
//!
//! Changing the structure type is a full rebuild of the entry list. Weight
//! edits re-run the normalizer so `percent` on each entry is always current.

use std::collections::BTreeMap;

use crate::catalog::BlockCatalog;
use crate::command::ReplaceCommand;
use crate::error::{ReplaceError, ReplaceResult};
use crate::naming::{placeholder_id, BlockNameResolver};
use crate::registry::TraitRegistry;
use crate::structure::StructureType;
use crate::synth;
use crate::weights::{clamp_weight, even_weight, normalize};

pub const MIN_ENTRIES: usize = 1;
pub const MAX_ENTRIES: usize = 10;

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockChoice {
    /// A catalog block admitted by the current structure type.
    Catalog(String),
    /// Text that matched no candidate, kept as a snake_case identifier.
    /// Placeholders carry no state properties.
    FreeText(String),
}

impl BlockChoice {
    pub fn id(&self) -> &str {
        match self {
            BlockChoice::Catalog(id) | BlockChoice::FreeText(id) => id,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, BlockChoice::FreeText(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSelection {
    pub key: String,
    /// Values this block allows for `key`.
    pub domain: Vec<String>,
    /// `None` is unset; unset states are left out of the command.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementEntry {
    pub block: BlockChoice,
    /// Raw slider value, `0..=100`.
    pub weight: u8,
    /// Normalized share, refreshed on every weight change.
    pub percent: u8,
    /// Applicable states in canonical trait order.
    pub states: Vec<StateSelection>,
}

impl ReplacementEntry {
    pub fn new(
        catalog: &BlockCatalog,
        structure: StructureType,
        block: BlockChoice,
        weight: u8,
    ) -> Self {
        let states = match &block {
            BlockChoice::Catalog(id) => derive_states(catalog, structure, id),
            BlockChoice::FreeText(_) => Vec::new(),
        };
        Self {
            block,
            weight,
            percent: 0,
            states,
        }
    }

    pub fn state(&self, key: &str) -> Option<&StateSelection> {
        self.states.iter().find(|s| s.key == key)
    }

    /// `(key, value)` for every state that is set, in canonical order.
    pub fn selected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.states
            .iter()
            .filter_map(|s| s.value.as_deref().map(|v| (s.key.as_str(), v)))
    }

    /// All applicable states, unset ones mapped to the empty string.
    pub fn selections(&self) -> BTreeMap<String, String> {
        self.states
            .iter()
            .map(|s| (s.key.clone(), s.value.clone().unwrap_or_default()))
            .collect()
    }
}

/// States a block exposes under a structure, defaulted to the first legal
/// value and sorted in canonical trait order.
fn derive_states(
    catalog: &BlockCatalog,
    structure: StructureType,
    block_id: &str,
) -> Vec<StateSelection> {
    let Some(def) = catalog.get(block_id) else {
        return Vec::new();
    };
    let registry = TraitRegistry::builtin();
    let mut states: Vec<StateSelection> = def
        .properties()
        .iter()
        .filter(|(key, _)| structure.permits_property(key))
        .map(|(key, domain)| StateSelection {
            key: key.clone(),
            domain: domain.clone(),
            value: domain.first().cloned(),
        })
        .collect();
    states.sort_by(|a, b| {
        registry
            .canonical_rank(&a.key)
            .cmp(&registry.canonical_rank(&b.key))
    });
    states
}

// ============================================================================
// Set
// ============================================================================

/// Outcome of re-running the normalizer after a weight change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Normalized,
    /// Every weight is zero; all percentages read 0 and synthesis will fail.
    AllZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementSet {
    structure: StructureType,
    base: Option<BlockChoice>,
    candidates: Vec<String>,
    entries: Vec<ReplacementEntry>,
}

impl ReplacementSet {
    /// A single-entry set for `structure`, drawing on `catalog`.
    pub fn new(catalog: &BlockCatalog, structure: StructureType) -> Self {
        let mut set = Self {
            structure,
            base: None,
            candidates: Vec::new(),
            entries: Vec::new(),
        };
        set.rebuild(catalog, structure, MIN_ENTRIES);
        set
    }

    pub fn structure(&self) -> StructureType {
        self.structure
    }

    pub fn base(&self) -> Option<&BlockChoice> {
        self.base.as_ref()
    }

    pub fn base_id(&self) -> Option<&str> {
        self.base.as_ref().map(BlockChoice::id).filter(|id| !id.is_empty())
    }

    /// Blocks the entries may be set to, in catalog order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn entries(&self) -> &[ReplacementEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> ReplaceResult<&ReplacementEntry> {
        self.check_index(index)?;
        Ok(&self.entries[index])
    }

    pub fn weights(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    // ------------------------------------------------------------------------
    // Structure and count
    // ------------------------------------------------------------------------

    /// Switch structure type and rebuild every entry for the new candidates.
    ///
    /// The entry count is kept. An entry keeps its block when that block is
    /// still a candidate; otherwise it takes candidate `i` (wrapping). All
    /// selections return to defaults and weights to an even split.
    pub fn set_structure_type(&mut self, catalog: &BlockCatalog, structure: StructureType) {
        let count = self.entries.len().clamp(MIN_ENTRIES, MAX_ENTRIES);
        self.rebuild(catalog, structure, count);
        tracing::debug!(
            structure = %structure,
            candidates = self.candidates.len(),
            entries = count,
            "rebuilt replacement set"
        );
    }

    /// Re-derive candidates after the catalog changed.
    pub fn refresh_candidates(&mut self, catalog: &BlockCatalog) {
        self.set_structure_type(catalog, self.structure);
    }

    /// Grow or shrink to `count` entries and reset every weight to
    /// `floor(100 / count)`. Surviving entries keep their block and states.
    pub fn set_entry_count(&mut self, catalog: &BlockCatalog, count: usize) -> ReplaceResult<()> {
        if !(MIN_ENTRIES..=MAX_ENTRIES).contains(&count) {
            return Err(ReplaceError::InvalidEntryCount(count));
        }
        let weight = even_weight(count);
        self.entries.truncate(count);
        for index in self.entries.len()..count {
            let block = self.candidate_for(index);
            self.entries
                .push(ReplacementEntry::new(catalog, self.structure, block, weight));
        }
        for entry in &mut self.entries {
            entry.weight = weight;
        }
        self.rebalance();
        Ok(())
    }

    fn rebuild(&mut self, catalog: &BlockCatalog, structure: StructureType, count: usize) {
        self.structure = structure;
        self.candidates = catalog.filter_by_structure(structure);

        let weight = even_weight(count);
        let previous = std::mem::take(&mut self.entries);
        let entries: Vec<ReplacementEntry> = (0..count)
            .map(|index| {
                let block = match previous.get(index).map(|e| &e.block) {
                    Some(BlockChoice::Catalog(id)) if self.candidates.contains(id) => {
                        BlockChoice::Catalog(id.clone())
                    }
                    _ => self.candidate_for(index),
                };
                ReplacementEntry::new(catalog, structure, block, weight)
            })
            .collect();
        self.entries = entries;
        self.rebalance();
    }

    fn candidate_for(&self, index: usize) -> BlockChoice {
        if self.candidates.is_empty() {
            BlockChoice::FreeText(String::new())
        } else {
            BlockChoice::Catalog(self.candidates[index % self.candidates.len()].clone())
        }
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    /// Point entry `index` at a candidate block, resetting its states.
    pub fn set_entry_block(
        &mut self,
        catalog: &BlockCatalog,
        index: usize,
        block_id: &str,
    ) -> ReplaceResult<()> {
        self.check_index(index)?;
        let block_id = block_id.trim();
        if !self.candidates.iter().any(|c| c == block_id) || !catalog.contains(block_id) {
            return Err(ReplaceError::InvalidBlock {
                block: block_id.to_string(),
                structure: self.structure,
            });
        }
        let old = &self.entries[index];
        let mut entry = ReplacementEntry::new(
            catalog,
            self.structure,
            BlockChoice::Catalog(block_id.to_string()),
            old.weight,
        );
        entry.percent = old.percent;
        self.entries[index] = entry;
        Ok(())
    }

    /// Set entry `index` from typed text. Text the resolver cannot place
    /// becomes a placeholder identifier with no states.
    pub fn set_entry_text(
        &mut self,
        catalog: &BlockCatalog,
        index: usize,
        text: &str,
        resolver: &dyn BlockNameResolver,
    ) -> ReplaceResult<&BlockChoice> {
        self.check_index(index)?;
        match resolver.resolve(text, &self.candidates).map(str::to_string) {
            Some(block_id) => self.set_entry_block(catalog, index, &block_id)?,
            None => {
                let entry = &mut self.entries[index];
                entry.block = BlockChoice::FreeText(placeholder_id(text));
                entry.states.clear();
            }
        }
        Ok(&self.entries[index].block)
    }

    /// Choose the base block from the catalog.
    pub fn set_base_block(&mut self, catalog: &BlockCatalog, block_id: &str) -> ReplaceResult<()> {
        let block_id = block_id.trim();
        if !catalog.contains(block_id) {
            return Err(ReplaceError::NotFound(block_id.to_string()));
        }
        self.base = Some(BlockChoice::Catalog(block_id.to_string()));
        Ok(())
    }

    /// Set the base block from typed text; any catalog block may be the base.
    /// Empty text clears it.
    pub fn set_base_text(
        &mut self,
        catalog: &BlockCatalog,
        text: &str,
        resolver: &dyn BlockNameResolver,
    ) -> Option<&BlockChoice> {
        if text.trim().is_empty() {
            self.base = None;
            return None;
        }
        let all: Vec<String> = catalog.ids().map(str::to_string).collect();
        self.base = Some(match resolver.resolve(text, &all) {
            Some(id) => BlockChoice::Catalog(id.to_string()),
            None => BlockChoice::FreeText(placeholder_id(text)),
        });
        self.base.as_ref()
    }

    // ------------------------------------------------------------------------
    // Weights and states
    // ------------------------------------------------------------------------

    /// Store a clamped weight and rebalance every entry's percentage.
    pub fn set_entry_weight(&mut self, index: usize, weight: i64) -> ReplaceResult<Balance> {
        self.check_index(index)?;
        self.entries[index].weight = clamp_weight(weight);
        Ok(self.rebalance())
    }

    pub fn set_entry_property(&mut self, index: usize, key: &str, value: &str) -> ReplaceResult<()> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        match entry.states.iter_mut().find(|s| s.key == key) {
            Some(state) if state.domain.iter().any(|v| v == value) => {
                state.value = Some(value.to_string());
                Ok(())
            }
            _ => Err(ReplaceError::InvalidPropertyValue {
                block: entry.block.id().to_string(),
                property: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Unset a state so it is left out of the command.
    pub fn clear_entry_property(&mut self, index: usize, key: &str) -> ReplaceResult<()> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        match entry.states.iter_mut().find(|s| s.key == key) {
            Some(state) => {
                state.value = None;
                Ok(())
            }
            None => Err(ReplaceError::InvalidPropertyValue {
                block: entry.block.id().to_string(),
                property: key.to_string(),
                value: String::new(),
            }),
        }
    }

    /// Recompute every entry's percentage from the raw weights.
    pub fn rebalance(&mut self) -> Balance {
        match normalize(&self.weights()) {
            Ok(percents) => {
                for (entry, percent) in self.entries.iter_mut().zip(percents) {
                    entry.percent = percent;
                }
                Balance::Normalized
            }
            Err(_) => {
                for entry in &mut self.entries {
                    entry.percent = 0;
                }
                tracing::debug!("all replacement weights are zero");
                Balance::AllZero
            }
        }
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    pub fn to_command(&self) -> ReplaceResult<ReplaceCommand> {
        let base = self.base_id().ok_or(ReplaceError::MissingBaseBlock)?;
        synth::build_command(base, self.structure, &self.entries)
    }

    pub fn synthesize(&self) -> ReplaceResult<String> {
        let base = self.base_id().ok_or(ReplaceError::MissingBaseBlock)?;
        synth::synthesize(base, self.structure, &self.entries)
    }

    fn check_index(&self, index: usize) -> ReplaceResult<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(ReplaceError::EntryIndex {
                index,
                len: self.entries.len(),
            })
        }
    }
}
