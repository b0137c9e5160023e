//! Command synthesis.
//!
//! Pure functions from (base, structure, entries) to a [`ReplaceCommand`].
//! Entries whose normalized share rounds to 0 are left out. State emission:
//!
//! 1. every selection that is set and permitted by the structure, in
//!    canonical order
//! 2. the structure's [`PropertyOverride`]s on top of that

use crate::command::{CommandEntry, ReplaceCommand};
use crate::error::{ReplaceError, ReplaceResult};
use crate::registry::TraitRegistry;
use crate::replacement::ReplacementEntry;
use crate::structure::{PropertyOverride, StructureType};
use crate::weights::normalize;

/// Render the command text for a replacement set.
pub fn synthesize(
    base: &str,
    structure: StructureType,
    entries: &[ReplacementEntry],
) -> ReplaceResult<String> {
    build_command(base, structure, entries).map(|cmd| cmd.to_string())
}

pub fn build_command(
    base: &str,
    structure: StructureType,
    entries: &[ReplacementEntry],
) -> ReplaceResult<ReplaceCommand> {
    let weights: Vec<u8> = entries.iter().map(|e| e.weight).collect();
    let percents = normalize(&weights)?;

    let base = base.trim();
    if base.is_empty() {
        return Err(ReplaceError::MissingBaseBlock);
    }

    let mut emitted = Vec::with_capacity(entries.len());
    for (index, (entry, percent)) in entries.iter().zip(percents).enumerate() {
        if percent == 0 {
            continue;
        }
        let block = entry.block.id().trim();
        if block.is_empty() {
            return Err(ReplaceError::MissingBlock { index });
        }
        emitted.push(CommandEntry {
            percent,
            block: block.to_string(),
            properties: entry_properties(structure, entry),
        });
    }

    tracing::debug!(
        base = %base,
        structure = %structure,
        entries = emitted.len(),
        skipped = entries.len() - emitted.len(),
        "synthesized replace command"
    );
    Ok(ReplaceCommand {
        base: base.to_string(),
        entries: emitted,
    })
}

/// The `key=value` pairs emitted for one entry.
pub fn entry_properties(structure: StructureType, entry: &ReplacementEntry) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = entry
        .selected()
        .filter(|(key, _)| structure.permits_property(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let mut inserted = false;
    for rule in structure.forced_properties() {
        match *rule {
            PropertyOverride::Force { key, value } => {
                match props.iter_mut().find(|(k, _)| k == key) {
                    Some((_, v)) => *v = value.to_string(),
                    None => {
                        props.push((key.to_string(), value.to_string()));
                        inserted = true;
                    }
                }
            }
            PropertyOverride::Rename { from, to } => {
                if let Some((k, _)) = props.iter_mut().find(|(k, _)| k == from) {
                    *k = to.to_string();
                }
            }
        }
    }

    if inserted {
        let registry = TraitRegistry::builtin();
        props.sort_by(|a, b| {
            registry
                .canonical_rank(&a.0)
                .cmp(&registry.canonical_rank(&b.0))
        });
    }
    props
}
