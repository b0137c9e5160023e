//! In-memory block catalog: block identifier -> allowed state values.
//!
//! Blocks and their state keys keep insertion order, which for a loaded
//! catalog is the order of `blocks.json`. Candidate lists follow it and a
//! rewritten file keeps the user's layout. Persisting it is the storage
//! crate's job.
//!
//! Identifiers and state tokens are checked against the `//replace` grammar
//! on every way in (edits and deserialization), so anything in a catalog can
//! be rendered into a command that parses back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::command::{is_block_char, is_state_char};
use crate::error::{ReplaceError, ReplaceResult};
use crate::structure::StructureType;

/// State key -> legal values, as stored in `blocks.json`.
pub type PropertyMap = IndexMap<String, Vec<String>>;

/// Allowed state values for one block.
///
/// Keys with no values are dropped and repeated values collapsed, so an
/// empty list and an absent key mean the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PropertyMap", into = "PropertyMap")]
pub struct BlockDefinition {
    properties: PropertyMap,
}

impl BlockDefinition {
    pub fn new(properties: PropertyMap) -> Self {
        let properties = properties
            .into_iter()
            .filter_map(|(key, values)| {
                let mut unique: Vec<String> = Vec::with_capacity(values.len());
                for v in values {
                    let v = v.trim().to_string();
                    if !v.is_empty() && !unique.contains(&v) {
                        unique.push(v);
                    }
                }
                let key = key.trim().to_string();
                (!key.is_empty() && !unique.is_empty()).then_some((key, unique))
            })
            .collect();
        Self { properties }
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn domain(&self, key: &str) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn check_tokens(&self) -> ReplaceResult<()> {
        for (key, values) in &self.properties {
            for token in std::iter::once(key).chain(values) {
                if !token.chars().all(is_state_char) {
                    return Err(ReplaceError::InvalidStateToken(token.clone()));
                }
            }
        }
        Ok(())
    }
}

impl From<PropertyMap> for BlockDefinition {
    fn from(properties: PropertyMap) -> Self {
        Self::new(properties)
    }
}

impl From<BlockDefinition> for PropertyMap {
    fn from(def: BlockDefinition) -> Self {
        def.properties
    }
}

type BlockMap = IndexMap<String, BlockDefinition>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockMap", into = "BlockMap")]
pub struct BlockCatalog {
    blocks: BlockMap,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, block_id: &str) -> bool {
        self.blocks.contains_key(block_id)
    }

    pub fn get(&self, block_id: &str) -> Option<&BlockDefinition> {
        self.blocks.get(block_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockDefinition)> {
        self.blocks.iter().map(|(id, def)| (id.as_str(), def))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Append a new block. Fails if the identifier is already present or
    /// anything in it would not survive the command grammar.
    pub fn add(&mut self, block_id: &str, properties: PropertyMap) -> ReplaceResult<()> {
        let block_id = normalize_id(block_id)?;
        if self.blocks.contains_key(&block_id) {
            return Err(ReplaceError::DuplicateBlock(block_id));
        }
        let def = BlockDefinition::new(properties);
        def.check_tokens()?;
        tracing::debug!(block = %block_id, keys = def.properties.len(), "adding block");
        self.blocks.insert(block_id, def);
        Ok(())
    }

    /// Replace the whole property map of an existing block, keeping its
    /// position.
    pub fn update(&mut self, block_id: &str, properties: PropertyMap) -> ReplaceResult<()> {
        let block_id = normalize_id(block_id)?;
        let def = BlockDefinition::new(properties);
        def.check_tokens()?;
        match self.blocks.get_mut(&block_id) {
            Some(slot) => {
                tracing::debug!(block = %block_id, keys = def.properties.len(), "updating block");
                *slot = def;
                Ok(())
            }
            None => Err(ReplaceError::NotFound(block_id)),
        }
    }

    /// Remove a block; returns whether anything was removed. The remaining
    /// blocks keep their order.
    pub fn remove(&mut self, block_id: &str) -> bool {
        let removed = self.blocks.shift_remove(block_id.trim()).is_some();
        if removed {
            tracing::debug!(block = %block_id.trim(), "removed block");
        }
        removed
    }

    /// Candidate blocks for a structure type, in catalog order.
    pub fn filter_by_structure(&self, structure: StructureType) -> Vec<String> {
        self.blocks
            .keys()
            .filter(|id| structure.admits_block(id))
            .cloned()
            .collect()
    }
}

impl TryFrom<BlockMap> for BlockCatalog {
    type Error = ReplaceError;

    fn try_from(blocks: BlockMap) -> ReplaceResult<Self> {
        for (block_id, def) in &blocks {
            check_id(block_id)?;
            def.check_tokens()?;
        }
        Ok(Self { blocks })
    }
}

impl From<BlockCatalog> for BlockMap {
    fn from(catalog: BlockCatalog) -> Self {
        catalog.blocks
    }
}

fn normalize_id(block_id: &str) -> ReplaceResult<String> {
    let trimmed = block_id.trim();
    check_id(trimmed)?;
    Ok(trimmed.to_string())
}

fn check_id(block_id: &str) -> ReplaceResult<()> {
    if block_id.is_empty() {
        return Err(ReplaceError::EmptyBlockId);
    }
    if !block_id.chars().all(is_block_char) {
        return Err(ReplaceError::InvalidBlockId(block_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &[&str])]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn sample() -> BlockCatalog {
        let mut c = BlockCatalog::new();
        c.add("stone", PropertyMap::new()).unwrap();
        c.add("stone_slab", props(&[("half", &["bottom", "top"])])).unwrap();
        c.add("oak_stairs", props(&[("facing", &["north", "east"])])).unwrap();
        c.add("cobblestone_wall", PropertyMap::new()).unwrap();
        c.add("andesite", PropertyMap::new()).unwrap();
        c
    }

    #[test]
    fn add_twice_is_duplicate_and_keeps_one_entry() {
        let mut c = BlockCatalog::new();
        c.add("new_block", PropertyMap::new()).unwrap();
        let err = c.add("new_block", PropertyMap::new()).unwrap_err();
        assert_eq!(err, ReplaceError::DuplicateBlock("new_block".into()));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn update_requires_existing_block_and_replaces_fully() {
        let mut c = sample();
        assert_eq!(
            c.update("missing", PropertyMap::new()).unwrap_err(),
            ReplaceError::NotFound("missing".into())
        );

        c.update("oak_stairs", props(&[("half", &["top"])])).unwrap();
        let def = c.get("oak_stairs").unwrap();
        assert!(def.domain("facing").is_none());
        assert_eq!(def.domain("half").unwrap(), ["top"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut c = sample();
        assert!(c.remove("stone"));
        assert!(!c.remove("stone"));
        assert!(!c.contains("stone"));
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let mut c = BlockCatalog::new();
        assert_eq!(
            c.add("  ", PropertyMap::new()).unwrap_err(),
            ReplaceError::EmptyBlockId
        );
    }

    #[test]
    fn empty_value_lists_mean_absent() {
        let def = BlockDefinition::new(props(&[("facing", &[]), ("half", &["top", "top", ""])]));
        assert!(def.domain("facing").is_none());
        assert_eq!(def.domain("half").unwrap(), ["top"]);
    }

    #[test]
    fn identifiers_outside_the_command_grammar_are_rejected() {
        let mut c = sample();
        for bad in ["a,b", "stone[x", "50%dirt", "mossy stone", "a]"] {
            assert_eq!(
                c.add(bad, PropertyMap::new()).unwrap_err(),
                ReplaceError::InvalidBlockId(bad.to_string())
            );
        }
        assert!(c.add("minecraft:polished_blackstone", PropertyMap::new()).is_ok());

        assert_eq!(
            c.add("oak_slab", props(&[("half", &["bottom", "top,double"])]))
                .unwrap_err(),
            ReplaceError::InvalidStateToken("top,double".into())
        );
        assert_eq!(
            c.update("stone", props(&[("variant=x", &["smooth"])]))
                .unwrap_err(),
            ReplaceError::InvalidStateToken("variant=x".into())
        );
        assert!(!c.contains("oak_slab"));
        assert!(c.get("stone").unwrap().is_empty());
    }

    #[test]
    fn catalog_keeps_insertion_order_across_edits() {
        let mut c = sample();
        c.update("stone_slab", props(&[("waterlogged", &["false"]), ("half", &["top"])]))
            .unwrap();
        c.remove("oak_stairs");
        let ids: Vec<&str> = c.ids().collect();
        assert_eq!(ids, ["stone", "stone_slab", "cobblestone_wall", "andesite"]);
        let keys: Vec<&str> = c.get("stone_slab").unwrap().keys().collect();
        assert_eq!(keys, ["waterlogged", "half"]);
    }

    #[test]
    fn filter_by_structure_partitions_by_suffix() {
        let c = sample();
        assert_eq!(
            c.filter_by_structure(StructureType::NormalBlock),
            ["stone", "andesite"]
        );
        assert_eq!(c.filter_by_structure(StructureType::Slab), ["stone_slab"]);
        assert_eq!(c.filter_by_structure(StructureType::Wall), ["cobblestone_wall"]);
        assert_eq!(
            c.filter_by_structure(StructureType::Stair),
            c.filter_by_structure(StructureType::UpsideDownStair)
        );
    }

    #[test]
    fn catalog_deserializes_from_blocks_json_shape() {
        let json = r#"{
            "stone_brick_slab": { "half": ["bottom", "top"] },
            "stone": {},
            "oak_fence_gate": { "facing": [], "open": ["true", "false"] }
        }"#;
        let c: BlockCatalog = serde_json::from_str(json).expect("parse catalog");
        assert_eq!(c.len(), 3);
        assert!(c.get("stone").unwrap().is_empty());
        assert!(c.get("oak_fence_gate").unwrap().domain("facing").is_none());

        let ids: Vec<&str> = c.ids().collect();
        assert_eq!(ids, ["stone_brick_slab", "stone", "oak_fence_gate"]);

        let back = serde_json::to_string(&c).unwrap();
        assert_eq!(
            back,
            r#"{"stone_brick_slab":{"half":["bottom","top"]},"stone":{},"oak_fence_gate":{"open":["true","false"]}}"#
        );
    }

    #[test]
    fn catalog_json_with_unusable_ids_is_rejected() {
        let err = serde_json::from_str::<BlockCatalog>(r#"{ "stone": {}, "a,b": {} }"#)
            .unwrap_err();
        assert!(err.to_string().contains("a,b"), "got {err}");
        assert!(serde_json::from_str::<BlockCatalog>(r#"{ "x": { "half": ["a]"] } }"#).is_err());
    }
}
