//! Structure types offered to the user and the per-structure emission rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReplaceError;
use crate::registry::Archetype;

/// Identifier suffixes that mark a block as a non-full-cube shape.
pub const RESERVED_SUFFIXES: [&str; 3] = ["_slab", "_stairs", "_wall"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StructureType {
    #[default]
    #[serde(rename = "Normal Block")]
    NormalBlock,
    Slab,
    Wall,
    Stair,
    #[serde(rename = "Upside Down Stair")]
    UpsideDownStair,
}

/// A structure-specific rule layered on top of the generic property
/// selections when a command is synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOverride {
    /// Always emit `key=value`, replacing whatever the user selected.
    Force {
        key: &'static str,
        value: &'static str,
    },
    /// Emit the selection for `from` under the key `to` (only when set).
    Rename {
        from: &'static str,
        to: &'static str,
    },
}

impl StructureType {
    pub const ALL: [StructureType; 5] = [
        StructureType::NormalBlock,
        StructureType::Slab,
        StructureType::Wall,
        StructureType::Stair,
        StructureType::UpsideDownStair,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StructureType::NormalBlock => "Normal Block",
            StructureType::Slab => "Slab",
            StructureType::Wall => "Wall",
            StructureType::Stair => "Stair",
            StructureType::UpsideDownStair => "Upside Down Stair",
        }
    }

    pub fn archetype(self) -> Archetype {
        match self {
            StructureType::NormalBlock => Archetype::Normal,
            StructureType::Slab => Archetype::Slab,
            StructureType::Wall => Archetype::Wall,
            StructureType::Stair | StructureType::UpsideDownStair => Archetype::Stair,
        }
    }

    /// Identifier suffix of the blocks this structure draws from. Both stair
    /// variants share `_stairs`.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            StructureType::NormalBlock => None,
            StructureType::Slab => Some("_slab"),
            StructureType::Wall => Some("_wall"),
            StructureType::Stair | StructureType::UpsideDownStair => Some("_stairs"),
        }
    }

    /// Whether a block identifier belongs to this structure's candidate list.
    pub fn admits_block(self, block_id: &str) -> bool {
        match self.suffix() {
            Some(suffix) => block_id.ends_with(suffix),
            None => !RESERVED_SUFFIXES.iter().any(|s| block_id.ends_with(s)),
        }
    }

    /// Whether a state key may be selected for blocks of this structure.
    /// Normal blocks are archetype-agnostic and keep every key they declare.
    pub fn permits_property(self, key: &str) -> bool {
        match self {
            StructureType::NormalBlock => true,
            other => other.archetype().has_trait(key),
        }
    }

    /// Overrides applied at synthesis time, regardless of user selection.
    ///
    /// Plain stairs have no entry here: their `facing` is emitted only when
    /// set, which is the generic rule for every unset selection.
    pub fn forced_properties(self) -> &'static [PropertyOverride] {
        match self {
            StructureType::UpsideDownStair => &[PropertyOverride::Force {
                key: "half",
                value: "top",
            }],
            StructureType::Slab => &[PropertyOverride::Rename {
                from: "half",
                to: "type",
            }],
            StructureType::NormalBlock | StructureType::Wall | StructureType::Stair => &[],
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StructureType {
    type Err = ReplaceError;

    /// Accepts the UI labels ("Upside Down Stair") as well as compact forms
    /// ("upside_down_stair", "upside-down-stair", "normal").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squashed: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        let structure = match squashed.as_str() {
            "normalblock" | "normal" => StructureType::NormalBlock,
            "slab" => StructureType::Slab,
            "wall" => StructureType::Wall,
            "stair" | "stairs" => StructureType::Stair,
            "upsidedownstair" | "upsidedownstairs" => StructureType::UpsideDownStair,
            _ => return Err(ReplaceError::UnknownStructure(s.to_string())),
        };
        Ok(structure)
    }
}
