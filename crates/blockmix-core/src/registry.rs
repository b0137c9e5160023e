//! Property trait registry
//!
//! A *trait* is a named block-state dimension with a fixed value domain
//! (`facing ∈ {north, east, south, west}`). An *archetype* is a named
//! composition of traits and previously declared archetypes. Composition is
//! plain set union: the resolved trait list keeps first-seen order and a
//! trait reached through several parents appears once.
//!
//! The built-in table is validated the first time it is used. Custom
//! registries go through the same validation in [`TraitRegistry::new`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ReplaceError;

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyTrait {
    pub name: String,
    pub values: Vec<String>,
}

impl PropertyTrait {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// First value of the domain; the default selection for a fresh entry.
    pub fn default_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchetypeDecl {
    pub name: String,
    /// Trait names or names of archetypes declared earlier in the list.
    pub parents: Vec<String>,
}

impl ArchetypeDecl {
    pub fn new(name: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            name: name.into(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("archetype `{archetype}` references undeclared trait or archetype `{parent}`")]
    UndeclaredParent { archetype: String, parent: String },
    #[error("trait `{0}` has an empty value domain")]
    EmptyDomain(String),
    #[error("trait `{name}` lists value `{value}` more than once")]
    DuplicateValue { name: String, value: String },
    #[error("`{0}` is declared more than once")]
    DuplicateName(String),
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone)]
struct ResolvedArchetype {
    name: String,
    /// Indices into `TraitRegistry::traits`, first-seen order.
    traits: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct TraitRegistry {
    traits: Vec<PropertyTrait>,
    archetypes: Vec<ResolvedArchetype>,
}

static BUILTIN: OnceLock<TraitRegistry> = OnceLock::new();

impl TraitRegistry {
    pub fn new(
        traits: Vec<PropertyTrait>,
        archetypes: Vec<ArchetypeDecl>,
    ) -> Result<Self, RegistryError> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for t in &traits {
            if !names.insert(t.name.as_str()) {
                return Err(RegistryError::DuplicateName(t.name.clone()));
            }
            if t.values.is_empty() {
                return Err(RegistryError::EmptyDomain(t.name.clone()));
            }
            let mut seen = BTreeSet::new();
            for v in &t.values {
                if !seen.insert(v.as_str()) {
                    return Err(RegistryError::DuplicateValue {
                        name: t.name.clone(),
                        value: v.clone(),
                    });
                }
            }
        }

        let mut resolved: Vec<ResolvedArchetype> = Vec::with_capacity(archetypes.len());
        for decl in &archetypes {
            if !names.insert(decl.name.as_str()) {
                return Err(RegistryError::DuplicateName(decl.name.clone()));
            }

            fn push_unique(out: &mut Vec<usize>, idx: usize) {
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }

            let mut out: Vec<usize> = Vec::new();
            for parent in &decl.parents {
                if let Some(idx) = traits.iter().position(|t| &t.name == parent) {
                    push_unique(&mut out, idx);
                } else if let Some(earlier) = resolved.iter().find(|a| &a.name == parent) {
                    for &idx in &earlier.traits {
                        push_unique(&mut out, idx);
                    }
                } else {
                    return Err(RegistryError::UndeclaredParent {
                        archetype: decl.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }

            resolved.push(ResolvedArchetype {
                name: decl.name.clone(),
                traits: out,
            });
        }

        Ok(Self {
            traits,
            archetypes: resolved,
        })
    }

    /// The process-wide built-in registry.
    pub fn builtin() -> &'static TraitRegistry {
        BUILTIN.get_or_init(|| {
            let (traits, archetypes) = builtin_declarations();
            // The table below is static; a failure here is a programming error.
            TraitRegistry::new(traits, archetypes).expect("built-in trait table is consistent")
        })
    }

    pub fn traits(&self) -> &[PropertyTrait] {
        &self.traits
    }

    pub fn get_trait(&self, name: &str) -> Option<&PropertyTrait> {
        self.traits.iter().find(|t| t.name == name)
    }

    pub fn archetype_names(&self) -> impl Iterator<Item = &str> {
        self.archetypes.iter().map(|a| a.name.as_str())
    }

    /// Resolved trait list of an archetype, or `None` for an unknown name.
    pub fn archetype_properties(&self, name: &str) -> Option<Vec<&PropertyTrait>> {
        let archetype = self.archetypes.iter().find(|a| a.name == name)?;
        Some(archetype.traits.iter().map(|&i| &self.traits[i]).collect())
    }

    /// Emission rank of a state key: declared traits in declaration order,
    /// then everything else alphabetically.
    pub fn canonical_rank<'k>(&self, key: &'k str) -> (usize, &'k str) {
        match self.traits.iter().position(|t| t.name == key) {
            Some(idx) => (idx, ""),
            None => (self.traits.len(), key),
        }
    }
}

fn builtin_declarations() -> (Vec<PropertyTrait>, Vec<ArchetypeDecl>) {
    let traits = vec![
        PropertyTrait::new("facing", &["north", "east", "south", "west"]),
        PropertyTrait::new("half", &["bottom", "top"]),
        PropertyTrait::new(
            "shape",
            &[
                "straight",
                "inner_left",
                "inner_right",
                "outer_left",
                "outer_right",
            ],
        ),
        PropertyTrait::new("waterlogged", &["true", "false"]),
        PropertyTrait::new("open", &["true", "false"]),
        PropertyTrait::new("powered", &["true", "false"]),
        PropertyTrait::new("face", &["ceiling", "floor", "wall"]),
    ];
    let archetypes = vec![
        ArchetypeDecl::new("Normal", &[]),
        ArchetypeDecl::new("Slab", &["half"]),
        ArchetypeDecl::new("Wall", &["facing"]),
        ArchetypeDecl::new("Stair", &["facing", "half", "shape", "waterlogged"]),
    ];
    (traits, archetypes)
}

// ============================================================================
// Built-in archetypes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Normal,
    Slab,
    Wall,
    Stair,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Normal,
        Archetype::Slab,
        Archetype::Wall,
        Archetype::Stair,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Normal => "Normal",
            Archetype::Slab => "Slab",
            Archetype::Wall => "Wall",
            Archetype::Stair => "Stair",
        }
    }

    pub fn properties(self) -> Vec<&'static PropertyTrait> {
        TraitRegistry::builtin()
            .archetype_properties(self.name())
            .unwrap_or_default()
    }

    pub fn has_trait(self, key: &str) -> bool {
        self.properties().iter().any(|t| t.name == key)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Archetype {
    type Err = ReplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReplaceError::UnknownArchetype(s.to_string()))
    }
}
