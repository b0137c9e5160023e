//! blockmix core: weighted `//replace` command synthesis
//!
//! This crate holds everything needed to turn a user's block picks into a
//! world-editor replace command:
//!
//! ```text
//!  registry (traits, archetypes)      catalog (block -> allowed values)
//!            │                                   │
//!            └──────────────┬────────────────────┘
//!                           ▼
//!                 ReplacementSet (entries, weights, selections)
//!                           │   weights::normalize on every weight change
//!                           ▼
//!                 synth::synthesize ──► command::ReplaceCommand ──► text
//! ```
//!
//! The crate performs no I/O. Loading and persisting catalogs and projects
//! lives in `blockmix-storage`.

pub mod catalog;
pub mod command;
pub mod error;
pub mod naming;
pub mod registry;
pub mod replacement;
pub mod structure;
pub mod synth;
pub mod weights;

pub use catalog::{BlockCatalog, BlockDefinition, PropertyMap};
pub use command::{parse_replace_command, CommandEntry, CommandParseError, ReplaceCommand};
pub use error::{ReplaceError, ReplaceResult};
pub use naming::{BlockNameResolver, ExactNameResolver};
pub use registry::{Archetype, ArchetypeDecl, PropertyTrait, RegistryError, TraitRegistry};
pub use replacement::{
    Balance, BlockChoice, ReplacementEntry, ReplacementSet, StateSelection, MAX_ENTRIES,
    MIN_ENTRIES,
};
pub use structure::{PropertyOverride, StructureType};
pub use synth::{build_command, synthesize};
