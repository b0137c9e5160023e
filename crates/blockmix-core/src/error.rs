use thiserror::Error;

use crate::structure::StructureType;

pub type ReplaceResult<T> = Result<T, ReplaceError>;

/// Errors raised by catalog edits, replacement-set edits and synthesis.
///
/// Every variant is recoverable: the operation that returned it left the
/// catalog or replacement set exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    #[error("all replacement weights are zero; nothing to synthesize")]
    ZeroWeight,
    #[error("block `{0}` already exists in the catalog")]
    DuplicateBlock(String),
    #[error("block `{0}` is not in the catalog")]
    NotFound(String),
    #[error("block `{block}` is not a candidate for structure `{structure}`")]
    InvalidBlock {
        block: String,
        structure: StructureType,
    },
    #[error("`{property}={value}` is not a legal state for block `{block}`")]
    InvalidPropertyValue {
        block: String,
        property: String,
        value: String,
    },
    #[error("replacement count {0} is outside 1..=10")]
    InvalidEntryCount(usize),
    #[error("replacement index {index} is out of range (have {len})")]
    EntryIndex { index: usize, len: usize },
    #[error("replacement {index} has no block selected")]
    MissingBlock { index: usize },
    #[error("no base block selected")]
    MissingBaseBlock,
    #[error("block identifier must not be empty")]
    EmptyBlockId,
    #[error("block identifier `{0}` may only contain ASCII letters, digits and `_:.-/`")]
    InvalidBlockId(String),
    #[error("state `{0}` may only contain ASCII letters, digits and `_.-`")]
    InvalidStateToken(String),
    #[error("unknown structure type `{0}`")]
    UnknownStructure(String),
    #[error("unknown archetype `{0}`")]
    UnknownArchetype(String),
}
