//! Block names as users type them.
//!
//! Picking blocks from free text (fuzzy completion, search boxes) is an outside
//! concern. The [`BlockNameResolver`] trait is the seam for it; the default
//! [`ExactNameResolver`] only accepts identifiers or readable names.

use crate::command::is_block_char;

/// `stone_brick_slab` -> `Stone Brick Slab`.
pub fn readable_name(block_id: &str) -> String {
    block_id
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Identifier used for text that matched no catalog block:
/// `Stone Bricks` -> `stone_bricks`.
///
/// Whitespace runs become `_` and anything the command grammar does not allow
/// in a block identifier is dropped, so the result always renders and parses.
pub fn placeholder_id(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| is_block_char(*c))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Maps user text onto one of the candidate block identifiers.
pub trait BlockNameResolver {
    fn resolve<'c>(&self, text: &str, candidates: &'c [String]) -> Option<&'c str>;
}

/// Case-insensitive match on the identifier or its readable name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNameResolver;

impl BlockNameResolver for ExactNameResolver {
    fn resolve<'c>(&self, text: &str, candidates: &'c [String]) -> Option<&'c str> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let as_id = placeholder_id(text);
        candidates
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&as_id) || readable_name(c).eq_ignore_ascii_case(text))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_names_title_case_each_word() {
        assert_eq!(readable_name("stone_brick_slab"), "Stone Brick Slab");
        assert_eq!(readable_name("TNT"), "Tnt");
        assert_eq!(readable_name("oak__planks"), "Oak Planks");
    }

    #[test]
    fn placeholder_ids_are_snake_case() {
        assert_eq!(placeholder_id("  Mossy Stone Bricks "), "mossy_stone_bricks");
        assert_eq!(placeholder_id("minecraft:Deepslate  Tiles"), "minecraft:deepslate_tiles");
    }

    #[test]
    fn placeholder_ids_drop_grammar_punctuation() {
        assert_eq!(placeholder_id("Oak Planks, 50%dirt"), "oak_planks_50dirt");
        assert_eq!(placeholder_id("mossy stone[x"), "mossy_stonex");
        assert_eq!(placeholder_id("a=b]"), "ab");
        assert_eq!(placeholder_id("Ölblock"), "lblock");
        assert_eq!(placeholder_id("[%,]"), "");
    }

    #[test]
    fn exact_resolver_accepts_ids_and_readable_names() {
        let candidates = vec!["stone_brick_slab".to_string(), "oak_slab".to_string()];
        let r = ExactNameResolver;
        assert_eq!(r.resolve("oak_slab", &candidates), Some("oak_slab"));
        assert_eq!(
            r.resolve("Stone Brick Slab", &candidates),
            Some("stone_brick_slab")
        );
        assert_eq!(r.resolve("stone brick slab", &candidates), Some("stone_brick_slab"));
        assert_eq!(r.resolve("birch slab!", &candidates), None);
        assert_eq!(r.resolve("", &candidates), None);
    }
}
