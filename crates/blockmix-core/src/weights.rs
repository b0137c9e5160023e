//! Weight normalization.
//!
//! Raw weights are slider values in `0..=100`. Each entry's percentage is its
//! share of the total, rounded independently with round-half-to-even, so the
//! percentages need not add up to exactly 100. They are never redistributed.

use crate::error::{ReplaceError, ReplaceResult};

pub const MAX_WEIGHT: u8 = 100;

/// Clamp an arbitrary user value into the slider range.
pub fn clamp_weight(raw: i64) -> u8 {
    raw.clamp(0, MAX_WEIGHT as i64) as u8
}

/// Weight every entry gets after the entry count changes to `count`.
pub fn even_weight(count: usize) -> u8 {
    if count == 0 {
        return MAX_WEIGHT;
    }
    (MAX_WEIGHT as usize / count) as u8
}

/// Percentage share of each weight, or `ZeroWeight` when the total is zero.
pub fn normalize(weights: &[u8]) -> ReplaceResult<Vec<u8>> {
    let total: u32 = weights.iter().map(|&w| w as u32).sum();
    if total == 0 {
        return Err(ReplaceError::ZeroWeight);
    }
    Ok(weights.iter().map(|&w| share(w, total)).collect())
}

/// `round(weight * 100 / total)` in exact integer arithmetic, ties to even.
fn share(weight: u8, total: u32) -> u8 {
    let numerator = weight as u32 * 100;
    let quotient = numerator / total;
    let remainder = numerator % total;
    let rounded = match (remainder * 2).cmp(&total) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 == 0 => quotient,
        std::cmp::Ordering::Equal => quotient + 1,
    };
    // weight <= total, so the share never exceeds 100
    rounded.min(100) as u8
}
