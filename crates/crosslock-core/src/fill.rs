//! Partial-fill arithmetic.
//!
//! An order split into `N` parts carries `N + 1` secrets (indices `0..=N`).
//! Indices below `N` unlock an even share of the principal; the final index
//! `N` absorbs the integer-division dust and is reserved for the fill that
//! completes the order.

use crate::error::CrosslockError;
use crate::types::{Amount, SecretIndex};

/// The principal share unlocked by secret `index` of an order split into
/// `parts` parts.
///
/// `index` must already be validated to lie in `0..=parts` and `parts` must
/// be non-zero.
pub fn fill_amount(total: Amount, index: SecretIndex, parts: u64) -> Amount {
    assert!(parts > 0, "parts must be non-zero");
    assert!(index <= parts, "index must be 0..=parts");
    let base = total / parts as u128;
    if index == parts {
        base + total % parts as u128
    } else {
        base
    }
}

/// Safety-deposit portion corresponding to a `fill`-sized slice of a `total`
/// principal: `deposit · fill / total`, rounded down.
pub fn proportional_deposit(
    deposit: Amount,
    fill: Amount,
    total: Amount,
) -> Result<Amount, CrosslockError> {
    if total == 0 {
        return Err(CrosslockError::InvalidAmount("zero total".into()));
    }
    let scaled = deposit
        .checked_mul(fill)
        .ok_or_else(|| CrosslockError::InvalidAmount("deposit share overflow".into()))?;
    Ok(scaled / total)
}

/// The secret index a fill must present, given the cumulative `filled` amount
/// *including* this `fill`.
///
/// A fill that consumes the entire remainder must present the final index
/// `parts`; otherwise the index is `((filled + fill − 1) · parts) / total`.
pub fn expected_index(
    total: Amount,
    filled: Amount,
    fill: Amount,
    parts: u64,
) -> Result<SecretIndex, CrosslockError> {
    if fill == 0 || fill > total || filled > total {
        return Err(CrosslockError::InvalidPartialFill(format!(
            "fill {fill} of {total} with {filled} already filled"
        )));
    }
    if filled == total {
        // This fill consumes the remainder of the order.
        return Ok(parts);
    }
    let numerator = filled
        .checked_add(fill)
        .and_then(|v| v.checked_sub(1))
        .and_then(|v| v.checked_mul(parts as u128))
        .ok_or_else(|| CrosslockError::InvalidPartialFill("index arithmetic overflow".into()))?;
    Ok((numerator / total) as SecretIndex)
}
