//! Conversion of human-entered amounts into contract-native integers.
//!
//! All arithmetic is done on digit strings and U256, never through
//! floating point, so `scale_to_integer("1.000001", 18)` is exactly
//! `1000001000000000000`.

use alloy_primitives::U256;

use crate::errors::ValidationError;

/// Vault shares are quoted in a fixed 1e24 precision, independent of the
/// underlying asset's decimals. Scaling shares with the asset exponent (or
/// vice versa) produces amounts off by orders of magnitude, so the two
/// domains get separate entry points.
pub const SHARE_DECIMALS: u32 = 24;

/// Computes `floor(amount * 10^decimals)` for a non-negative decimal or
/// integer string.
pub fn scale_to_integer(amount: &str, decimals: u32) -> Result<U256, ValidationError> {
    let trimmed = amount.trim();
    if trimmed.starts_with('-') {
        return Err(ValidationError::NegativeAmount(amount.to_string()));
    }
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ValidationError::InvalidAmount(amount.to_string()));
    }
    if !is_digits(int_part) || !is_digits(frac_part) {
        return Err(ValidationError::InvalidAmount(amount.to_string()));
    }

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| ValidationError::AmountTooLarge(amount.to_string()))?;
    let mut value = parse_digits(int_part, amount)?
        .checked_mul(scale)
        .ok_or_else(|| ValidationError::AmountTooLarge(amount.to_string()))?;

    // Fractional digits beyond the precision are truncated, which is a
    // floor for non-negative amounts.
    let kept = &frac_part[..frac_part.len().min(decimals as usize)];
    if !kept.is_empty() {
        let frac_scale = U256::from(10u64)
            .checked_pow(U256::from(decimals - kept.len() as u32))
            .ok_or_else(|| ValidationError::AmountTooLarge(amount.to_string()))?;
        let frac = parse_digits(kept, amount)?
            .checked_mul(frac_scale)
            .ok_or_else(|| ValidationError::AmountTooLarge(amount.to_string()))?;
        value = value
            .checked_add(frac)
            .ok_or_else(|| ValidationError::AmountTooLarge(amount.to_string()))?;
    }
    Ok(value)
}

/// Scales a share amount with the fixed 1e24 share precision.
pub fn scale_shares(amount: &str) -> Result<U256, ValidationError> {
    scale_to_integer(amount, SHARE_DECIMALS)
}

/// Checks that `amount` is a well-formed non-negative number without
/// computing a scaled value. Lets actions reject bad input before any
/// remote call is made.
pub fn validate_amount(amount: &str) -> Result<(), ValidationError> {
    scale_to_integer(amount, 0).map(|_| ())
}

fn is_digits(part: &str) -> bool {
    part.chars().all(|c| c.is_ascii_digit())
}

fn parse_digits(digits: &str, original: &str) -> Result<U256, ValidationError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|_| ValidationError::AmountTooLarge(original.to_string()))
}
