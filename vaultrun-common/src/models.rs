use alloy_primitives::Address;

use crate::errors::ValidationError;

/// Decimal precision of the three numeric domains a vault operates in.
///
/// Fetched once per adapter instance and cached for its lifetime; a wrong
/// value here corrupts every downstream scaling computation, which is why
/// lookups never fall back to a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecisionTriple {
    pub asset: u32,
    pub yield_token: u32,
    pub shares: u32,
}

/// Parses a vault or account address, accepting only the canonical
/// `0x` + 40 hex digits form (any letter case).
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| ValidationError::InvalidAddress(input.to_string()))?;
    if digits.len() != 40 {
        return Err(ValidationError::InvalidAddress(input.to_string()));
    }
    let raw = hex::decode(digits).map_err(|_| ValidationError::InvalidAddress(input.to_string()))?;
    Ok(Address::from_slice(&raw))
}

/// Canonical lower-case hex rendering with `0x` prefix.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower = parse_address("0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae").unwrap();
        let mixed = parse_address("0x7F723feE1E65A7d26bE51A05AF0B5eFEE4a7d5ae").unwrap();
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let input = "0x7F723feE1E65A7d26bE51A05AF0B5eFEE4a7d5ae";
        let once = format_address(&parse_address(input).unwrap());
        let twice = format_address(&parse_address(&once).unwrap());
        assert_eq!(once, twice);
        assert_eq!(once, "0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae");
    }

    #[rstest]
    #[case::missing_prefix("7f723fee1e65a7d26be51a05af0b5efee4a7d5ae")]
    #[case::too_short("0x7f723fee")]
    #[case::too_long("0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae00")]
    #[case::non_hex("0x7f723fee1e65a7d26be51a05af0b5efee4a7d5zz")]
    #[case::empty("")]
    fn test_parse_rejects_malformed(#[case] input: &str) {
        assert!(matches!(parse_address(input), Err(ValidationError::InvalidAddress(_))));
    }
}
