use ethers_core::utils::{format_units, parse_units};

use crate::{CoreError, CoreResult, U256};

/// Largest number of decimals the ledger's 256-bit amounts can represent.
const MAX_DECIMALS: u8 = 77;

const LIMB_BASE: f64 = 18_446_744_073_709_551_616.0;

/// Convert a user-entered decimal string (e.g. `"1.5"`) into the token's base
/// units. Amounts are never carried around as floating values once parsed.
pub fn parse_token_amount(input: &str, decimals: u8) -> CoreResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(CoreError::UnsupportedDecimals(decimals));
    }
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_amount(input, "empty"));
    }
    if trimmed.starts_with('-') {
        return Err(CoreError::invalid_amount(input, "negative"));
    }

    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(CoreError::invalid_amount(input, "not a decimal number"));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(CoreError::invalid_amount(
            input,
            format!("more than {decimals} fractional digits"),
        ));
    }

    parse_units(trimmed, u32::from(decimals))
        .map(Into::into)
        .map_err(|err| CoreError::invalid_amount(input, err.to_string()))
}

/// Render base units as a decimal string without trailing zeros.
pub fn format_token_amount(amount: U256, decimals: u8) -> CoreResult<String> {
    if decimals > MAX_DECIMALS {
        return Err(CoreError::UnsupportedDecimals(decimals));
    }
    let formatted = format_units(amount, u32::from(decimals))
        .map_err(|err| CoreError::invalid_amount(&amount.to_string(), err.to_string()))?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned())
}

/// Lossy conversion used only for display-side projections.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * LIMB_BASE + *limb as f64)
}

/// Base units scaled down by `decimals`, as a float for display-side maths.
pub fn base_units_to_decimal(value: U256, decimals: u8) -> f64 {
    u256_to_f64(value) / 10f64.powi(i32::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_amounts_into_base_units() {
        let amount = parse_token_amount("1.5", 18).unwrap();
        assert_eq!(amount, U256::from(1_500_000_000_000_000_000u128));

        let amount = parse_token_amount(" 250 ", 6).unwrap();
        assert_eq!(amount, U256::from(250_000_000u64));

        let amount = parse_token_amount(".25", 2).unwrap();
        assert_eq!(amount, U256::from(25u64));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for input in ["", "   ", "-1", "1.2.3", "abc", "1e18", "."] {
            assert!(
                matches!(
                    parse_token_amount(input, 18),
                    Err(CoreError::InvalidAmount { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_excess_precision() {
        let err = parse_token_amount("0.001", 2).unwrap_err();
        assert!(err.to_string().contains("more than 2 fractional digits"));
    }

    #[test]
    fn rejects_unsupported_decimals() {
        assert_eq!(
            parse_token_amount("1", 78),
            Err(CoreError::UnsupportedDecimals(78))
        );
    }

    #[test]
    fn formats_without_trailing_zeros() {
        let amount = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_token_amount(amount, 18).unwrap(), "1.5");
        assert_eq!(format_token_amount(U256::from(42u64), 0).unwrap(), "42");
        assert_eq!(format_token_amount(U256::from(2_000_000u64), 6).unwrap(), "2");
    }

    #[test]
    fn converts_large_values_to_floats() {
        assert_eq!(u256_to_f64(U256::from(12345u64)), 12345.0);
        let big = U256::from(u64::MAX) + U256::one();
        assert_eq!(u256_to_f64(big), LIMB_BASE);
        assert!((base_units_to_decimal(U256::from(1_500_000u64), 6) - 1.5).abs() < 1e-12);
    }
}
