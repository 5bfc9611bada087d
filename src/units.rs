//! Exact conversion from integer base units (wei, lamports, token units) to
//! decimal strings. Never goes through floating point.

use alloy_primitives::U256;
use thiserror::Error;

pub const WEI_DECIMALS: u8 = 18;
pub const LAMPORT_DECIMALS: u8 = 9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Invalid hex quantity: {0}")]
    InvalidHex(String),

    #[error("Invalid decimal quantity: {0}")]
    InvalidDecimal(String),
}

/// Parse a `0x`-prefixed hex quantity. A bare `0x` is zero.
pub fn parse_hex_quantity(raw: &str) -> Result<U256, UnitsError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 16).map_err(|_| UnitsError::InvalidHex(raw.to_string()))
}

pub fn parse_decimal_quantity(raw: &str) -> Result<U256, UnitsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::InvalidDecimal(raw.to_string()));
    }

    U256::from_str_radix(trimmed, 10).map_err(|_| UnitsError::InvalidDecimal(raw.to_string()))
}

/// Divide `raw` by `10^decimals` and render it without trailing zeros
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

pub fn format_wei(raw: U256) -> String {
    format_units(raw, WEI_DECIMALS)
}

pub fn format_lamports(lamports: u64) -> String {
    format_units(U256::from(lamports), LAMPORT_DECIMALS)
}

/// USD valuation of a decimal-string amount. Precision loss is acceptable here.
pub fn usd_value(amount: &str, price: f64) -> f64 {
    amount.parse::<f64>().map(|a| a * price).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_ether_in_wei() {
        let raw = parse_hex_quantity("0xde0b6b3a7640000").unwrap();
        assert_eq!(format_units(raw, 18), "1");
    }

    #[test]
    fn test_one_sol_in_lamports() {
        assert_eq!(format_lamports(1_000_000_000), "1");
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_lamports(5000), "0.000005");
        assert_eq!(format_units(U256::ZERO, 9), "0");
    }

    #[test]
    fn test_zero_decimals() {
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_amounts_beyond_u128() {
        // 2^128 token units with 18 decimals
        let raw = parse_hex_quantity("0x100000000000000000000000000000000").unwrap();
        assert_eq!(format_units(raw, 18), "340282366920938463463.374607431768211456");
    }

    #[test]
    fn test_hex_edge_cases() {
        assert_eq!(parse_hex_quantity("0x").unwrap(), U256::ZERO);
        assert_eq!(parse_hex_quantity("0x0").unwrap(), U256::ZERO);
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(parse_decimal_quantity("21000").unwrap(), U256::from(21000u64));
        assert!(parse_decimal_quantity("-1").is_err());
        assert!(parse_decimal_quantity("").is_err());
    }

    #[test]
    fn test_usd_value() {
        assert_eq!(usd_value("2.5", 2.0), 5.0);
        assert_eq!(usd_value("not-a-number", 2.0), 0.0);
    }
}
