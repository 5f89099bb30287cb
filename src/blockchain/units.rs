// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between human-readable amounts and base units.

use std::str::FromStr;

use alloy::primitives::U256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("Amount overflow")]
    Overflow,
}

/// Parse a human-readable amount to base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for WETH, 6 for USDC)
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }

    // Trailing zeros past the token precision carry no value.
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals(decimals));
    }

    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let digits = format!("{whole}{padded}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str(digits).map_err(|_| UnitsError::Overflow)
}

/// Format base units to a human-readable amount with full precision.
pub fn format_units(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Format base units for balance display: at most 6 fractional digits, truncated.
pub fn format_balance(amount: U256, decimals: u8) -> String {
    let full = format_units(amount, decimals);
    match full.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = &fraction[..fraction.len().min(6)];
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => full,
    }
}

/// Format base units with exactly `places` fractional digits, rounding half up.
pub fn format_fixed(amount: U256, decimals: u8, places: u8) -> String {
    let scaled = if places >= decimals {
        amount * U256::from(10u64).pow(U256::from(places - decimals))
    } else {
        let divisor = U256::from(10u64).pow(U256::from(decimals - places));
        let half = divisor / U256::from(2u64);
        (amount + half) / divisor
    };

    if places == 0 {
        return scaled.to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(places));
    format!(
        "{}.{:0>width$}",
        scaled / divisor,
        (scaled % divisor).to_string(),
        width = places as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units_whole_and_decimal() {
        assert_eq!(
            parse_units("1", 18).unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_units("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_units(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_units("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_units_rejects_bad_input() {
        assert!(matches!(
            parse_units("1.2.3", 6),
            Err(UnitsError::InvalidFormat(_))
        ));
        assert!(matches!(parse_units("-1", 6), Err(UnitsError::InvalidFormat(_))));
        assert!(matches!(parse_units("", 6), Err(UnitsError::InvalidFormat(_))));
        assert_eq!(
            parse_units("0.0000001", 6),
            Err(UnitsError::TooManyDecimals(6))
        );
    }

    #[test]
    fn test_parse_units_ignores_trailing_zeros() {
        assert_eq!(parse_units("49.94850000", 6).unwrap(), U256::from(49_948_500u64));
        assert_eq!(parse_units("0.0", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(
            format_units(U256::from(1_234_567_890_000_000_000u64), 18),
            "1.23456789"
        );
    }

    #[test]
    fn test_format_balance_truncates_to_six_places() {
        assert_eq!(
            format_balance(U256::from(1_234_567_890_000_000_000u64), 18),
            "1.234567"
        );
        assert_eq!(format_balance(U256::from(1_000_000_000_000u64), 18), "0.000001");
        assert_eq!(format_balance(U256::from(100u64), 18), "0");
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(U256::from(49_948_500u64), 6, 6), "49.948500");
        assert_eq!(format_fixed(U256::from(51_500u64), 6, 6), "0.051500");
        assert_eq!(format_fixed(U256::from(1_555u64), 3, 2), "1.56");
        assert_eq!(format_fixed(U256::from(15u64), 1, 0), "2");
    }
}
