// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient address validation.

use std::str::FromStr;

use alloy::primitives::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Address must start with 0x")]
    MissingPrefix,

    #[error("Address must be 42 characters (0x + 40 hex)")]
    InvalidLength,

    #[error("Address must contain only hex characters")]
    InvalidHex,

    #[error("Address checksum does not match")]
    BadChecksum,
}

/// Parse an EVM address typed by a user.
///
/// All-lowercase and all-uppercase inputs are accepted as-is; mixed-case
/// input must carry a valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address, AddressError> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    if hex.len() != 40 {
        return Err(AddressError::InvalidLength);
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let candidate = format!("0x{hex}");
        return Address::parse_checksummed(&candidate, None).map_err(|_| AddressError::BadChecksum);
    }

    Address::from_str(hex).map_err(|_| AddressError::InvalidHex)
}

/// Whether `raw` is a valid recipient address.
pub fn is_valid_address(raw: &str) -> bool {
    parse_address(raw).is_ok()
}
