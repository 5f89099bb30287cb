// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Safety multiplier applied to every fee estimate.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;

use crate::blockchain::parse_units;

const BPS_DENOMINATOR: u32 = 10_000;

/// Multiplicative fee buffer stored in basis points (1.03 = 10 300).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBuffer {
    bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeBufferError {
    #[error("fee buffer must be a decimal such as 1.03: {0}")]
    Invalid(String),

    #[error("fee buffer {0} is outside the accepted range 1.00-1.10")]
    OutOfRange(String),
}

impl FeeBuffer {
    pub const MIN_BPS: u32 = 10_000;
    pub const MAX_BPS: u32 = 11_000;

    pub const DEFAULT: FeeBuffer = FeeBuffer { bps: 10_300 };

    pub fn from_bps(bps: u32) -> Result<Self, FeeBufferError> {
        if !(Self::MIN_BPS..=Self::MAX_BPS).contains(&bps) {
            return Err(FeeBufferError::OutOfRange(format_bps(bps)));
        }
        Ok(Self { bps })
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// Buffered fee, rounded up to the next base unit.
    pub fn apply(&self, fee: U256) -> U256 {
        let denominator = U256::from(BPS_DENOMINATOR);
        let scaled = fee.saturating_mul(U256::from(self.bps));
        let rounded = scaled / denominator;
        if (scaled % denominator).is_zero() {
            rounded
        } else {
            rounded + U256::from(1u64)
        }
    }
}

impl Default for FeeBuffer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for FeeBuffer {
    type Err = FeeBufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bps = parse_units(s, 4).map_err(|_| FeeBufferError::Invalid(s.to_string()))?;
        if bps > U256::from(Self::MAX_BPS) {
            return Err(FeeBufferError::OutOfRange(s.to_string()));
        }
        Self::from_bps(bps.to::<u32>())
    }
}

impl fmt::Display for FeeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_bps(self.bps))
    }
}

fn format_bps(bps: u32) -> String {
    let whole = bps / BPS_DENOMINATOR;
    let fraction = format!("{:04}", bps % BPS_DENOMINATOR);
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.len() < 2 {
        format!("{fraction:0<2}")
    } else {
        fraction.to_string()
    };
    format!("{whole}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_factors() {
        assert_eq!("1.03".parse::<FeeBuffer>().unwrap().bps(), 10_300);
        assert_eq!("1.1".parse::<FeeBuffer>().unwrap().bps(), 11_000);
        assert_eq!("1".parse::<FeeBuffer>().unwrap().bps(), 10_000);
        assert_eq!("1.0325".parse::<FeeBuffer>().unwrap().bps(), 10_325);
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert!(matches!(
            "1.2".parse::<FeeBuffer>(),
            Err(FeeBufferError::OutOfRange(_))
        ));
        assert!(matches!(
            "0.9".parse::<FeeBuffer>(),
            Err(FeeBufferError::OutOfRange(_))
        ));
        assert!(matches!(
            "abc".parse::<FeeBuffer>(),
            Err(FeeBufferError::Invalid(_))
        ));
        assert!(matches!(
            "1.00001".parse::<FeeBuffer>(),
            Err(FeeBufferError::Invalid(_))
        ));
    }

    #[test]
    fn apply_rounds_up() {
        let buffer = FeeBuffer::DEFAULT;
        // 0.05 USDC * 1.03 = 0.0515 USDC
        assert_eq!(buffer.apply(U256::from(50_000u64)), U256::from(51_500u64));
        // 1 * 1.03 = 1.03 -> 2 base units
        assert_eq!(buffer.apply(U256::from(1u64)), U256::from(2u64));
        assert_eq!(buffer.apply(U256::ZERO), U256::ZERO);
    }

    #[test]
    fn display_round_trips_common_factors() {
        assert_eq!(FeeBuffer::DEFAULT.to_string(), "1.03");
        assert_eq!(FeeBuffer::from_bps(11_000).unwrap().to_string(), "1.10");
        assert_eq!(FeeBuffer::from_bps(10_325).unwrap().to_string(), "1.0325");
    }
}
