// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Calls batched into a single account-abstraction operation.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One call of a batched user operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    /// Explicit gas limit for builders that pin one (Aave flows).
    pub gas_limit: Option<u64>,
}

impl Call {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
            gas_limit: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Wire representation of a [`Call`]: hex strings and decimal integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallPayload {
    /// Target contract (checksummed 0x address)
    pub to: String,
    /// Native value in wei, decimal string
    pub value: String,
    /// 0x-prefixed calldata
    pub data: String,
    /// Optional gas limit, decimal string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
}

impl From<&Call> for CallPayload {
    fn from(call: &Call) -> Self {
        Self {
            to: call.to.to_checksum(None),
            value: call.value.to_string(),
            data: format!("0x{}", alloy::hex::encode(&call.data)),
            gas_limit: call.gas_limit.map(|g| g.to_string()),
        }
    }
}

pub fn to_payloads(calls: &[Call]) -> Vec<CallPayload> {
    calls.iter().map(CallPayload::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn payload_renders_hex_and_decimal_fields() {
        let call = Call::new(
            address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD"),
            vec![0xde, 0xad],
        )
        .with_gas_limit(300_000)
        .with_value(U256::from(7u64));

        let payload = CallPayload::from(&call);
        assert_eq!(payload.to, "0x794a61358D6845594F94dc1DB02A252b5b4814aD");
        assert_eq!(payload.data, "0xdead");
        assert_eq!(payload.value, "7");
        assert_eq!(payload.gas_limit.as_deref(), Some("300000"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["gasLimit"], "300000");
    }
}
