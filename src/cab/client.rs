// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the chain-abstraction service.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    CabBalanceReader, CabError, CallSubmitter, FeeEstimator, FeeQuote, FeeRequest,
    SendCallsRequest,
};
use crate::blockchain::{to_payloads, CallPayload, USDC_TOKEN};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct CabClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceBody<'a> {
    address: String,
    token: &'a str,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateFeesBody<'a> {
    calls: Vec<CallPayload>,
    chain_id: u64,
    repay_tokens: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateFeesResponse {
    #[serde(default)]
    estimated_fee: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCallsBody {
    account: String,
    chain_id: u64,
    calls: Vec<CallPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCallsResponse {
    user_op_hash: String,
}

impl CabClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, CabError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| CabError::Config(format!("invalid CAB_API_URL {base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CabError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key,
            http,
        })
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, CabError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| CabError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CabError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CabError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

#[async_trait]
impl FeeEstimator for CabClient {
    async fn estimate_fees(&self, request: &FeeRequest) -> Result<FeeQuote, CabError> {
        let body = EstimateFeesBody {
            calls: to_payloads(&request.calls),
            chain_id: request.chain_id,
            repay_tokens: &request.repay_tokens,
        };
        let response: EstimateFeesResponse = self.post_json("/estimate-fees", &body).await?;
        debug!(chain_id = request.chain_id, "CAB fee estimate received");
        quote_from_response(response)
    }
}

#[async_trait]
impl CabBalanceReader for CabClient {
    async fn read_balance(&self, owner: Address) -> Result<U256, CabError> {
        let body = BalanceBody {
            address: owner.to_checksum(None),
            token: USDC_TOKEN.symbol,
        };
        let response: BalanceResponse = self.post_json("/balance", &body).await?;
        let raw = value_to_string(&response.balance)
            .ok_or_else(|| CabError::InvalidResponse("balance is not a number".to_string()))?;
        U256::from_str(&raw)
            .map_err(|e| CabError::InvalidResponse(format!("balance {raw}: {e}")))
    }
}

#[async_trait]
impl CallSubmitter for CabClient {
    async fn send_calls(&self, request: &SendCallsRequest) -> Result<String, CabError> {
        let body = SendCallsBody {
            account: request.account.to_checksum(None),
            chain_id: request.chain_id,
            calls: to_payloads(&request.calls),
        };
        let response: SendCallsResponse = self.post_json("/send-calls", &body).await?;
        Ok(response.user_op_hash)
    }
}

fn quote_from_response(response: EstimateFeesResponse) -> Result<FeeQuote, CabError> {
    let error = response.error.and_then(|e| match e {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    });

    let estimated_fee = match response.estimated_fee.as_ref().and_then(value_to_string) {
        Some(raw) => fee_to_base_units(&raw, USDC_TOKEN.decimals)?,
        None if error.is_some() => U256::ZERO,
        None => {
            return Err(CabError::InvalidResponse(
                "estimatedFee missing from response".to_string(),
            ))
        }
    };

    Ok(FeeQuote {
        estimated_fee,
        error,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert a human-readable fee to base units, rounding any excess
/// precision up so the fee is never under-reported.
fn fee_to_base_units(raw: &str, decimals: u8) -> Result<U256, CabError> {
    let invalid = || CabError::InvalidResponse(format!("estimatedFee {raw} is not a decimal"));

    let normalized = if raw.contains(['e', 'E']) {
        let value: f64 = raw.parse().map_err(|_| invalid())?;
        format!("{value:.18}")
    } else {
        raw.to_string()
    };

    let (whole, fraction) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));
    let whole = if whole.is_empty() { "0" } else { whole };
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let keep = fraction.len().min(decimals as usize);
    let (kept, excess) = fraction.split_at(keep);
    let padded = format!("{:0<width$}", kept, width = decimals as usize);
    let mut units = U256::from_str(&format!("{whole}{padded}")).map_err(|_| invalid())?;
    if excess.bytes().any(|b| b != b'0') {
        units += U256::from(1u64);
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fee_to_base_units_rounds_excess_precision_up() {
        assert_eq!(fee_to_base_units("0.05", 6).unwrap(), U256::from(50_000u64));
        assert_eq!(fee_to_base_units("0.0500001", 6).unwrap(), U256::from(50_001u64));
        assert_eq!(fee_to_base_units("0.05000000", 6).unwrap(), U256::from(50_000u64));
        assert_eq!(fee_to_base_units("2", 6).unwrap(), U256::from(2_000_000u64));
        assert_eq!(fee_to_base_units("5e-7", 6).unwrap(), U256::from(1u64));
        assert!(fee_to_base_units("abc", 6).is_err());
    }

    #[test]
    fn quote_from_response_reads_number_and_error_flag() {
        let ok: EstimateFeesResponse =
            serde_json::from_value(json!({ "estimatedFee": 0.05 })).unwrap();
        let quote = quote_from_response(ok).unwrap();
        assert_eq!(quote.estimated_fee, U256::from(50_000u64));
        assert!(quote.error.is_none());

        let flagged: EstimateFeesResponse =
            serde_json::from_value(json!({ "error": "insufficient liquidity" })).unwrap();
        let quote = quote_from_response(flagged).unwrap();
        assert_eq!(quote.error.as_deref(), Some("insufficient liquidity"));

        let empty: EstimateFeesResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            quote_from_response(empty),
            Err(CabError::InvalidResponse(_))
        ));
    }

    #[test]
    fn falsy_error_field_is_not_a_failure() {
        for error in [json!(false), json!(""), json!("  "), json!(null)] {
            let response: EstimateFeesResponse =
                serde_json::from_value(json!({ "estimatedFee": "0.05", "error": error })).unwrap();
            let quote = quote_from_response(response).unwrap();
            assert_eq!(quote.estimated_fee, U256::from(50_000u64));
            assert!(quote.error.is_none(), "{error} flagged as an error");
        }

        let flagged: EstimateFeesResponse =
            serde_json::from_value(json!({ "estimatedFee": "0.05", "error": true })).unwrap();
        assert_eq!(quote_from_response(flagged).unwrap().error.as_deref(), Some("true"));
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        assert!(matches!(
            CabClient::new("not a url", None),
            Err(CabError::Config(_))
        ));
    }

    #[tokio::test]
    async fn client_round_trips_against_local_service() {
        use axum::{routing::post, Json, Router};

        let app = Router::new()
            .route(
                "/estimate-fees",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["chainId"], 8453);
                    assert_eq!(body["calls"].as_array().map(Vec::len), Some(1));
                    Json(json!({ "estimatedFee": "0.05" }))
                }),
            )
            .route(
                "/balance",
                post(|| async { Json(json!({ "balance": "50000000" })) }),
            )
            .route(
                "/send-calls",
                post(|| async { Json(json!({ "userOpHash": "0xabc" })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = CabClient::new(format!("http://{addr}"), None).unwrap();
        let usdc = crate::blockchain::token_deployment(8453, "USDC").unwrap();
        let call = crate::blockchain::erc20::transfer_call(usdc.address, usdc.address, U256::from(1u64));

        let quote = client
            .estimate_fees(&FeeRequest::new(8453, vec![call.clone()]))
            .await
            .unwrap();
        assert_eq!(quote.estimated_fee, U256::from(50_000u64));

        let balance = client.read_balance(usdc.address).await.unwrap();
        assert_eq!(balance, U256::from(50_000_000u64));

        let hash = client
            .send_calls(&SendCallsRequest {
                account: usdc.address,
                chain_id: 8453,
                calls: vec![call],
            })
            .await
            .unwrap();
        assert_eq!(hash, "0xabc");
    }
}
