// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee-aware maximum-amount calculation.
//!
//! The base fee is the buffered cost of transferring the smallest unit of
//! the token from the sender to itself. It approximates the fixed part of
//! an operation and is reserved from the balance before any amount is
//! known. Once a recipient and amount exist the fee is re-estimated for
//! the real transfer.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use super::{FeeBuffer, FeeError};
use crate::blockchain::{erc20, token_deployment, Call, TokenDeployment};
use crate::cab::{FeeEstimator, FeeRequest};

/// Probe amount for base-fee estimation: one base unit (0.000001 USDC).
pub const PROBE_AMOUNT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Token, chain and sender of a transfer being priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferContext {
    pub token: TokenDeployment,
    pub sender: Address,
}

impl TransferContext {
    pub fn new(chain_id: u64, symbol: &str, sender: Address) -> Result<Self, FeeError> {
        let token = token_deployment(chain_id, symbol).ok_or_else(|| FeeError::UnsupportedToken {
            chain_id,
            symbol: symbol.to_string(),
        })?;
        Ok(Self { token, sender })
    }

    pub fn chain_id(&self) -> u64 {
        self.token.chain_id
    }
}

/// Buffered base fee and the amount left to send after reserving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAmount {
    pub buffered_base_fee: U256,
    pub max_amount: U256,
}

#[derive(Clone)]
pub struct FeeCalculator {
    estimator: Arc<dyn FeeEstimator>,
    buffer: FeeBuffer,
}

impl FeeCalculator {
    pub fn new(estimator: Arc<dyn FeeEstimator>, buffer: FeeBuffer) -> Self {
        Self { estimator, buffer }
    }

    pub fn buffer(&self) -> FeeBuffer {
        self.buffer
    }

    /// Buffered fee of a minimal self-transfer on the context's chain.
    pub async fn base_fee(&self, ctx: &TransferContext) -> Result<U256, FeeError> {
        let probe = erc20::transfer_call(ctx.token.address, ctx.sender, PROBE_AMOUNT);
        self.buffered_estimate(ctx.chain_id(), probe).await
    }

    /// Buffered fee of transferring `amount` to `recipient`.
    pub async fn transfer_fee(
        &self,
        ctx: &TransferContext,
        recipient: Address,
        amount: U256,
    ) -> Result<U256, FeeError> {
        if amount.is_zero() {
            return Err(FeeError::ZeroAmount);
        }
        let call = erc20::transfer_call(ctx.token.address, recipient, amount);
        self.buffered_estimate(ctx.chain_id(), call).await
    }

    /// Base fee and the largest amount sendable from `balance`.
    pub async fn max_amount(
        &self,
        ctx: &TransferContext,
        balance: U256,
    ) -> Result<MaxAmount, FeeError> {
        let buffered_base_fee = self.base_fee(ctx).await?;
        Ok(MaxAmount {
            buffered_base_fee,
            max_amount: max_sendable(balance, buffered_base_fee),
        })
    }

    async fn buffered_estimate(&self, chain_id: u64, call: Call) -> Result<U256, FeeError> {
        let quote = self
            .estimator
            .estimate_fees(&FeeRequest::new(chain_id, vec![call]))
            .await
            .map_err(|e| FeeError::EstimationFailure(e.to_string()))?;

        if let Some(error) = quote.error {
            return Err(FeeError::EstimationFailure(error));
        }
        Ok(self.buffer.apply(quote.estimated_fee))
    }
}

/// `max(0, balance - fee)`.
pub fn max_sendable(balance: U256, buffered_fee: U256) -> U256 {
    balance.saturating_sub(buffered_fee)
}

/// Whether `amount` plus `fee` exceeds `balance`.
pub fn is_insufficient(amount: U256, fee: U256, balance: U256) -> bool {
    amount.saturating_add(fee) > balance
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use alloy::sol_types::SolCall;
    use async_trait::async_trait;

    use crate::blockchain::{format_fixed, parse_units};
    use crate::cab::{CabError, FeeQuote};

    /// Estimator returning a fixed fee and recording every request.
    pub(crate) struct FixedEstimator {
        pub fee: U256,
        pub error: Option<String>,
        pub requests: Mutex<Vec<FeeRequest>>,
    }

    impl FixedEstimator {
        pub(crate) fn new(fee: U256) -> Self {
            Self {
                fee,
                error: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FeeEstimator for FixedEstimator {
        async fn estimate_fees(&self, request: &FeeRequest) -> Result<FeeQuote, CabError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(FeeQuote {
                estimated_fee: self.fee,
                error: self.error.clone(),
            })
        }
    }

    struct RejectingEstimator;

    #[async_trait]
    impl FeeEstimator for RejectingEstimator {
        async fn estimate_fees(&self, _request: &FeeRequest) -> Result<FeeQuote, CabError> {
            Err(CabError::Request("connection refused".to_string()))
        }
    }

    fn sender() -> Address {
        Address::repeat_byte(0x11)
    }

    fn usdc(value: &str) -> U256 {
        parse_units(value, 6).unwrap()
    }

    #[test]
    fn max_sendable_never_negative() {
        assert_eq!(max_sendable(usdc("1"), usdc("2")), U256::ZERO);
        assert_eq!(max_sendable(usdc("2"), usdc("2")), U256::ZERO);
        assert_eq!(max_sendable(usdc("3"), usdc("2")), usdc("1"));
    }

    #[test]
    fn zero_balance_has_zero_max_regardless_of_fee() {
        for fee in [U256::ZERO, U256::from(1u64), usdc("1000")] {
            assert_eq!(max_sendable(U256::ZERO, fee), U256::ZERO);
        }
    }

    #[test]
    fn insufficient_when_amount_plus_fee_exceeds_balance() {
        assert!(is_insufficient(usdc("95"), usdc("6"), usdc("100")));
        assert!(!is_insufficient(usdc("95"), usdc("4"), usdc("100")));
        assert!(!is_insufficient(usdc("95"), usdc("5"), usdc("100")));
    }

    #[tokio::test]
    async fn max_amount_for_fifty_usdc_with_five_cent_fee() {
        let estimator = Arc::new(FixedEstimator::new(usdc("0.05")));
        let calculator = FeeCalculator::new(estimator.clone(), FeeBuffer::DEFAULT);
        let ctx = TransferContext::new(42161, "USDC", sender()).unwrap();

        let result = calculator.max_amount(&ctx, usdc("50")).await.unwrap();
        assert_eq!(result.buffered_base_fee, usdc("0.0515"));
        assert_eq!(format_fixed(result.max_amount, 6, 6), "49.948500");

        let requests = estimator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].chain_id, 42161);

        let probe = &requests[0].calls[0];
        assert_eq!(probe.to, ctx.token.address);
        let decoded = erc20::IERC20::transferCall::abi_decode(&probe.data).unwrap();
        assert_eq!(decoded.to, sender());
        assert_eq!(decoded.amount, PROBE_AMOUNT);
    }

    #[tokio::test]
    async fn base_fee_probe_is_idempotent() {
        let calculator = FeeCalculator::new(
            Arc::new(FixedEstimator::new(usdc("0.05"))),
            FeeBuffer::from_bps(11_000).unwrap(),
        );
        let ctx = TransferContext::new(8453, "USDC", sender()).unwrap();

        let first = calculator.base_fee(&ctx).await.unwrap();
        let second = calculator.base_fee(&ctx).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, usdc("0.055"));
    }

    #[tokio::test]
    async fn estimator_errors_become_estimation_failures() {
        let calculator = FeeCalculator::new(Arc::new(RejectingEstimator), FeeBuffer::DEFAULT);
        let ctx = TransferContext::new(10, "USDC", sender()).unwrap();
        assert!(matches!(
            calculator.max_amount(&ctx, usdc("50")).await,
            Err(FeeError::EstimationFailure(_))
        ));

        let mut flagged = FixedEstimator::new(usdc("0.05"));
        flagged.error = Some("route not found".to_string());
        let calculator = FeeCalculator::new(Arc::new(flagged), FeeBuffer::DEFAULT);
        match calculator.base_fee(&ctx).await {
            Err(FeeError::EstimationFailure(msg)) => assert_eq!(msg, "route not found"),
            other => panic!("expected estimation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transfer_fee_rejects_zero_amount() {
        let calculator =
            FeeCalculator::new(Arc::new(FixedEstimator::new(usdc("0.05"))), FeeBuffer::DEFAULT);
        let ctx = TransferContext::new(137, "USDC", sender()).unwrap();
        assert!(matches!(
            calculator.transfer_fee(&ctx, sender(), U256::ZERO).await,
            Err(FeeError::ZeroAmount)
        ));
    }

    #[test]
    fn context_rejects_missing_deployment() {
        assert!(matches!(
            TransferContext::new(8453, "USDT", sender()),
            Err(FeeError::UnsupportedToken { chain_id: 8453, .. })
        ));
    }
}
