// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-form fee state machine.
//!
//! A [`FeeSession`] tracks one transfer form: selected chain, recipient,
//! amount and the sender's balance. Two independent lanes keep the fees
//! current:
//!
//! - the base lane probes a minimal self-transfer whenever the chain
//!   changes, which yields the max sendable amount;
//! - the transaction lane re-estimates the real transfer whenever chain,
//!   recipient or amount change and all three are usable.
//!
//! Every input change is debounced and issues a new request token for the
//! lanes it affects. Results are applied only while their token is current
//! and the session is open, so a slow response can never overwrite a newer
//! one. State is published through a `tokio::sync::watch` channel.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::calculator::{is_insufficient, max_sendable, FeeCalculator, TransferContext};
use super::sequencer::{Debouncer, Ticket};
use super::FeeError;
use crate::blockchain::{
    erc20, format_units, parse_address, parse_units, Erc20Token, USDC_TOKEN,
};
use crate::cab::{CallSubmitter, SendCallsRequest};

/// Outcome of one lane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Estimate {
    /// Nothing requested yet, or the inputs no longer allow a request.
    #[default]
    Unknown,
    Pending,
    Ready(U256),
    Failed(String),
}

impl Estimate {
    pub fn value(&self) -> Option<U256> {
        match self {
            Estimate::Ready(fee) => Some(*fee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeePhase {
    Idle,
    EstimatingBaseFee,
    BaseFeeReady,
    BaseFeeFailed,
    EstimatingTxFee,
    TxFeeReady,
    TxFeeFailed,
    Closed,
}

/// Published state of a session. Derived values are computed on read so
/// they always reflect the latest amount, fee and balance together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeSnapshot {
    pub chain_id: Option<u64>,
    pub recipient: Option<Address>,
    pub recipient_error: Option<String>,
    pub amount: Option<U256>,
    pub amount_error: Option<String>,
    pub balance: U256,
    pub base_fee: Estimate,
    pub tx_fee: Estimate,
    pub closed: bool,
}

impl FeeSnapshot {
    pub fn phase(&self) -> FeePhase {
        if self.closed {
            return FeePhase::Closed;
        }
        match (&self.tx_fee, &self.base_fee) {
            (Estimate::Pending, _) => FeePhase::EstimatingTxFee,
            (Estimate::Ready(_), _) => FeePhase::TxFeeReady,
            (Estimate::Failed(_), _) => FeePhase::TxFeeFailed,
            (Estimate::Unknown, Estimate::Pending) => FeePhase::EstimatingBaseFee,
            (Estimate::Unknown, Estimate::Ready(_)) => FeePhase::BaseFeeReady,
            (Estimate::Unknown, Estimate::Failed(_)) => FeePhase::BaseFeeFailed,
            (Estimate::Unknown, Estimate::Unknown) => FeePhase::Idle,
        }
    }

    /// Fee the insufficient check runs against.
    ///
    /// The transaction fee once one was requested; the base fee only while
    /// no transaction estimate exists. `None` while pending or failed.
    pub fn current_fee(&self) -> Option<U256> {
        match &self.tx_fee {
            Estimate::Unknown => self.base_fee.value(),
            other => other.value(),
        }
    }

    /// Largest sendable amount, unknown until the base fee is.
    pub fn max_amount(&self) -> Option<U256> {
        self.base_fee
            .value()
            .map(|fee| max_sendable(self.balance, fee))
    }

    /// `Some(false)` with no amount entered, `None` when the fee is unknown.
    pub fn insufficient(&self) -> Option<bool> {
        let Some(amount) = self.amount else {
            return Some(false);
        };
        self.current_fee()
            .map(|fee| is_insufficient(amount, fee, self.balance))
    }

    pub fn can_submit(&self) -> bool {
        !self.closed
            && self.recipient.is_some()
            && self.amount.is_some_and(|a| !a.is_zero())
            && matches!(self.tx_fee, Estimate::Ready(_))
            && self.insufficient() == Some(false)
    }

    fn transfer_inputs(&self) -> Option<(u64, Address, U256)> {
        let chain_id = self.chain_id?;
        let recipient = self.recipient?;
        let amount = self.amount.filter(|a| !a.is_zero())?;
        Some((chain_id, recipient, amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("fee is not known yet")]
    FeeUnknown,

    #[error("insufficient balance to cover amount and fee")]
    InsufficientBalance,

    #[error("submission failed: {0}")]
    SubmissionFailure(String),

    #[error(transparent)]
    Fee(#[from] FeeError),
}

#[derive(Debug, Clone, Copy)]
enum Lane {
    Base,
    Transaction,
}

impl Lane {
    fn slot(self, snapshot: &mut FeeSnapshot) -> &mut Estimate {
        match self {
            Lane::Base => &mut snapshot.base_fee,
            Lane::Transaction => &mut snapshot.tx_fee,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Lane::Base => "base",
            Lane::Transaction => "transaction",
        }
    }
}

/// Lanes an input change affects.
#[derive(Debug, Clone, Copy)]
struct Refresh {
    base: bool,
    transaction: bool,
}

type BaseJob = (Ticket, TransferContext);
type TransactionJob = (Ticket, TransferContext, Address, U256);

pub struct FeeSession {
    id: Uuid,
    sender: Address,
    token: Erc20Token,
    calculator: FeeCalculator,
    submitter: Arc<dyn CallSubmitter>,
    base_lane: Debouncer,
    tx_lane: Debouncer,
    state: Arc<watch::Sender<FeeSnapshot>>,
    cancel: CancellationToken,
}

impl FeeSession {
    /// Open a USDC transfer session for `sender`.
    pub fn new(
        calculator: FeeCalculator,
        submitter: Arc<dyn CallSubmitter>,
        sender: Address,
        debounce: Duration,
    ) -> Self {
        let (state, _) = watch::channel(FeeSnapshot::default());
        let session = Self {
            id: Uuid::new_v4(),
            sender,
            token: USDC_TOKEN,
            calculator,
            submitter,
            base_lane: Debouncer::new(debounce),
            tx_lane: Debouncer::new(debounce),
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        };
        debug!(session = %session.id, sender = %sender, "fee session opened");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> watch::Receiver<FeeSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeeSnapshot {
        self.state.borrow().clone()
    }

    pub fn select_chain(&self, chain_id: u64) -> Result<(), SessionError> {
        TransferContext::new(chain_id, self.token.symbol, self.sender)?;
        self.apply(
            Refresh {
                base: true,
                transaction: true,
            },
            |s| s.chain_id = Some(chain_id),
        )
    }

    /// Set the recipient. An empty input clears it; an invalid one is
    /// recorded and never reaches the estimator.
    pub fn set_recipient(&self, raw: &str) -> Result<(), SessionError> {
        let raw = raw.trim();
        let parsed = if raw.is_empty() {
            Ok(None)
        } else {
            parse_address(raw).map(Some).map_err(|e| e.to_string())
        };

        let outcome = parsed.clone().map(|_| ()).map_err(SessionError::InvalidRecipient);
        self.apply(
            Refresh {
                base: false,
                transaction: true,
            },
            move |s| match parsed {
                Ok(recipient) => {
                    s.recipient = recipient;
                    s.recipient_error = None;
                }
                Err(e) => {
                    s.recipient = None;
                    s.recipient_error = Some(e);
                }
            },
        )?;
        outcome
    }

    /// Set the amount as typed, in token units.
    pub fn set_amount(&self, raw: &str) -> Result<(), SessionError> {
        let raw = raw.trim();
        let parsed = if raw.is_empty() {
            Ok(None)
        } else {
            parse_units(raw, self.token.decimals)
                .map(Some)
                .map_err(|e| e.to_string())
        };

        let outcome = parsed.clone().map(|_| ()).map_err(SessionError::InvalidAmount);
        self.apply(
            Refresh {
                base: false,
                transaction: true,
            },
            move |s| match parsed {
                Ok(amount) => {
                    s.amount = amount;
                    s.amount_error = None;
                }
                Err(e) => {
                    s.amount = None;
                    s.amount_error = Some(e);
                }
            },
        )?;
        outcome
    }

    /// Update the available balance. Derived values follow immediately;
    /// no estimate is re-requested.
    pub fn set_balance(&self, balance: U256) -> Result<(), SessionError> {
        self.apply(
            Refresh {
                base: false,
                transaction: false,
            },
            |s| s.balance = balance,
        )
    }

    /// Current max amount formatted in token units, for the "Max" action.
    pub fn max_amount(&self) -> Option<String> {
        self.state
            .borrow()
            .max_amount()
            .map(|max| format_units(max, self.token.decimals))
    }

    /// Validate the form and submit the transfer. Success closes the
    /// session; a failed submission leaves it open for another attempt.
    pub async fn submit(&self) -> Result<String, SessionError> {
        let snapshot = self.snapshot();
        if snapshot.closed {
            return Err(SessionError::Closed);
        }
        if let Some(e) = &snapshot.recipient_error {
            return Err(SessionError::InvalidRecipient(e.clone()));
        }
        let recipient = snapshot
            .recipient
            .ok_or_else(|| SessionError::InvalidRecipient("recipient is required".to_string()))?;
        let amount = snapshot
            .amount
            .filter(|a| !a.is_zero())
            .ok_or_else(|| SessionError::InvalidAmount("amount must be positive".to_string()))?;
        let chain_id = snapshot.chain_id.ok_or(SessionError::FeeUnknown)?;
        if !matches!(snapshot.tx_fee, Estimate::Ready(_)) {
            return Err(SessionError::FeeUnknown);
        }
        if snapshot.insufficient() != Some(false) {
            return Err(SessionError::InsufficientBalance);
        }

        let ctx = TransferContext::new(chain_id, self.token.symbol, self.sender)?;
        let request = SendCallsRequest {
            account: self.sender,
            chain_id,
            calls: vec![erc20::transfer_call(ctx.token.address, recipient, amount)],
        };

        match self.submitter.send_calls(&request).await {
            Ok(hash) => {
                info!(session = %self.id, chain_id, user_op_hash = %hash, "transfer submitted");
                self.close();
                Ok(hash)
            }
            Err(e) => {
                warn!(session = %self.id, chain_id, error = %e, "transfer submission failed");
                Err(SessionError::SubmissionFailure(e.to_string()))
            }
        }
    }

    /// Close the session. Pending and in-flight estimates are abandoned.
    pub fn close(&self) {
        let closed = self.state.send_if_modified(|s| {
            if s.closed {
                return false;
            }
            s.closed = true;
            true
        });
        self.base_lane.cancel();
        self.tx_lane.cancel();
        self.cancel.cancel();
        if closed {
            debug!(session = %self.id, "fee session closed");
        }
    }

    /// Edit the state and start whichever lanes the edit affects.
    ///
    /// Tickets are issued while the state is locked, so a result resolving
    /// concurrently observes either the old token or the new inputs.
    fn apply<F>(&self, refresh: Refresh, edit: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut FeeSnapshot),
    {
        let mut open = false;
        let mut base_job: Option<BaseJob> = None;
        let mut tx_job: Option<TransactionJob> = None;

        self.state.send_if_modified(|s| {
            if s.closed {
                return false;
            }
            open = true;
            edit(s);

            if refresh.base {
                match s.chain_id.and_then(|id| self.context(id)) {
                    Some(ctx) => {
                        s.base_fee = Estimate::Pending;
                        base_job = Some((self.base_lane.ticket(), ctx));
                    }
                    None => {
                        self.base_lane.cancel();
                        s.base_fee = Estimate::Unknown;
                    }
                }
            }

            if refresh.transaction {
                let inputs = s.transfer_inputs().and_then(|(chain_id, recipient, amount)| {
                    self.context(chain_id).map(|ctx| (ctx, recipient, amount))
                });
                match inputs {
                    Some((ctx, recipient, amount)) => {
                        s.tx_fee = Estimate::Pending;
                        tx_job = Some((self.tx_lane.ticket(), ctx, recipient, amount));
                    }
                    None => {
                        self.tx_lane.cancel();
                        s.tx_fee = Estimate::Unknown;
                    }
                }
            }
            true
        });

        if !open {
            return Err(SessionError::Closed);
        }
        if let Some((ticket, ctx)) = base_job {
            self.spawn_base(ticket, ctx);
        }
        if let Some((ticket, ctx, recipient, amount)) = tx_job {
            self.spawn_transaction(ticket, ctx, recipient, amount);
        }
        Ok(())
    }

    fn context(&self, chain_id: u64) -> Option<TransferContext> {
        TransferContext::new(chain_id, self.token.symbol, self.sender).ok()
    }

    fn spawn_base(&self, ticket: Ticket, ctx: TransferContext) {
        let calculator = self.calculator.clone();
        let state = self.state.clone();
        let cancel = self.cancel.clone();
        let id = self.id;
        self.base_lane.spawn_after_window(ticket, move |ticket| async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = calculator.base_fee(&ctx) => result,
            };
            resolve(id, &state, &ticket, Lane::Base, ctx.chain_id(), result);
        });
    }

    fn spawn_transaction(
        &self,
        ticket: Ticket,
        ctx: TransferContext,
        recipient: Address,
        amount: U256,
    ) {
        let calculator = self.calculator.clone();
        let state = self.state.clone();
        let cancel = self.cancel.clone();
        let id = self.id;
        self.tx_lane.spawn_after_window(ticket, move |ticket| async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = calculator.transfer_fee(&ctx, recipient, amount) => result,
            };
            resolve(id, &state, &ticket, Lane::Transaction, ctx.chain_id(), result);
        });
    }
}

impl Drop for FeeSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn resolve(
    session: Uuid,
    state: &watch::Sender<FeeSnapshot>,
    ticket: &Ticket,
    lane: Lane,
    chain_id: u64,
    result: Result<U256, FeeError>,
) {
    if let Err(e) = &result {
        warn!(%session, chain_id, lane = lane.name(), error = %e, "fee estimation failed");
    }

    let applied = state.send_if_modified(|s| {
        if s.closed || !ticket.is_current() {
            return false;
        }
        *lane.slot(s) = match result {
            Ok(fee) => Estimate::Ready(fee),
            Err(e) => Estimate::Failed(e.to_string()),
        };
        true
    });

    if !applied {
        debug!(%session, lane = lane.name(), token = ticket.token(), "stale fee estimate discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use alloy::sol_types::SolCall;
    use async_trait::async_trait;

    use crate::blockchain::parse_units;
    use crate::cab::{CabError, FeeEstimator, FeeQuote, FeeRequest};
    use crate::fees::{FeeBuffer, PROBE_AMOUNT};

    const CHAIN: u64 = 8453;
    const RECIPIENT: &str = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12";

    fn usdc(value: &str) -> U256 {
        parse_units(value, 6).unwrap()
    }

    fn sender() -> Address {
        Address::repeat_byte(0x11)
    }

    /// Base probe costs a flat fee; a transfer costs 1% of its amount.
    /// Delays and failures are keyed by the transferred amount.
    #[derive(Default)]
    struct ScriptedEstimator {
        base_fee: U256,
        delays: HashMap<U256, Duration>,
        failing: HashSet<U256>,
        requests: Mutex<Vec<U256>>,
    }

    impl ScriptedEstimator {
        fn new(base_fee: U256) -> Self {
            Self {
                base_fee,
                ..Default::default()
            }
        }

        fn transfer_requests(&self) -> Vec<U256> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .copied()
                .filter(|amount| *amount != PROBE_AMOUNT)
                .collect()
        }
    }

    #[async_trait]
    impl FeeEstimator for ScriptedEstimator {
        async fn estimate_fees(&self, request: &FeeRequest) -> Result<FeeQuote, CabError> {
            let decoded =
                erc20::IERC20::transferCall::abi_decode(&request.calls[0].data).unwrap();
            let amount = decoded.amount;
            self.requests.lock().unwrap().push(amount);

            if let Some(delay) = self.delays.get(&amount) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(&amount) {
                return Err(CabError::Request("estimation backend unavailable".to_string()));
            }

            let estimated_fee = if amount == PROBE_AMOUNT {
                self.base_fee
            } else {
                amount / U256::from(100u64)
            };
            Ok(FeeQuote {
                estimated_fee,
                error: None,
            })
        }
    }

    struct RecordingSubmitter {
        fail: bool,
        requests: Mutex<Vec<SendCallsRequest>>,
    }

    impl RecordingSubmitter {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CallSubmitter for RecordingSubmitter {
        async fn send_calls(&self, request: &SendCallsRequest) -> Result<String, CabError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                Err(CabError::Request("bundler rejected operation".to_string()))
            } else {
                Ok("0xfeed".to_string())
            }
        }
    }

    fn session_with(
        estimator: Arc<ScriptedEstimator>,
        submitter: Arc<RecordingSubmitter>,
    ) -> FeeSession {
        let calculator = FeeCalculator::new(estimator, FeeBuffer::DEFAULT);
        FeeSession::new(calculator, submitter, sender(), Duration::from_millis(300))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn chain_selection_yields_max_amount() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let session = session_with(estimator, Arc::new(RecordingSubmitter::new(false)));

        assert_eq!(session.snapshot().phase(), FeePhase::Idle);
        session.set_balance(usdc("50")).unwrap();
        session.select_chain(CHAIN).unwrap();
        assert_eq!(session.snapshot().phase(), FeePhase::EstimatingBaseFee);

        settle().await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase(), FeePhase::BaseFeeReady);
        assert_eq!(snapshot.base_fee, Estimate::Ready(usdc("0.0515")));
        assert_eq!(session.max_amount().as_deref(), Some("49.9485"));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_amount_edits_send_one_request_with_last_value() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let session = session_with(estimator.clone(), Arc::new(RecordingSubmitter::new(false)));
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();

        for amount in ["1", "12", "123"] {
            session.set_amount(amount).unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        settle().await;

        assert_eq!(estimator.transfer_requests(), vec![usdc("123")]);
        assert_eq!(session.snapshot().tx_fee, Estimate::Ready(usdc("1.2669")));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_is_discarded() {
        let mut estimator = ScriptedEstimator::new(usdc("0.05"));
        estimator.delays.insert(usdc("10"), Duration::from_secs(2));
        estimator.delays.insert(usdc("20"), Duration::from_millis(100));
        let estimator = Arc::new(estimator);
        let session = session_with(estimator.clone(), Arc::new(RecordingSubmitter::new(false)));
        session.set_balance(usdc("100")).unwrap();
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();

        session.set_amount("10").unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        session.set_amount("20").unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let fee_for_twenty = Estimate::Ready(usdc("0.206"));
        assert_eq!(session.snapshot().tx_fee, fee_for_twenty);

        settle().await;
        // both requests resolved, only the latest was applied
        assert_eq!(estimator.transfer_requests(), vec![usdc("10"), usdc("20")]);
        assert_eq!(session.snapshot().tx_fee, fee_for_twenty);
        assert_eq!(session.snapshot().phase(), FeePhase::TxFeeReady);
    }

    #[tokio::test(start_paused = true)]
    async fn estimation_failure_leaves_fee_unknown() {
        let mut estimator = ScriptedEstimator::new(usdc("0.05"));
        estimator.failing.insert(PROBE_AMOUNT);
        estimator.failing.insert(usdc("5"));
        let estimator = Arc::new(estimator);
        let session = session_with(estimator, Arc::new(RecordingSubmitter::new(false)));
        session.set_balance(usdc("100")).unwrap();
        session.select_chain(CHAIN).unwrap();
        settle().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase(), FeePhase::BaseFeeFailed);
        assert_eq!(snapshot.max_amount(), None);
        assert_eq!(session.max_amount(), None);

        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("5").unwrap();
        settle().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase(), FeePhase::TxFeeFailed);
        assert_eq!(snapshot.current_fee(), None);
        assert_eq!(snapshot.insufficient(), None);
        assert!(!snapshot.can_submit());
        assert_eq!(session.submit().await, Err(SessionError::FeeUnknown));
    }

    #[tokio::test(start_paused = true)]
    async fn insufficient_balance_blocks_submission() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let submitter = Arc::new(RecordingSubmitter::new(false));
        let session = session_with(estimator, submitter.clone());
        session.set_balance(usdc("10")).unwrap();
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("10").unwrap();
        settle().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.insufficient(), Some(true));
        assert!(!snapshot.can_submit());
        assert_eq!(session.submit().await, Err(SessionError::InsufficientBalance));

        // a balance top-up re-derives the flag without a new estimate
        session.set_balance(usdc("11")).unwrap();
        assert_eq!(session.snapshot().insufficient(), Some(false));
        assert!(submitter.requests.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_recipient_never_reaches_estimator() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let session = session_with(estimator.clone(), Arc::new(RecordingSubmitter::new(false)));
        session.select_chain(CHAIN).unwrap();

        assert!(matches!(
            session.set_recipient("0x1234"),
            Err(SessionError::InvalidRecipient(_))
        ));
        session.set_amount("5").unwrap();
        settle().await;

        assert!(estimator.transfer_requests().is_empty());
        let snapshot = session.snapshot();
        assert!(snapshot.recipient_error.is_some());
        assert_eq!(snapshot.tx_fee, Estimate::Unknown);
        assert_eq!(snapshot.phase(), FeePhase::BaseFeeReady);
        assert!(matches!(
            session.submit().await,
            Err(SessionError::InvalidRecipient(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_amount_resets_transaction_lane() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let session = session_with(estimator, Arc::new(RecordingSubmitter::new(false)));
        session.set_balance(usdc("100")).unwrap();
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("5").unwrap();
        settle().await;
        assert_eq!(session.snapshot().phase(), FeePhase::TxFeeReady);

        session.set_amount("").unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.tx_fee, Estimate::Unknown);
        assert_eq!(snapshot.phase(), FeePhase::BaseFeeReady);
        assert_eq!(snapshot.insufficient(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn close_discards_late_results() {
        let mut estimator = ScriptedEstimator::new(usdc("0.05"));
        estimator.delays.insert(usdc("5"), Duration::from_secs(2));
        let session = session_with(Arc::new(estimator), Arc::new(RecordingSubmitter::new(false)));
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("5").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        session.close();
        settle().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase(), FeePhase::Closed);
        assert_eq!(snapshot.tx_fee, Estimate::Pending);
        assert_eq!(session.set_amount("6"), Err(SessionError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submit_sends_transfer_and_closes() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let submitter = Arc::new(RecordingSubmitter::new(false));
        let session = session_with(estimator, submitter.clone());
        session.set_balance(usdc("100")).unwrap();
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("25.5").unwrap();
        settle().await;
        assert!(session.snapshot().can_submit());

        assert_eq!(session.submit().await.unwrap(), "0xfeed");
        assert_eq!(session.snapshot().phase(), FeePhase::Closed);

        let requests = submitter.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, sender());
        assert_eq!(requests[0].chain_id, CHAIN);
        let decoded = erc20::IERC20::transferCall::abi_decode(&requests[0].calls[0].data).unwrap();
        assert_eq!(decoded.to, parse_address(RECIPIENT).unwrap());
        assert_eq!(decoded.amount, usdc("25.5"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submit_keeps_session_open() {
        let estimator = Arc::new(ScriptedEstimator::new(usdc("0.05")));
        let session = session_with(estimator, Arc::new(RecordingSubmitter::new(true)));
        session.set_balance(usdc("100")).unwrap();
        session.select_chain(CHAIN).unwrap();
        session.set_recipient(RECIPIENT).unwrap();
        session.set_amount("1").unwrap();
        settle().await;

        assert!(matches!(
            session.submit().await,
            Err(SessionError::SubmissionFailure(_))
        ));
        let snapshot = session.snapshot();
        assert!(!snapshot.closed);
        assert!(snapshot.can_submit());
    }

    #[test]
    fn unsupported_chain_is_rejected() {
        let estimator = Arc::new(ScriptedEstimator::new(U256::ZERO));
        let calculator = FeeCalculator::new(estimator, FeeBuffer::DEFAULT);
        let session = FeeSession::new(
            calculator,
            Arc::new(RecordingSubmitter::new(false)),
            sender(),
            Duration::from_millis(300),
        );
        assert!(matches!(
            session.select_chain(1),
            Err(SessionError::Fee(FeeError::UnsupportedToken { chain_id: 1, .. }))
        ));
    }
}
