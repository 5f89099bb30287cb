// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniswap V3 single-hop swaps.
//!
//! Quotes come from QuoterV2 via `eth_call`. Swaps are an ERC-20 approval
//! of the router followed by `exactInputSingle`, on SwapRouter where the
//! chain has one and SwapRouter02 otherwise. The two routers differ only
//! in the `deadline` field of the swap parameters.

use std::sync::Arc;
use std::time::Duration;

use alloy::{
    primitives::{
        address,
        aliases::{U160, U24},
        Address, U256,
    },
    sol,
    sol_types::SolCall,
};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::ProtocolError;
use crate::blockchain::{
    erc20, format_units, parse_units, token_deployment, Call, ChainClients, TokenDeployment,
};
use crate::fees::{Debouncer, Ticket};

sol! {
    #[sol(rpc)]
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (
                uint256 amountOut,
                uint160 sqrtPriceX96After,
                uint32 initializedTicksCrossed,
                uint256 gasEstimate
            );
    }
}

sol! {
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

sol! {
    interface ISwapRouter02 {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

/// 0.3% pool.
pub const DEFAULT_FEE_TIER: u32 = 3_000;
pub const FEE_TIERS: [u32; 4] = [100, 500, 3_000, 10_000];

/// 5% slippage tolerance, in basis points.
pub const SLIPPAGE_BPS: u64 = 500;

pub const SWAP_DEADLINE_SECS: u64 = 1_800;

/// Quiet window before a quote is requested while the amount is typed.
pub const QUOTE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Uniswap V3 periphery contracts on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniswapDeployment {
    pub chain_id: u64,
    pub factory: Address,
    pub quoter: Address,
    pub swap_router: Option<Address>,
    pub swap_router02: Address,
}

impl UniswapDeployment {
    /// Router the swap is sent to.
    pub fn router(&self) -> Address {
        self.swap_router.unwrap_or(self.swap_router02)
    }
}

const CANONICAL_FACTORY: Address = address!("0x1F98431c8aD98523631AE4a59f267346ea31F984");
const CANONICAL_QUOTER: Address = address!("0x61fFE014bA17989E743c5F6cB21bF9697530B21e");
const CANONICAL_ROUTER: Address = address!("0xE592427A0AEce92De3Edee1F18E0157C05861564");
const CANONICAL_ROUTER02: Address = address!("0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45");

const fn canonical(chain_id: u64) -> UniswapDeployment {
    UniswapDeployment {
        chain_id,
        factory: CANONICAL_FACTORY,
        quoter: CANONICAL_QUOTER,
        swap_router: Some(CANONICAL_ROUTER),
        swap_router02: CANONICAL_ROUTER02,
    }
}

pub const UNISWAP_DEPLOYMENTS: [UniswapDeployment; 4] = [
    canonical(10),
    canonical(137),
    UniswapDeployment {
        chain_id: 8453,
        factory: address!("0x33128a8fC17869897dcE68Ed026d694621f6FDfD"),
        quoter: address!("0x3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
        swap_router: None,
        swap_router02: address!("0x2626664c2603336E57B271c5C0b26F421741e481"),
    },
    canonical(42161),
];

pub fn deployment(chain_id: u64) -> Result<&'static UniswapDeployment, ProtocolError> {
    UNISWAP_DEPLOYMENTS
        .iter()
        .find(|d| d.chain_id == chain_id)
        .ok_or(ProtocolError::UnsupportedChain {
            protocol: "Uniswap V3",
            chain_id,
        })
}

/// A resolved single-hop exact-input swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub token_in: TokenDeployment,
    pub token_out: TokenDeployment,
    pub amount_in: U256,
    pub fee: u32,
}

impl SwapParams {
    /// Resolve symbols on `chain_id` and parse `amount_in` in token-in units.
    pub fn new(
        chain_id: u64,
        token_in: &str,
        token_out: &str,
        amount_in: &str,
        fee: u32,
    ) -> Result<Self, ProtocolError> {
        deployment(chain_id)?;
        if !FEE_TIERS.contains(&fee) {
            return Err(ProtocolError::InvalidFeeTier(fee));
        }
        let resolve = |symbol: &str| {
            token_deployment(chain_id, symbol).ok_or_else(|| ProtocolError::UnsupportedToken {
                chain_id,
                symbol: symbol.to_string(),
            })
        };
        let token_in = resolve(token_in)?;
        let token_out = resolve(token_out)?;
        if token_in.address == token_out.address {
            return Err(ProtocolError::SameToken);
        }

        let amount_in = parse_units(amount_in, token_in.decimals())?;
        if amount_in.is_zero() {
            return Err(ProtocolError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            token_in,
            token_out,
            amount_in,
            fee,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.token_in.chain_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub chain_id: u64,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    /// Quoted output in base units
    pub amount_out: String,
    pub amount_out_formatted: String,
    /// Output after slippage tolerance, in base units
    pub minimum_amount_out: String,
    pub fee: u32,
}

impl SwapQuote {
    pub fn new(params: &SwapParams, amount_out: U256) -> Self {
        Self {
            chain_id: params.chain_id(),
            token_in: params.token_in.symbol().to_string(),
            token_out: params.token_out.symbol().to_string(),
            amount_in: params.amount_in.to_string(),
            amount_out: amount_out.to_string(),
            amount_out_formatted: format_units(amount_out, params.token_out.decimals()),
            minimum_amount_out: minimum_output(amount_out).to_string(),
            fee: params.fee,
        }
    }
}

/// Quoted output less the slippage tolerance, rounded down.
///
/// Divides before multiplying so the full `U256` range is accepted.
pub fn minimum_output(quoted: U256) -> U256 {
    let keep = U256::from(10_000 - SLIPPAGE_BPS);
    let scale = U256::from(10_000u64);
    quoted / scale * keep + quoted % scale * keep / scale
}

/// Approve the router for `amount_in` and swap it into `recipient`'s account.
pub fn swap_calls(
    params: &SwapParams,
    recipient: Address,
    amount_out_minimum: U256,
    now_unix: u64,
) -> Result<Vec<Call>, ProtocolError> {
    let contracts = deployment(params.chain_id())?;
    let router = contracts.router();
    let approve = erc20::approve_call(params.token_in.address, router, params.amount_in);

    let data = match contracts.swap_router {
        Some(_) => ISwapRouter::exactInputSingleCall {
            params: ISwapRouter::ExactInputSingleParams {
                tokenIn: params.token_in.address,
                tokenOut: params.token_out.address,
                fee: U24::from(params.fee),
                recipient,
                deadline: U256::from(now_unix + SWAP_DEADLINE_SECS),
                amountIn: params.amount_in,
                amountOutMinimum: amount_out_minimum,
                sqrtPriceLimitX96: U160::ZERO,
            },
        }
        .abi_encode(),
        None => ISwapRouter02::exactInputSingleCall {
            params: ISwapRouter02::ExactInputSingleParams {
                tokenIn: params.token_in.address,
                tokenOut: params.token_out.address,
                fee: U24::from(params.fee),
                recipient,
                amountIn: params.amount_in,
                amountOutMinimum: amount_out_minimum,
                sqrtPriceLimitX96: U160::ZERO,
            },
        }
        .abi_encode(),
    };

    Ok(vec![approve, Call::new(router, data)])
}

/// Source of swap quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, params: &SwapParams) -> Result<SwapQuote, ProtocolError>;
}

/// QuoterV2 reader over the configured chain clients.
#[derive(Clone)]
pub struct UniswapClient {
    chains: ChainClients,
}

impl UniswapClient {
    pub fn new(chains: ChainClients) -> Self {
        Self { chains }
    }
}

#[async_trait]
impl QuoteSource for UniswapClient {
    async fn quote(&self, params: &SwapParams) -> Result<SwapQuote, ProtocolError> {
        let contracts = deployment(params.chain_id())?;
        let client = self.chains.get(params.chain_id())?;
        let quoter = IQuoterV2::new(contracts.quoter, client.provider().clone());

        let result = quoter
            .quoteExactInputSingle(IQuoterV2::QuoteExactInputSingleParams {
                tokenIn: params.token_in.address,
                tokenOut: params.token_out.address,
                amountIn: params.amount_in,
                fee: U24::from(params.fee),
                sqrtPriceLimitX96: U160::ZERO,
            })
            .call()
            .await
            .map_err(|e| ProtocolError::Quote(e.to_string()))?;

        debug!(
            chain_id = params.chain_id(),
            token_in = params.token_in.symbol(),
            token_out = params.token_out.symbol(),
            amount_out = %result.amountOut,
            "Uniswap quote received"
        );
        Ok(SwapQuote::new(params, result.amountOut))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuoteState {
    /// No usable amount entered.
    #[default]
    Idle,
    Pending,
    Ready(SwapQuote),
    Failed(String),
}

/// Debounced quote feed for a swap form.
///
/// Each accepted edit supersedes the previous one; only the latest quote
/// is published.
pub struct QuoteFeed {
    source: Arc<dyn QuoteSource>,
    debouncer: Debouncer,
    state: Arc<watch::Sender<QuoteState>>,
}

impl QuoteFeed {
    pub fn new(source: Arc<dyn QuoteSource>, window: Duration) -> Self {
        let (state, _) = watch::channel(QuoteState::Idle);
        Self {
            source,
            debouncer: Debouncer::new(window),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> QuoteState {
        self.state.borrow().clone()
    }

    /// Request a quote for the form's current input. Empty or zero amounts
    /// reset the feed without a request.
    pub fn update(&self, chain_id: u64, token_in: &str, token_out: &str, amount_in: &str, fee: u32) {
        if amount_in.trim().is_empty() {
            self.reset();
            return;
        }
        let params = match SwapParams::new(chain_id, token_in, token_out, amount_in, fee) {
            Ok(params) => params,
            Err(ProtocolError::InvalidAmount(_)) => {
                self.reset();
                return;
            }
            Err(e) => {
                self.debouncer.cancel();
                self.state.send_replace(QuoteState::Failed(e.to_string()));
                return;
            }
        };

        let mut ticket: Option<Ticket> = None;
        self.state.send_modify(|state| {
            *state = QuoteState::Pending;
            ticket = Some(self.debouncer.ticket());
        });
        let Some(ticket) = ticket else {
            return;
        };

        let source = self.source.clone();
        let state = self.state.clone();
        self.debouncer.spawn_after_window(ticket, move |ticket| async move {
            let result = source.quote(&params).await;
            if let Err(e) = &result {
                warn!(chain_id = params.chain_id(), error = %e, "Uniswap quote failed");
            }
            state.send_if_modified(|current| {
                if !ticket.is_current() {
                    return false;
                }
                *current = match result {
                    Ok(quote) => QuoteState::Ready(quote),
                    Err(e) => QuoteState::Failed(e.to_string()),
                };
                true
            });
        });
    }

    fn reset(&self) {
        self.state.send_modify(|state| {
            self.debouncer.cancel();
            *state = QuoteState::Idle;
        });
    }
}

impl Drop for QuoteFeed {
    fn drop(&mut self) {
        self.debouncer.cancel();
    }
}
