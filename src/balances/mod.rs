// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Multi-Chain Balance Aggregation
//!
//! Queries token balances on every supported chain in parallel and merges
//! them into `{ chain_id: { symbol: balance } }`. A failing chain does not
//! hide the others: its error is reported alongside the merged data, and
//! the aggregate error is the first failure in chain order.
//!
//! [`BalanceAggregator::fetch`] is a one-shot query used by the HTTP API.
//! [`BalanceTracker`] keeps per-chain query state for a long-lived view and
//! exposes `is_loading`, `error` and `refetch`.

pub mod cache;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::blockchain::{ChainClientError, ChainClients, TokenBalance};
use crate::fees::RequestSequencer;

pub use cache::{BalanceCache, DEFAULT_BALANCE_TTL};

/// Balances of one chain keyed by token symbol.
pub type ChainBalances = BTreeMap<String, TokenBalance>;

/// Source of per-chain balances.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn chain_balances(
        &self,
        chain_id: u64,
        owner: Address,
    ) -> Result<ChainBalances, ChainClientError>;
}

#[async_trait]
impl BalanceSource for ChainClients {
    async fn chain_balances(
        &self,
        chain_id: u64,
        owner: Address,
    ) -> Result<ChainBalances, ChainClientError> {
        self.get(chain_id)?.get_wallet_balances(owner).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainFailure {
    pub chain_id: u64,
    pub message: String,
}

/// Merged result of one query per chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregatedBalances {
    pub balances: BTreeMap<u64, ChainBalances>,
    /// Failed chains, in chain order.
    pub errors: Vec<ChainFailure>,
}

impl AggregatedBalances {
    /// First failure in chain order.
    pub fn error(&self) -> Option<&ChainFailure> {
        self.errors.first()
    }
}

pub struct BalanceAggregator {
    source: Arc<dyn BalanceSource>,
    chains: Vec<u64>,
}

impl BalanceAggregator {
    /// Aggregate over `chains`; their order decides which error is first.
    pub fn new(source: Arc<dyn BalanceSource>, chains: Vec<u64>) -> Self {
        Self { source, chains }
    }

    pub fn chains(&self) -> &[u64] {
        &self.chains
    }

    /// Query every chain in parallel and merge the results.
    pub async fn fetch(&self, owner: Address) -> AggregatedBalances {
        let mut tasks = JoinSet::new();
        for &chain_id in &self.chains {
            let source = self.source.clone();
            tasks.spawn(async move { (chain_id, source.chain_balances(chain_id, owner).await) });
        }

        let mut results: HashMap<u64, Result<ChainBalances, String>> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((chain_id, result)) => {
                    results.insert(chain_id, result.map_err(|e| e.to_string()));
                }
                Err(e) => warn!(error = %e, "balance query task failed"),
            }
        }

        let mut aggregate = AggregatedBalances::default();
        for &chain_id in &self.chains {
            match results.remove(&chain_id) {
                Some(Ok(balances)) => {
                    aggregate.balances.insert(chain_id, balances);
                }
                Some(Err(message)) => {
                    warn!(chain_id, owner = %owner, error = %message, "chain balance query failed");
                    aggregate.errors.push(ChainFailure { chain_id, message });
                }
                None => aggregate.errors.push(ChainFailure {
                    chain_id,
                    message: "balance query aborted".to_string(),
                }),
            }
        }
        aggregate
    }

    /// Start tracking `owner`; the first fetch starts immediately.
    pub fn track(&self, owner: Address) -> BalanceTracker {
        BalanceTracker::start(self.source.clone(), self.chains.clone(), owner)
    }
}

/// State of one chain's query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainQuery {
    pub chain_id: u64,
    pub loading: bool,
    /// Last successful result; kept while a refetch is in flight.
    pub data: Option<ChainBalances>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalanceView {
    pub queries: Vec<ChainQuery>,
}

impl BalanceView {
    pub fn is_loading(&self) -> bool {
        self.queries.iter().any(|q| q.loading)
    }

    pub fn error(&self) -> Option<ChainFailure> {
        self.queries.iter().find_map(|q| {
            q.error.as_ref().map(|message| ChainFailure {
                chain_id: q.chain_id,
                message: message.clone(),
            })
        })
    }

    /// Union of every chain with data.
    pub fn data(&self) -> BTreeMap<u64, ChainBalances> {
        self.queries
            .iter()
            .filter_map(|q| q.data.clone().map(|data| (q.chain_id, data)))
            .collect()
    }
}

/// Long-lived per-chain balance queries for one owner.
pub struct BalanceTracker {
    owner: Address,
    source: Arc<dyn BalanceSource>,
    sequencers: Vec<Arc<RequestSequencer>>,
    state: Arc<watch::Sender<BalanceView>>,
    cancel: CancellationToken,
}

impl BalanceTracker {
    fn start(source: Arc<dyn BalanceSource>, chains: Vec<u64>, owner: Address) -> Self {
        let queries = chains
            .iter()
            .map(|&chain_id| ChainQuery {
                chain_id,
                loading: false,
                data: None,
                error: None,
            })
            .collect();
        let (state, _) = watch::channel(BalanceView { queries });

        let tracker = Self {
            owner,
            source,
            sequencers: chains.iter().map(|_| Arc::new(RequestSequencer::new())).collect(),
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        };
        tracker.refetch();
        tracker
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn view(&self) -> BalanceView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceView> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<ChainFailure> {
        self.state.borrow().error()
    }

    pub fn data(&self) -> BTreeMap<u64, ChainBalances> {
        self.state.borrow().data()
    }

    /// Re-issue every chain query, superseding any still in flight.
    pub fn refetch(&self) {
        let mut issued = Vec::with_capacity(self.sequencers.len());
        self.state.send_modify(|view| {
            for (index, query) in view.queries.iter_mut().enumerate() {
                query.loading = true;
                issued.push((index, query.chain_id, self.sequencers[index].issue()));
            }
        });

        for (index, chain_id, token) in issued {
            let source = self.source.clone();
            let state = self.state.clone();
            let sequencer = self.sequencers[index].clone();
            let cancel = self.cancel.clone();
            let owner = self.owner;

            tokio::spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = source.chain_balances(chain_id, owner) => result,
                };
                let applied = state.send_if_modified(|view| {
                    if !sequencer.is_current(token) {
                        return false;
                    }
                    let query = &mut view.queries[index];
                    query.loading = false;
                    match result {
                        Ok(data) => {
                            query.data = Some(data);
                            query.error = None;
                        }
                        Err(e) => query.error = Some(e.to_string()),
                    }
                    true
                });
                if !applied {
                    debug!(chain_id, token, "stale balance result discarded");
                }
            });
        }
    }

    /// Wait until no chain query is in flight.
    pub async fn settled(&self) -> BalanceView {
        let mut receiver = self.state.subscribe();
        let view = match receiver.wait_for(|view| !view.is_loading()).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        view
    }
}

impl Drop for BalanceTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
