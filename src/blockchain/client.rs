// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client, one per supported chain.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};

use super::erc20::Erc20Contract;
use super::types::*;
use super::units::format_balance;

/// HTTP provider type for EVM chains (with all fillers).
pub type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read-only client for a single EVM chain.
pub struct EvmClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: HttpProvider,
}

impl EvmClient {
    /// Create a new client for `network`, talking to `rpc_url`.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, ChainClientError> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            ChainClientError::InvalidRpcUrl(format!("{rpc_url}: {e}"))
        })?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    /// Get the native gas token balance for an address.
    pub async fn get_native_balance(&self, owner: Address) -> Result<TokenBalance, ChainClientError> {
        let balance = self
            .provider
            .get_balance(owner)
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))?;

        let symbol = if self.network.chain_id == POLYGON.chain_id {
            "POL"
        } else {
            "ETH"
        };

        Ok(TokenBalance {
            symbol: symbol.to_string(),
            name: self.network.name.to_string(),
            balance_raw: balance.to_string(),
            balance_formatted: format_balance(balance, 18),
            decimals: 18,
            contract_address: None,
        })
    }

    /// Get the ERC-20 token balance for an address.
    pub async fn get_token_balance(
        &self,
        owner: Address,
        deployment: TokenDeployment,
    ) -> Result<TokenBalance, ChainClientError> {
        if deployment.chain_id != self.network.chain_id {
            return Err(ChainClientError::UnsupportedToken(format!(
                "{} is not deployed on {}",
                deployment.symbol(),
                self.network.name
            )));
        }
        Erc20Contract::new(&self.provider, deployment)
            .balance_of(owner)
            .await
    }

    /// Get the native balance and every known token balance on this chain,
    /// keyed by symbol.
    ///
    /// A failing query is logged and skipped; the call only fails when
    /// every query failed.
    pub async fn get_wallet_balances(
        &self,
        owner: Address,
    ) -> Result<BTreeMap<String, TokenBalance>, ChainClientError> {
        let deployments = tokens_on_chain(self.network.chain_id);
        let mut balances = BTreeMap::new();
        let mut last_error = None;

        match self.get_native_balance(owner).await {
            Ok(balance) => {
                balances.insert(balance.symbol.clone(), balance);
            }
            Err(e) => {
                tracing::warn!(
                    chain_id = self.network.chain_id,
                    error = %e,
                    "Failed to get native balance"
                );
                last_error = Some(e);
            }
        }

        for deployment in &deployments {
            match self.get_token_balance(owner, *deployment).await {
                Ok(balance) => {
                    balances.insert(balance.symbol.clone(), balance);
                }
                Err(e) => {
                    tracing::warn!(
                        chain_id = self.network.chain_id,
                        token = deployment.symbol(),
                        error = %e,
                        "Failed to get token balance"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if balances.is_empty() => Err(e),
            _ => Ok(balances),
        }
    }

    /// Get the current block number.
    pub async fn get_block_number(&self) -> Result<u64, ChainClientError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Underlying provider, for protocol contract bindings.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

/// One [`EvmClient`] per supported chain.
#[derive(Clone, Default)]
pub struct ChainClients {
    clients: HashMap<u64, Arc<EvmClient>>,
}

impl ChainClients {
    /// Build clients for every supported network using the given RPC URLs.
    pub fn connect(rpc_urls: &HashMap<u64, String>) -> Result<Self, ChainClientError> {
        let mut clients = HashMap::new();
        for network in SUPPORTED_NETWORKS {
            let rpc_url = rpc_urls
                .get(&network.chain_id)
                .map(String::as_str)
                .unwrap_or(network.rpc_url);
            clients.insert(network.chain_id, Arc::new(EvmClient::new(network, rpc_url)?));
        }
        Ok(Self { clients })
    }

    pub fn get(&self, chain_id: u64) -> Result<Arc<EvmClient>, ChainClientError> {
        self.clients
            .get(&chain_id)
            .cloned()
            .ok_or(ChainClientError::UnsupportedChain(chain_id))
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.clients.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}
