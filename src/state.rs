// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared handles injected into every request handler.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;

use crate::balances::{BalanceAggregator, BalanceCache, BalanceSource};
use crate::blockchain::{ChainClientError, ChainClients};
use crate::cab::{CabBalanceReader, CabClient, CabError, CallSubmitter};
use crate::config::AppConfig;
use crate::fees::{FeeCalculator, FeeSession};
use crate::protocols::aave::{AaveClient, AaveReader};
use crate::protocols::uniswap::{QuoteFeed, QuoteSource, UniswapClient};
use crate::sessions::{SessionRegistry, DEFAULT_SESSION_CAPACITY};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Chain(#[from] ChainClientError),

    #[error(transparent)]
    Cab(#[from] CabError),
}

#[derive(Clone)]
pub struct AppState {
    pub chains: ChainClients,
    pub balances: Arc<BalanceAggregator>,
    pub balance_cache: Arc<BalanceCache>,
    pub fees: FeeCalculator,
    pub cab_balance: Arc<dyn CabBalanceReader>,
    pub submitter: Arc<dyn CallSubmitter>,
    pub quotes: Arc<dyn QuoteSource>,
    pub aave: Arc<dyn AaveReader>,
    pub fee_debounce: Duration,
    pub quote_debounce: Duration,
    pub fee_sessions: Arc<SessionRegistry<FeeSession>>,
    pub quote_feeds: Arc<SessionRegistry<QuoteFeed>>,
}

impl AppState {
    /// Connect every chain client and the chain-abstraction service.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let chains = ChainClients::connect(&config.rpc_urls)?;
        let cab = Arc::new(CabClient::new(
            config.cab_api_url.clone(),
            config.cab_api_key.clone(),
        )?);
        let source: Arc<dyn BalanceSource> = Arc::new(chains.clone());

        Ok(Self {
            balances: Arc::new(BalanceAggregator::new(source, chains.chain_ids())),
            balance_cache: Arc::new(BalanceCache::new(
                config.balance_cache_capacity,
                config.balance_cache_ttl,
            )),
            fees: FeeCalculator::new(cab.clone(), config.fee_buffer),
            cab_balance: cab.clone(),
            submitter: cab,
            quotes: Arc::new(UniswapClient::new(chains.clone())),
            aave: Arc::new(AaveClient::new(chains.clone())),
            fee_debounce: config.fee_debounce,
            quote_debounce: config.quote_debounce,
            fee_sessions: Arc::new(SessionRegistry::new("fee", DEFAULT_SESSION_CAPACITY)),
            quote_feeds: Arc::new(SessionRegistry::new("quote", DEFAULT_SESSION_CAPACITY)),
            chains,
        })
    }

    /// Open a transfer form session for `sender` with the configured debounce.
    pub fn fee_session(&self, sender: Address) -> FeeSession {
        FeeSession::new(
            self.fees.clone(),
            self.submitter.clone(),
            sender,
            self.fee_debounce,
        )
    }

    /// Debounced quote stream for a swap form.
    pub fn quote_feed(&self) -> QuoteFeed {
        QuoteFeed::new(self.quotes.clone(), self.quote_debounce)
    }
}


#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::testing::test_state;
    use super::*;
    use crate::config::CAB_API_URL_ENV;

    #[test]
    fn from_config_connects_every_chain() {
        let config = AppConfig::from_lookup(|name| {
            (name == CAB_API_URL_ENV).then(|| "https://cab.example".to_string())
        })
        .unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.chains.chain_ids(), vec![10, 137, 8453, 42161]);
        assert_eq!(state.balances.chains(), &[10, 137, 8453, 42161]);
    }

    #[tokio::test(start_paused = true)]
    async fn fee_session_uses_injected_services() {
        let state = test_state();
        let session = state.fee_session(Address::repeat_byte(0x11));
        session.set_balance(U256::from(50_000_000u64)).unwrap();
        session.select_chain(8453).unwrap();

        let mut rx = session.subscribe();
        rx.wait_for(|s| s.max_amount().is_some()).await.unwrap();
        assert_eq!(session.max_amount().as_deref(), Some("49.9485"));
    }
}
