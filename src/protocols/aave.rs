// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aave V3 lending: supply/withdraw calldata, supplied positions and
//! reserve yields across the supported chains.

use std::collections::HashMap;

use alloy::{
    primitives::{address, Address, U256},
    sol,
    sol_types::SolCall,
};
use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;
use utoipa::ToSchema;

use super::ProtocolError;
use crate::blockchain::{
    chain_name, erc20, format_balance, token_deployment, Call, ChainClients, TokenDeployment,
    USDC_TOKEN,
};

sol! {
    #[sol(rpc)]
    interface IAavePool {
        struct ReserveConfigurationMap {
            uint256 data;
        }

        struct ReserveData {
            ReserveConfigurationMap configuration;
            uint128 liquidityIndex;
            uint128 currentLiquidityRate;
            uint128 variableBorrowIndex;
            uint128 currentVariableBorrowRate;
            uint128 currentStableBorrowRate;
            uint40 lastUpdateTimestamp;
            uint16 id;
            address aTokenAddress;
            address stableDebtTokenAddress;
            address variableDebtTokenAddress;
            address interestRateStrategyAddress;
            uint128 accruedToTreasury;
            uint128 unbacked;
            uint128 isolationModeTotalDebt;
        }

        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
        function getReserveData(address asset) external view returns (ReserveData memory);
    }
}

pub const APPROVE_GAS_LIMIT: u64 = 150_000;
pub const SUPPLY_GAS_LIMIT: u64 = 300_000;
pub const WITHDRAW_GAS_LIMIT: u64 = 300_000;

/// Share of the balance kept back by the "max available" supply amount,
/// as a divisor of one whole token (0.1).
const SUPPLY_RESERVE_DIVISOR: u64 = 10;

/// Aave rates are expressed in ray (1e27).
const RAY: f64 = 1e27;

/// Aave V3 deployment on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AaveMarket {
    pub chain_id: u64,
    pub pool: Address,
    /// aToken minted for supplied USDC.
    pub usdc_a_token: Address,
}

pub const AAVE_MARKETS: [AaveMarket; 4] = [
    AaveMarket {
        chain_id: 10,
        pool: address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD"),
        usdc_a_token: address!("0x38d693cE1dF5AaDF7bC62595A37D667aD57922e5"),
    },
    AaveMarket {
        chain_id: 137,
        pool: address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD"),
        usdc_a_token: address!("0xA4D94019934D8333Ef880ABFFbF2FDd611C762BD"),
    },
    AaveMarket {
        chain_id: 8453,
        pool: address!("0xA238Dd80C259a72e81d7e4664a9801593F98d1c5"),
        usdc_a_token: address!("0x4e65fE4DbA92790696d040ac24Aa414708F5c0AB"),
    },
    AaveMarket {
        chain_id: 42161,
        pool: address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD"),
        usdc_a_token: address!("0x724dc807b04555b71ed48a6896b6F41593b8C637"),
    },
];

pub fn market(chain_id: u64) -> Result<&'static AaveMarket, ProtocolError> {
    AAVE_MARKETS
        .iter()
        .find(|m| m.chain_id == chain_id)
        .ok_or(ProtocolError::UnsupportedChain {
            protocol: "Aave V3",
            chain_id,
        })
}

pub fn pool_address(chain_id: u64) -> Result<Address, ProtocolError> {
    market(chain_id).map(|m| m.pool)
}

/// Approve the pool and supply `amount` of `asset` on behalf of `on_behalf_of`.
pub fn supply_calls(
    asset: TokenDeployment,
    amount: U256,
    on_behalf_of: Address,
) -> Result<Vec<Call>, ProtocolError> {
    let pool = pool_address(asset.chain_id)?;
    let approve = erc20::approve_call(asset.address, pool, amount).with_gas_limit(APPROVE_GAS_LIMIT);
    let supply = IAavePool::supplyCall {
        asset: asset.address,
        amount,
        onBehalfOf: on_behalf_of,
        referralCode: 0,
    };
    let supply = Call::new(pool, supply.abi_encode()).with_gas_limit(SUPPLY_GAS_LIMIT);
    Ok(vec![approve, supply])
}

/// Withdraw `amount` of `asset` to `to`. `U256::MAX` withdraws the whole position.
pub fn withdraw_call(asset: TokenDeployment, amount: U256, to: Address) -> Result<Call, ProtocolError> {
    let pool = pool_address(asset.chain_id)?;
    let data = IAavePool::withdrawCall {
        asset: asset.address,
        amount,
        to,
    }
    .abi_encode();
    Ok(Call::new(pool, data).with_gas_limit(WITHDRAW_GAS_LIMIT))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuppliedPosition {
    pub chain_id: u64,
    pub token: String,
    /// aToken balance in base units
    pub amount: String,
    pub amount_formatted: String,
    pub a_token_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YieldInfo {
    pub symbol: String,
    pub chain_id: u64,
    pub chain_name: String,
    /// Supply APR as a fraction (0.05 = 5%)
    pub supply_yield: f64,
    /// Variable borrow APR as a fraction
    pub borrow_yield: f64,
    pub token_address: String,
    /// aToken of the reserve
    pub market_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestYields {
    pub best_supply_yield: YieldInfo,
    pub best_borrow_yield: YieldInfo,
}

/// Largest amount offered for supply out of `balance`.
///
/// Keeps 0.1 token back for transaction costs and rounds the rest half up
/// to two decimals. Balances at or below the reserve give zero.
pub fn max_supply(balance: U256, decimals: u8) -> U256 {
    let reserve = U256::from(10u64).pow(U256::from(decimals)) / U256::from(SUPPLY_RESERVE_DIVISOR);
    let available = balance.saturating_sub(reserve);
    if available.is_zero() || decimals <= 2 {
        return available;
    }
    let cent = U256::from(10u64).pow(U256::from(decimals - 2));
    (available + cent / U256::from(2u64)) / cent * cent
}

pub fn ray_to_fraction(rate: u128) -> f64 {
    rate as f64 / RAY
}

/// Highest supply yield and lowest borrow yield. The earliest entry wins ties.
pub fn best_yields(infos: &[YieldInfo]) -> Option<BestYields> {
    let first = infos.first()?;
    let mut best_supply = first;
    let mut best_borrow = first;
    for info in infos {
        if info.supply_yield > best_supply.supply_yield {
            best_supply = info;
        }
        if info.borrow_yield < best_borrow.borrow_yield {
            best_borrow = info;
        }
    }
    Some(BestYields {
        best_supply_yield: best_supply.clone(),
        best_borrow_yield: best_borrow.clone(),
    })
}

/// Sort by supply yield, highest first.
pub fn sort_by_supply_yield(infos: &mut [YieldInfo]) {
    infos.sort_by(|a, b| b.supply_yield.total_cmp(&a.supply_yield));
}

/// Read-only Aave queries.
#[async_trait]
pub trait AaveReader: Send + Sync {
    /// Non-zero USDC supplies of `owner` on every market, in chain order.
    /// Chains that fail to answer are logged and omitted.
    async fn supplied_positions(&self, owner: Address) -> Vec<SuppliedPosition>;

    /// USDC reserve yields on every market, in chain order.
    async fn usdc_yields(&self) -> Vec<YieldInfo>;
}

/// [`AaveReader`] over the configured chain clients.
#[derive(Clone)]
pub struct AaveClient {
    chains: ChainClients,
}

impl AaveClient {
    pub fn new(chains: ChainClients) -> Self {
        Self { chains }
    }
}

#[async_trait]
impl AaveReader for AaveClient {
    async fn supplied_positions(&self, owner: Address) -> Vec<SuppliedPosition> {
        let mut tasks = JoinSet::new();
        for market in AAVE_MARKETS {
            let Ok(client) = self.chains.get(market.chain_id) else {
                continue;
            };
            tasks.spawn(async move {
                let a_token = erc20::IERC20::new(market.usdc_a_token, client.provider().clone());
                let balance = a_token.balanceOf(owner).call().await;
                (market, balance)
            });
        }

        let mut positions = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let Ok((market, balance)) = joined else {
                continue;
            };
            match balance {
                Ok(amount) if !amount.is_zero() => {
                    positions.insert(
                        market.chain_id,
                        SuppliedPosition {
                            chain_id: market.chain_id,
                            token: USDC_TOKEN.symbol.to_string(),
                            amount: amount.to_string(),
                            amount_formatted: format_balance(amount, USDC_TOKEN.decimals),
                            a_token_address: market.usdc_a_token.to_checksum(None),
                        },
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(
                    chain_id = market.chain_id,
                    error = %e,
                    "Failed to read Aave position"
                ),
            }
        }

        AAVE_MARKETS
            .iter()
            .filter_map(|m| positions.remove(&m.chain_id))
            .collect()
    }

    async fn usdc_yields(&self) -> Vec<YieldInfo> {
        let mut tasks = JoinSet::new();
        for market in AAVE_MARKETS {
            let (Ok(client), Some(usdc)) = (
                self.chains.get(market.chain_id),
                token_deployment(market.chain_id, USDC_TOKEN.symbol),
            ) else {
                continue;
            };
            tasks.spawn(async move {
                let pool = IAavePool::new(market.pool, client.provider().clone());
                let reserve = pool.getReserveData(usdc.address).call().await;
                (market, usdc, reserve)
            });
        }

        let mut yields = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let Ok((market, usdc, reserve)) = joined else {
                continue;
            };
            match reserve {
                Ok(data) => {
                    yields.insert(
                        market.chain_id,
                        YieldInfo {
                            symbol: usdc.symbol().to_string(),
                            chain_id: market.chain_id,
                            chain_name: chain_name(market.chain_id).to_string(),
                            supply_yield: ray_to_fraction(data.currentLiquidityRate),
                            borrow_yield: ray_to_fraction(data.currentVariableBorrowRate),
                            token_address: usdc.address.to_checksum(None),
                            market_address: data.aTokenAddress.to_checksum(None),
                        },
                    );
                }
                Err(e) => warn!(
                    chain_id = market.chain_id,
                    error = %e,
                    "Failed to read Aave reserve data"
                ),
            }
        }

        AAVE_MARKETS
            .iter()
            .filter_map(|m| yields.remove(&m.chain_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc(chain_id: u64) -> TokenDeployment {
        token_deployment(chain_id, "USDC").unwrap()
    }

    fn user() -> Address {
        address!("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")
    }

    fn yield_info(chain_id: u64, supply: f64, borrow: f64) -> YieldInfo {
        YieldInfo {
            symbol: "USDC".to_string(),
            chain_id,
            chain_name: chain_name(chain_id).to_string(),
            supply_yield: supply,
            borrow_yield: borrow,
            token_address: usdc(chain_id).address.to_checksum(None),
            market_address: market(chain_id).unwrap().usdc_a_token.to_checksum(None),
        }
    }

    #[test]
    fn supply_approves_pool_then_supplies() {
        let asset = usdc(42161);
        let amount = U256::from(25_000_000u64);
        let calls = supply_calls(asset, amount, user()).unwrap();
        assert_eq!(calls.len(), 2);

        let approve = erc20::IERC20::approveCall::abi_decode(&calls[0].data).unwrap();
        assert_eq!(calls[0].to, asset.address);
        assert_eq!(calls[0].gas_limit, Some(APPROVE_GAS_LIMIT));
        assert_eq!(approve.spender, pool_address(42161).unwrap());
        assert_eq!(approve.amount, amount);

        let supply = IAavePool::supplyCall::abi_decode(&calls[1].data).unwrap();
        assert_eq!(calls[1].to, pool_address(42161).unwrap());
        assert_eq!(calls[1].gas_limit, Some(SUPPLY_GAS_LIMIT));
        assert_eq!(supply.asset, asset.address);
        assert_eq!(supply.onBehalfOf, user());
        assert_eq!(supply.referralCode, 0);
    }

    #[test]
    fn base_uses_its_own_pool() {
        let calls = supply_calls(usdc(8453), U256::from(1u64), user()).unwrap();
        assert_eq!(
            calls[1].to,
            address!("0xA238Dd80C259a72e81d7e4664a9801593F98d1c5")
        );
    }

    #[test]
    fn withdraw_targets_pool() {
        let call = withdraw_call(usdc(10), U256::MAX, user()).unwrap();
        assert_eq!(call.to, pool_address(10).unwrap());
        assert_eq!(call.gas_limit, Some(WITHDRAW_GAS_LIMIT));
        let decoded = IAavePool::withdrawCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.amount, U256::MAX);
        assert_eq!(decoded.to, user());
    }

    #[test]
    fn unknown_chain_is_rejected() {
        assert!(matches!(
            pool_address(1),
            Err(ProtocolError::UnsupportedChain { chain_id: 1, .. })
        ));
    }

    #[test]
    fn max_supply_keeps_a_tenth_back_and_rounds_to_cents() {
        let raw = |units: u64| U256::from(units);
        assert_eq!(max_supply(raw(50_000_000), 6), raw(49_900_000));
        // 12.345678 - 0.1 = 12.245678 -> 12.25
        assert_eq!(max_supply(raw(12_345_678), 6), raw(12_250_000));
        // 12.344 - 0.1 = 12.244 -> 12.24
        assert_eq!(max_supply(raw(12_344_000), 6), raw(12_240_000));
        assert_eq!(max_supply(raw(100_000), 6), U256::ZERO);
        assert_eq!(max_supply(raw(40_000), 6), U256::ZERO);
        assert_eq!(max_supply(U256::ZERO, 6), U256::ZERO);
        assert!(max_supply(U256::MAX, 6) < U256::MAX);
    }

    #[test]
    fn ray_rates_convert_to_fractions() {
        let five_percent: u128 = 50_000_000_000_000_000_000_000_000;
        assert!((ray_to_fraction(five_percent) - 0.05).abs() < 1e-12);
        assert_eq!(ray_to_fraction(0), 0.0);
    }

    #[test]
    fn best_yields_pick_max_supply_and_min_borrow() {
        let infos = vec![
            yield_info(10, 0.04, 0.06),
            yield_info(137, 0.05, 0.07),
            yield_info(8453, 0.03, 0.05),
        ];
        let best = best_yields(&infos).unwrap();
        assert_eq!(best.best_supply_yield.chain_id, 137);
        assert_eq!(best.best_borrow_yield.chain_id, 8453);

        assert!(best_yields(&[]).is_none());
    }

    #[test]
    fn ties_keep_the_earliest_entry() {
        let infos = vec![yield_info(10, 0.04, 0.06), yield_info(137, 0.04, 0.06)];
        let best = best_yields(&infos).unwrap();
        assert_eq!(best.best_supply_yield.chain_id, 10);
        assert_eq!(best.best_borrow_yield.chain_id, 10);
    }

    #[test]
    fn sorting_is_by_supply_yield_descending() {
        let mut infos = vec![
            yield_info(10, 0.02, 0.0),
            yield_info(137, 0.05, 0.0),
            yield_info(42161, 0.03, 0.0),
        ];
        sort_by_supply_yield(&mut infos);
        let order: Vec<u64> = infos.iter().map(|i| i.chain_id).collect();
        assert_eq!(order, vec![137, 42161, 10]);
    }
}
