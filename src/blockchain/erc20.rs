// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions and calldata builders.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::calls::Call;
use super::client::ChainClientError;
use super::types::{TokenBalance, TokenDeployment};
use super::units::format_balance;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// ERC-20 contract wrapper bound to a known deployment.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
    deployment: TokenDeployment,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    pub fn new(provider: &P, deployment: TokenDeployment) -> Self {
        let contract = IERC20::new(deployment.address, provider.clone());
        Self {
            contract,
            deployment,
        }
    }

    /// Raw balance of `owner` in base units.
    pub async fn raw_balance_of(&self, owner: Address) -> Result<U256, ChainClientError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))
    }

    /// Balance of `owner`, formatted with the deployment's registered decimals.
    pub async fn balance_of(&self, owner: Address) -> Result<TokenBalance, ChainClientError> {
        let balance = self.raw_balance_of(owner).await?;
        let token = self.deployment.token;

        Ok(TokenBalance {
            symbol: token.symbol.to_string(),
            name: token.name.to_string(),
            balance_raw: balance.to_string(),
            balance_formatted: format_balance(balance, token.decimals),
            decimals: token.decimals,
            contract_address: Some(self.deployment.address.to_checksum(None)),
        })
    }
}

/// Encode `transfer(to, amount)` on `token`.
pub fn transfer_call(token: Address, to: Address, amount: U256) -> Call {
    let data = IERC20::transferCall { to, amount }.abi_encode();
    Call::new(token, data)
}

/// Encode `approve(spender, amount)` on `token`.
pub fn approve_call(token: Address, spender: Address, amount: U256) -> Call {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    Call::new(token, data)
}
