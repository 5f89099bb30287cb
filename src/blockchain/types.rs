// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain and token tables for the supported EVM networks.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// EVM network configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Public RPC endpoint used when no override is configured
    pub rpc_url: &'static str,
    /// Environment variable overriding `rpc_url`
    pub rpc_env: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

pub const OPTIMISM: NetworkConfig = NetworkConfig {
    name: "Optimism",
    chain_id: 10,
    rpc_url: "https://mainnet.optimism.io",
    rpc_env: "OPTIMISM_RPC_URL",
    explorer_url: "https://optimistic.etherscan.io",
};

pub const POLYGON: NetworkConfig = NetworkConfig {
    name: "Polygon",
    chain_id: 137,
    rpc_url: "https://polygon-rpc.com",
    rpc_env: "POLYGON_RPC_URL",
    explorer_url: "https://polygonscan.com",
};

pub const BASE: NetworkConfig = NetworkConfig {
    name: "Base",
    chain_id: 8453,
    rpc_url: "https://mainnet.base.org",
    rpc_env: "BASE_RPC_URL",
    explorer_url: "https://basescan.org",
};

pub const ARBITRUM: NetworkConfig = NetworkConfig {
    name: "Arbitrum",
    chain_id: 42161,
    rpc_url: "https://arb1.arbitrum.io/rpc",
    rpc_env: "ARBITRUM_RPC_URL",
    explorer_url: "https://arbiscan.io",
};

/// The fixed chain set, ordered by chain id.
///
/// Aggregated queries report the first error in this order.
pub const SUPPORTED_NETWORKS: [NetworkConfig; 4] = [OPTIMISM, POLYGON, BASE, ARBITRUM];

/// Look up a supported network by chain id.
pub fn network_by_chain_id(chain_id: u64) -> Option<&'static NetworkConfig> {
    SUPPORTED_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Display name for a chain id, `"Unknown Chain"` when unsupported.
pub fn chain_name(chain_id: u64) -> &'static str {
    network_by_chain_id(chain_id)
        .map(|n| n.name)
        .unwrap_or("Unknown Chain")
}

/// ERC-20 token metadata shared by every deployment of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Erc20Token {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
}

pub const USDC_TOKEN: Erc20Token = Erc20Token {
    symbol: "USDC",
    name: "USD Coin",
    decimals: 6,
};

pub const WETH_TOKEN: Erc20Token = Erc20Token {
    symbol: "WETH",
    name: "Wrapped Ether",
    decimals: 18,
};

pub const WBTC_TOKEN: Erc20Token = Erc20Token {
    symbol: "WBTC",
    name: "Wrapped BTC",
    decimals: 8,
};

pub const USDT_TOKEN: Erc20Token = Erc20Token {
    symbol: "USDT",
    name: "Tether USD",
    decimals: 6,
};

pub const DAI_TOKEN: Erc20Token = Erc20Token {
    symbol: "DAI",
    name: "Dai Stablecoin",
    decimals: 18,
};

pub const WLD_TOKEN: Erc20Token = Erc20Token {
    symbol: "WLD",
    name: "Worldcoin",
    decimals: 18,
};

pub const KNOWN_TOKENS: [Erc20Token; 6] = [
    USDC_TOKEN, WETH_TOKEN, WBTC_TOKEN, USDT_TOKEN, DAI_TOKEN, WLD_TOKEN,
];

/// Look up token metadata by symbol (case-insensitive).
pub fn token_by_symbol(symbol: &str) -> Option<&'static Erc20Token> {
    KNOWN_TOKENS
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// A token contract on a specific chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    pub chain_id: u64,
    pub token: Erc20Token,
    pub address: Address,
}

impl TokenDeployment {
    pub fn symbol(&self) -> &'static str {
        self.token.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals
    }
}

const fn deployment(chain_id: u64, token: Erc20Token, address: Address) -> TokenDeployment {
    TokenDeployment {
        chain_id,
        token,
        address,
    }
}

/// Token contracts per chain. Tokens without a deployment on a chain are absent.
pub const TOKEN_DEPLOYMENTS: [TokenDeployment; 20] = [
    // Arbitrum
    deployment(42161, USDC_TOKEN, address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831")),
    deployment(42161, WETH_TOKEN, address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1")),
    deployment(42161, WBTC_TOKEN, address!("0x2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f")),
    deployment(42161, USDT_TOKEN, address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9")),
    deployment(42161, DAI_TOKEN, address!("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1")),
    // Base
    deployment(8453, USDC_TOKEN, address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")),
    deployment(8453, WETH_TOKEN, address!("0x4200000000000000000000000000000000000006")),
    deployment(8453, WBTC_TOKEN, address!("0x1BFD67037B42Cf73acF2047067bd4F2C47D9BfD6")),
    deployment(8453, DAI_TOKEN, address!("0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb")),
    // Polygon
    deployment(137, USDC_TOKEN, address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359")),
    deployment(137, WETH_TOKEN, address!("0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619")),
    deployment(137, WBTC_TOKEN, address!("0x1BFD67037B42Cf73acF2047067bd4F2C47D9BfD6")),
    deployment(137, USDT_TOKEN, address!("0xc2132D05D31c914a87C6611C10748AEb04B58e8F")),
    deployment(137, DAI_TOKEN, address!("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063")),
    // Optimism
    deployment(10, USDC_TOKEN, address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85")),
    deployment(10, WETH_TOKEN, address!("0x4200000000000000000000000000000000000006")),
    deployment(10, WBTC_TOKEN, address!("0x68f180fcCe6836688e9084f035309E29Bf0A2095")),
    deployment(10, USDT_TOKEN, address!("0x94b008aA00579c1307B0EF2c499aD98a8ce58e58")),
    deployment(10, DAI_TOKEN, address!("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1")),
    deployment(10, WLD_TOKEN, address!("0xdC6fF44d5d932Cbd77B52E5612Ba0529DC6226F1")),
];

/// Find the deployment of `symbol` on `chain_id`.
pub fn token_deployment(chain_id: u64, symbol: &str) -> Option<TokenDeployment> {
    TOKEN_DEPLOYMENTS
        .iter()
        .find(|d| d.chain_id == chain_id && d.token.symbol.eq_ignore_ascii_case(symbol))
        .copied()
}

/// All token deployments on `chain_id`, in table order.
pub fn tokens_on_chain(chain_id: u64) -> Vec<TokenDeployment> {
    TOKEN_DEPLOYMENTS
        .iter()
        .filter(|d| d.chain_id == chain_id)
        .copied()
        .collect()
}

/// Token balance information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Token symbol (e.g., "USDC", "WETH")
    pub symbol: String,
    /// Token name
    pub name: String,
    /// Balance in smallest unit
    pub balance_raw: String,
    /// Balance formatted with decimals (at most 6 fractional digits)
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Contract address (None for native token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}
