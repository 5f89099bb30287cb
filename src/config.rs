// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `OPTIMISM_RPC_URL` | Optimism JSON-RPC endpoint | public endpoint |
//! | `POLYGON_RPC_URL` | Polygon JSON-RPC endpoint | public endpoint |
//! | `BASE_RPC_URL` | Base JSON-RPC endpoint | public endpoint |
//! | `ARBITRUM_RPC_URL` | Arbitrum JSON-RPC endpoint | public endpoint |
//! | `CAB_API_URL` | Chain-abstraction service base URL | Required |
//! | `CAB_API_KEY` | Bearer token for the chain-abstraction service | Optional |
//! | `FEE_BUFFER` | Fee safety multiplier, `1.00`-`1.10` | `1.03` |
//! | `FEE_DEBOUNCE_MS` | Quiet window before fee estimates | `300` |
//! | `QUOTE_DEBOUNCE_MS` | Quiet window before swap quotes | `500` |
//! | `BALANCE_CACHE_TTL_SECS` | Aggregated balance cache lifetime | `30` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | Optional |
//! | `TLS_KEY_PATH` | PEM private key | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::SUPPORTED_NETWORKS;
use crate::fees::{FeeBuffer, DEFAULT_DEBOUNCE_MS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Base URL of the chain-abstraction service (`/balance`, `/estimate-fees`,
/// `/send-calls`).
pub const CAB_API_URL_ENV: &str = "CAB_API_URL";
pub const CAB_API_KEY_ENV: &str = "CAB_API_KEY";

/// Fee safety multiplier.
///
/// # Default
/// `1.03`. Values outside `1.00`-`1.10` are rejected at startup.
pub const FEE_BUFFER_ENV: &str = "FEE_BUFFER";
pub const FEE_DEBOUNCE_MS_ENV: &str = "FEE_DEBOUNCE_MS";
pub const QUOTE_DEBOUNCE_MS_ENV: &str = "QUOTE_DEBOUNCE_MS";
pub const BALANCE_CACHE_TTL_SECS_ENV: &str = "BALANCE_CACHE_TTL_SECS";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_QUOTE_DEBOUNCE_MS: u64 = 500;
const DEFAULT_BALANCE_CACHE_TTL_SECS: u64 = 30;
const DEFAULT_BALANCE_CACHE_CAPACITY: usize = 1_024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Service configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// RPC endpoint per chain id.
    pub rpc_urls: HashMap<u64, String>,
    pub cab_api_url: String,
    pub cab_api_key: Option<String>,
    pub fee_buffer: FeeBuffer,
    pub fee_debounce: Duration,
    pub quote_debounce: Duration,
    pub balance_cache_ttl: Duration,
    pub balance_cache_capacity: usize,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|e| ConfigError::Invalid {
            name: HOST_ENV,
            reason: format!("{host}:{port}: {e}"),
        })?;

        let mut rpc_urls = HashMap::new();
        for network in SUPPORTED_NETWORKS {
            let url = var(network.rpc_env).unwrap_or_else(|| network.rpc_url.to_string());
            url::Url::parse(&url).map_err(|e| ConfigError::Invalid {
                name: network.rpc_env,
                reason: e.to_string(),
            })?;
            rpc_urls.insert(network.chain_id, url);
        }

        let cab_api_url = var(CAB_API_URL_ENV).ok_or(ConfigError::Missing(CAB_API_URL_ENV))?;
        url::Url::parse(&cab_api_url).map_err(|e| ConfigError::Invalid {
            name: CAB_API_URL_ENV,
            reason: e.to_string(),
        })?;

        let fee_buffer = match var(FEE_BUFFER_ENV) {
            Some(raw) => raw.parse().map_err(|e: crate::fees::FeeBufferError| ConfigError::Invalid {
                name: FEE_BUFFER_ENV,
                reason: e.to_string(),
            })?,
            None => FeeBuffer::DEFAULT,
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected json or pretty, got {other}"),
                })
            }
        };

        Ok(Self {
            bind_addr,
            rpc_urls,
            cab_api_url,
            cab_api_key: var(CAB_API_KEY_ENV),
            fee_buffer,
            fee_debounce: Duration::from_millis(parse_or(
                var(FEE_DEBOUNCE_MS_ENV),
                FEE_DEBOUNCE_MS_ENV,
                DEFAULT_DEBOUNCE_MS,
            )?),
            quote_debounce: Duration::from_millis(parse_or(
                var(QUOTE_DEBOUNCE_MS_ENV),
                QUOTE_DEBOUNCE_MS_ENV,
                DEFAULT_QUOTE_DEBOUNCE_MS,
            )?),
            balance_cache_ttl: Duration::from_secs(parse_or(
                var(BALANCE_CACHE_TTL_SECS_ENV),
                BALANCE_CACHE_TTL_SECS_ENV,
                DEFAULT_BALANCE_CACHE_TTL_SECS,
            )?),
            balance_cache_capacity: DEFAULT_BALANCE_CACHE_CAPACITY,
            tls,
            log_format,
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("{raw}: {e}"),
        }),
        None => Ok(default),
    }
}
