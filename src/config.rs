// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory of the custody database | `/data` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `CHAIN_ID` | Expected chain ID | `43113` |
//! | `CONTROLLER_ADDRESS` | Custody controller contract | Required |
//! | `PCSP_ADDRESS` | PCSP reward token | Read from controller |
//! | `PRIVATE_KEY` | Custodial key as hex | One of the two |
//! | `PRIVATE_KEY_FILE` | Custodial key as PEM file | One of the two |
//! | `FINALITY_TIMEOUT_SECS` | Per-phase finality deadline | `120` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Receipt polling interval | `1000` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate and key for HTTPS | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{NetworkConfig, FUJI_CHAIN_ID};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const CONTROLLER_ADDRESS_ENV: &str = "CONTROLLER_ADDRESS";
pub const PCSP_ADDRESS_ENV: &str = "PCSP_ADDRESS";

/// Hex-encoded custodial private key. Takes precedence over the file.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";
/// Path to a SEC1 or PKCS#8 PEM custodial private key.
pub const PRIVATE_KEY_FILE_ENV: &str = "PRIVATE_KEY_FILE";
pub const FINALITY_TIMEOUT_ENV: &str = "FINALITY_TIMEOUT_SECS";
pub const POLL_INTERVAL_ENV: &str = "RECEIPT_POLL_INTERVAL_MS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("one of PRIVATE_KEY or PRIVATE_KEY_FILE must be set")]
    MissingKey,

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Where the custodial key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    Hex(String),
    PemFile(PathBuf),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Hex(_) => f.write_str("Hex(<redacted>)"),
            KeySource::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub network: NetworkConfig,
    pub controller: Address,
    pub reward_token: Option<Address>,
    pub key_source: KeySource,
    pub finality_timeout: Duration,
    pub poll_interval: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(get(PORT_ENV), PORT_ENV, 8080)?;
        let bind_addr = SocketAddr::from_str(&format!("{host}:{port}")).map_err(|e| {
            ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            }
        })?;

        let rpc_url = get(RPC_URL_ENV).ok_or(ConfigError::Missing(RPC_URL_ENV))?;
        let chain_id = parse_or(get(CHAIN_ID_ENV), CHAIN_ID_ENV, FUJI_CHAIN_ID)?;

        let controller = parse_address(
            &get(CONTROLLER_ADDRESS_ENV).ok_or(ConfigError::Missing(CONTROLLER_ADDRESS_ENV))?,
            CONTROLLER_ADDRESS_ENV,
        )?;
        let reward_token = get(PCSP_ADDRESS_ENV)
            .map(|v| parse_address(&v, PCSP_ADDRESS_ENV))
            .transpose()?;

        let key_source = match (get(PRIVATE_KEY_ENV), get(PRIVATE_KEY_FILE_ENV)) {
            (Some(hex), _) => KeySource::Hex(hex),
            (None, Some(path)) => KeySource::PemFile(PathBuf::from(path)),
            (None, None) => return Err(ConfigError::MissingKey),
        };

        let finality_secs: u64 = parse_or(get(FINALITY_TIMEOUT_ENV), FINALITY_TIMEOUT_ENV, 120)?;
        let poll_ms: u64 = parse_or(get(POLL_INTERVAL_ENV), POLL_INTERVAL_ENV, 1000)?;
        if finality_secs == 0 {
            return Err(ConfigError::Invalid {
                name: FINALITY_TIMEOUT_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            network: NetworkConfig { rpc_url, chain_id },
            controller,
            reward_token,
            key_source,
            finality_timeout: Duration::from_secs(finality_secs),
            poll_interval: Duration::from_millis(poll_ms),
            tls,
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_address(value: &str, name: &'static str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
