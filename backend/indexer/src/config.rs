//! Application configuration loaded from environment variables.
//!
//! | Variable             | Default                                 |
//! |----------------------|-----------------------------------------|
//! | `RPC_URL`            | `https://soroban-testnet.stellar.org`   |
//! | `CONTRACT_ID`        | required                                |
//! | `DATABASE_URL`       | `sqlite:./crowdfund_events.db`          |
//! | `API_PORT`           | `3001`                                  |
//! | `POLL_INTERVAL_SECS` | `5`                                     |
//! | `EVENTS_PER_PAGE`    | `100`                                   |
//! | `START_LEDGER`       | `0`                                     |

use std::str::FromStr;

use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Soroban RPC endpoint.
    pub rpc_url: String,
    /// The crowdfund contract address (Strkey format).
    pub contract_id: String,
    /// SQLite database URL or file path.
    pub database_url: String,
    /// Port for the REST API server.
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events.
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request.
    pub events_per_page: u32,
    /// Ledger to start from if no cursor is saved.
    pub start_ledger: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let contract_id = lookup("CONTRACT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                IndexerError::Config("CONTRACT_ID environment variable is required".to_string())
            })?;

        let config = Config {
            rpc_url: lookup("RPC_URL")
                .unwrap_or_else(|| "https://soroban-testnet.stellar.org".to_string()),
            contract_id,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./crowdfund_events.db".to_string()),
            api_port: parse(&lookup, "API_PORT", 3001)?,
            poll_interval_secs: parse(&lookup, "POLL_INTERVAL_SECS", 5)?,
            events_per_page: parse(&lookup, "EVENTS_PER_PAGE", 100)?,
            start_ledger: parse(&lookup, "START_LEDGER", 0)?,
        };

        if config.poll_interval_secs == 0 {
            return Err(IndexerError::Config(
                "POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if config.events_per_page == 0 {
            return Err(IndexerError::Config(
                "EVENTS_PER_PAGE must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("Invalid {key}: {raw:?}"))),
    }
}
