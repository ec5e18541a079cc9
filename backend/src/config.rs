//! Runtime configuration.
//!
//! Every endpoint, contract address, and signing secret is an explicit
//! configuration input passed into the components at construction; nothing is
//! hardcoded and nothing lives in process-wide mutable state.

use alloy::primitives::Address;
use std::time::Duration;
use thiserror::Error;
use zk_commitments::constants::DEFAULT_TREE_DEPTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(String),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: String, message: String },
}

fn require(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))
}

fn parse<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        message: e.to_string(),
    })
}

/// Connection settings for the attestation network.
#[derive(Clone, Debug)]
pub struct AttestationConfig {
    /// WebSocket RPC endpoint of the attestation network.
    pub endpoint: String,
    /// Seed phrase of the account funding attestation submissions.
    pub seed_phrase: String,
    /// Single timer covering the whole session, started at submission.
    pub timeout: Duration,
}

impl AttestationConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = require("ZKV_RPC_URL")?;
        let seed_phrase = require("ZKV_SEED_PHRASE")?;
        let timeout = match std::env::var("ATTESTATION_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse("ATTESTATION_TIMEOUT_SECS", &raw)?),
            Err(_) => Self::DEFAULT_TIMEOUT,
        };

        Ok(Self { endpoint, seed_phrase, timeout })
    }
}

/// One configured destination ledger, selected per request by its `network`
/// identifier.
#[derive(Clone, Debug)]
pub struct LedgerTarget {
    pub network: String,
    pub chain_id: u64,
    pub rpc_endpoint: String,
    pub contract_address: Address,
    /// Overrides the entry-point selector for targets whose contract exposes
    /// the verification function under a different name.
    pub function_selector: Option<[u8; 4]>,
    /// Signing key for the wallet bound to this target.
    pub signing_key: String,
}

impl LedgerTarget {
    /// Read one target from `LEDGER_<NAME>_{RPC_URL,CHAIN_ID,CONTRACT_ADDRESS,SIGNING_KEY}`
    /// plus the optional `LEDGER_<NAME>_FUNCTION_SELECTOR`.
    pub fn from_env(name: &str) -> Result<Self, ConfigError> {
        let prefix = format!("LEDGER_{}_", name.to_uppercase().replace('-', "_"));

        let rpc_var = format!("{prefix}RPC_URL");
        let chain_var = format!("{prefix}CHAIN_ID");
        let addr_var = format!("{prefix}CONTRACT_ADDRESS");
        let key_var = format!("{prefix}SIGNING_KEY");
        let sel_var = format!("{prefix}FUNCTION_SELECTOR");

        let rpc_endpoint = require(&rpc_var)?;
        let chain_id = parse(&chain_var, &require(&chain_var)?)?;
        let contract_address = parse(&addr_var, &require(&addr_var)?)?;
        let signing_key = require(&key_var)?;
        let function_selector = match std::env::var(&sel_var) {
            Ok(raw) => Some(parse_selector(&sel_var, &raw)?),
            Err(_) => None,
        };

        Ok(Self {
            network: name.to_lowercase(),
            chain_id,
            rpc_endpoint,
            contract_address,
            function_selector,
            signing_key,
        })
    }
}

/// Parse a 4-byte function selector from `0x`-prefixed hex.
pub fn parse_selector(var: &str, raw: &str) -> Result<[u8; 4], ConfigError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped).map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        message: e.to_string(),
    })?;
    let selector: [u8; 4] = bytes.try_into().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        message: "selector must be exactly 4 bytes".to_string(),
    })?;
    Ok(selector)
}

/// Full service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub attestation: AttestationConfig,
    pub ledgers: Vec<LedgerTarget>,
    /// Public threshold the institution attests against, pre-scaled.
    pub threshold: u64,
    pub tree_depth: usize,
}

impl Config {
    pub const DEFAULT_THRESHOLD: u64 = 700;

    /// Read the whole configuration; `LEDGER_NETWORKS` is a comma-separated
    /// list of target names, each with its own `LEDGER_<NAME>_*` block.
    pub fn from_env() -> Result<Self, ConfigError> {
        let attestation = AttestationConfig::from_env()?;

        let networks = require("LEDGER_NETWORKS")?;
        let mut ledgers = Vec::new();
        for name in networks.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            ledgers.push(LedgerTarget::from_env(name)?);
        }

        let threshold = match std::env::var("SCORE_THRESHOLD") {
            Ok(raw) => parse("SCORE_THRESHOLD", &raw)?,
            Err(_) => Self::DEFAULT_THRESHOLD,
        };
        let tree_depth = match std::env::var("TREE_DEPTH") {
            Ok(raw) => parse("TREE_DEPTH", &raw)?,
            Err(_) => DEFAULT_TREE_DEPTH,
        };

        Ok(Self { attestation, ledgers, threshold, tree_depth })
    }
}
