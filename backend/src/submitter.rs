//! Cross-chain submission of resolved attestations.
//!
//! One transaction per request against the caller-chosen target ledger. A
//! reverted transaction is terminal for the request; re-verification happens
//! as a fresh request, never as an automatic retry.

use crate::config::LedgerTarget;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("network mismatch: no configured ledger target named {0:?}")]
    NetworkMismatch(String),

    #[error("ledger rpc error: {0}")]
    Rpc(String),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("invalid call argument: {0}")]
    InvalidArgument(String),

    #[error("transaction reverted: {tx_hash}")]
    TransactionReverted { tx_hash: String },
}

/// Arguments for the target contract's verification entry point.
#[derive(Clone, Debug)]
pub struct VerificationCall {
    pub attestation_id: u64,
    /// Commitment tree root, decimal field element from the public signals.
    pub root: String,
    /// Attestation leaf digest, 0x-prefixed hex.
    pub leaf: String,
    /// The attestation network's own inclusion proof for the leaf.
    pub merkle_path: Vec<String>,
    pub leaf_count: u64,
    pub leaf_index: u64,
}

/// In-process confirmation of a sent transaction. The durable proof of
/// success is the event the contract emits on-chain.
#[derive(Clone, Debug)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub success: bool,
}

/// One connected provider/wallet pair, scoped to a single request.
pub trait LedgerClient: Send + Sync {
    fn submit_verification(
        &self,
        call: &VerificationCall,
    ) -> impl core::future::Future<Output = Result<TxReceipt, LedgerError>> + Send;
}

/// Builds a request-scoped client for a configured target.
pub trait LedgerConnector: Send + Sync {
    type Client: LedgerClient;

    fn connect(
        &self,
        target: &LedgerTarget,
    ) -> impl core::future::Future<Output = Result<Self::Client, LedgerError>> + Send;
}

/// Routes verification calls to one of the configured destination ledgers.
pub struct CrossChainSubmitter<C: LedgerConnector> {
    targets: BTreeMap<String, LedgerTarget>,
    connector: C,
}

impl<C: LedgerConnector> CrossChainSubmitter<C> {
    pub fn new(targets: impl IntoIterator<Item = LedgerTarget>, connector: C) -> Self {
        let targets = targets.into_iter().map(|t| (t.network.clone(), t)).collect();
        Self { targets, connector }
    }

    pub fn targets(&self) -> impl Iterator<Item = &LedgerTarget> {
        self.targets.values()
    }

    /// Send one verification transaction and wait for its receipt.
    pub async fn submit(
        &self,
        network: &str,
        call: &VerificationCall,
    ) -> Result<TxReceipt, LedgerError> {
        let target = self
            .targets
            .get(network)
            .ok_or_else(|| LedgerError::NetworkMismatch(network.to_string()))?;

        info!(network, chain_id = target.chain_id, "submitting verification transaction");

        let client = self.connector.connect(target).await?;
        let receipt = client.submit_verification(call).await?;

        if !receipt.success {
            return Err(LedgerError::TransactionReverted { tx_hash: receipt.tx_hash });
        }

        info!(
            network,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            "verification transaction confirmed"
        );
        Ok(receipt)
    }
}
