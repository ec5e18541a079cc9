//! alloy adapter for the target-ledger ports.
//!
//! Each request gets its own provider/wallet pair, bound to the chosen
//! target's RPC endpoint and signing key, and released when the request
//! finishes. Calldata is ABI-encoded once; targets whose deployed contract
//! exposes the verification function under a different name get their
//! configured 4-byte selector patched in.

use crate::config::LedgerTarget;
use crate::submitter::{LedgerClient, LedgerConnector, LedgerError, TxReceipt, VerificationCall};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolCall;
use tracing::info;

sol! {
    function verifyScore(
        uint256 attestationId,
        uint256 root,
        bytes32 leaf,
        bytes32[] merklePath,
        uint256 leafCount,
        uint256 index
    );
}

/// Connects a request-scoped provider/wallet pair for a configured target.
#[derive(Clone, Copy, Debug, Default)]
pub struct EthereumConnector;

impl LedgerConnector for EthereumConnector {
    type Client = EthereumLedger;

    async fn connect(&self, target: &LedgerTarget) -> Result<EthereumLedger, LedgerError> {
        let signer: PrivateKeySigner = target
            .signing_key
            .parse()
            .map_err(|e| LedgerError::Signer(format!("invalid signing key: {e}")))?;
        let wallet = EthereumWallet::from(signer);

        let url = target
            .rpc_endpoint
            .parse()
            .map_err(|e| LedgerError::Rpc(format!("invalid rpc url: {e}")))?;
        let provider = DynProvider::new(ProviderBuilder::new().wallet(wallet).connect_http(url));

        Ok(EthereumLedger {
            provider,
            contract: target.contract_address,
            selector: target.function_selector,
            chain_id: target.chain_id,
        })
    }
}

/// One connected target ledger.
pub struct EthereumLedger {
    provider: DynProvider,
    contract: Address,
    selector: Option<[u8; 4]>,
    chain_id: u64,
}

impl EthereumLedger {
    fn encode_call(
        call: &VerificationCall,
        selector: Option<[u8; 4]>,
    ) -> Result<Bytes, LedgerError> {
        let root = U256::from_str_radix(&call.root, 10)
            .map_err(|e| LedgerError::InvalidArgument(format!("root {:?}: {e}", call.root)))?;
        let merkle_path = call
            .merkle_path
            .iter()
            .map(|entry| parse_b256(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut encoded = verifyScoreCall {
            attestationId: U256::from(call.attestation_id),
            root,
            leaf: parse_b256(&call.leaf)?,
            merklePath: merkle_path,
            leafCount: U256::from(call.leaf_count),
            index: U256::from(call.leaf_index),
        }
        .abi_encode();

        if let Some(selector) = selector {
            encoded[..4].copy_from_slice(&selector);
        }

        Ok(Bytes::from(encoded))
    }
}

impl LedgerClient for EthereumLedger {
    async fn submit_verification(&self, call: &VerificationCall) -> Result<TxReceipt, LedgerError> {
        let input = Self::encode_call(call, self.selector)?;

        let tx = TransactionRequest::default()
            .with_to(self.contract)
            .with_input(input);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::Rpc(format!("send failed: {e}")))?;

        info!(
            chain_id = self.chain_id,
            tx_hash = %pending.tx_hash(),
            "verification transaction sent"
        );

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Rpc(format!("receipt unavailable: {e}")))?;

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash.to_string(),
            block_number: receipt.block_number.unwrap_or(0),
            success: receipt.status(),
        })
    }
}

fn parse_b256(value: &str) -> Result<B256, LedgerError> {
    value
        .parse::<B256>()
        .map_err(|e| LedgerError::InvalidArgument(format!("digest {value:?}: {e}")))
}
