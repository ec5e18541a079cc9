//! Terminal failure taxonomy for one verification request.
//!
//! Every stage fails closed: no partial success is ever reported as success,
//! and nothing here retries. The route layer receives a `VerifyOutcome`, not
//! an error; `kind()` supplies the stable tag callers can branch on.

use crate::history::HistoryError;
use crate::orchestrator::AttestationError;
use crate::prover::ProverError;
use crate::records::RecordStoreError;
use crate::submitter::LedgerError;
use serde::Serialize;
use thiserror::Error;
use zk_commitments::merkle::MerkleError;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error(transparent)]
    Records(#[from] RecordStoreError),

    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error(transparent)]
    Prover(#[from] ProverError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl VerifyError {
    /// Stable kind tag surfaced to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::RecordNotFound(_) => "RecordNotFound",
            VerifyError::Records(RecordStoreError::DuplicateRecordId(_)) => "DuplicateRecordId",
            VerifyError::Records(_) => "InvalidRecordFile",
            VerifyError::Merkle(MerkleError::EmptyRecordSet) => "EmptyRecordSet",
            VerifyError::Merkle(MerkleError::CapacityExceeded { .. }) => "CapacityExceeded",
            VerifyError::Merkle(MerkleError::IndexOutOfRange { .. }) => "IndexOutOfRange",
            VerifyError::Prover(ProverError::Unavailable(_)) => "ProverUnavailable",
            VerifyError::Prover(ProverError::InputMismatch(_)) => "CircuitInputMismatch",
            VerifyError::Attestation(AttestationError::ThresholdNotMet) => "ThresholdNotMet",
            VerifyError::Attestation(AttestationError::Transport(_)) => "TransportError",
            VerifyError::Attestation(AttestationError::RetrievalFailed(_)) => {
                "AttestationRetrievalFailed"
            }
            VerifyError::Attestation(AttestationError::Timeout) => "AttestationTimeout",
            VerifyError::Ledger(LedgerError::NetworkMismatch(_)) => "NetworkMismatch",
            VerifyError::Ledger(LedgerError::TransactionReverted { .. }) => "TransactionReverted",
            VerifyError::Ledger(_) => "LedgerError",
            VerifyError::History(_) => "StorageError",
        }
    }
}

/// Boundary result for the inbound verify call; serialized as-is by the
/// route layer.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyOutcome {
    pub fn succeeded(verification_hash: String) -> Self {
        Self { success: true, verification_hash: Some(verification_hash), error: None }
    }

    pub fn failed(error: &VerifyError) -> Self {
        Self {
            success: false,
            verification_hash: None,
            error: Some(format!("{}: {}", error.kind(), error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_the_taxonomy() {
        let err: VerifyError = AttestationError::Timeout.into();
        assert_eq!(err.kind(), "AttestationTimeout");

        let err: VerifyError = MerkleError::EmptyRecordSet.into();
        assert_eq!(err.kind(), "EmptyRecordSet");

        let err: VerifyError = LedgerError::TransactionReverted { tx_hash: "0x1".to_string() }.into();
        assert_eq!(err.kind(), "TransactionReverted");
    }

    #[test]
    fn failed_outcome_carries_kind_and_message() {
        let outcome = VerifyOutcome::failed(&VerifyError::RecordNotFound("s9".to_string()));
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("RecordNotFound: record not found: s9"));
        assert!(outcome.verification_hash.is_none());
    }
}
