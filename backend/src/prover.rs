//! Port to the external proving service.

use thiserror::Error;
use zk_commitments::types::{CircuitInputs, ProofBlob, PublicSignals};

/// Errors surfaced by a proving backend. Both are terminal for the request;
/// the pipeline performs no retry.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("prover unavailable: {0}")]
    Unavailable(String),

    #[error("circuit input mismatch: {0}")]
    InputMismatch(String),
}

/// Capability interface over the external prover.
///
/// Implementations may shell out to a proving toolchain or call a remote
/// proving service; the core treats the returned proof and public signals as
/// opaque blobs either way.
pub trait ProverClient: Send + Sync {
    fn prove(
        &self,
        inputs: &CircuitInputs,
    ) -> impl core::future::Future<Output = Result<(ProofBlob, PublicSignals), ProverError>> + Send;
}
