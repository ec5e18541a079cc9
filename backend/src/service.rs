//! The inbound verification pipeline.
//!
//! One logical flow per request: commit the record set, assemble circuit
//! inputs, invoke the external prover, drive the attestation session, anchor
//! the result on the chosen target ledger, and append the history row. Many
//! requests may run concurrently; they share no mutable state.

use crate::assembler;
use crate::errors::{VerifyError, VerifyOutcome};
use crate::history::HistoryStore;
use crate::orchestrator::{AttestationClient, AttestationOrchestrator};
use crate::prover::{ProverClient, ProverError};
use crate::records::RecordStore;
use crate::submitter::{CrossChainSubmitter, LedgerConnector, VerificationCall};
use tracing::{info, warn};
use zk_commitments::merkle::CommitmentTree;

pub struct VerificationService<P, A, L>
where
    P: ProverClient,
    A: AttestationClient,
    L: LedgerConnector,
{
    store: RecordStore,
    tree_depth: usize,
    prover: P,
    orchestrator: AttestationOrchestrator<A>,
    submitter: CrossChainSubmitter<L>,
    history: HistoryStore,
}

impl<P, A, L> VerificationService<P, A, L>
where
    P: ProverClient,
    A: AttestationClient,
    L: LedgerConnector,
{
    pub fn new(
        store: RecordStore,
        tree_depth: usize,
        prover: P,
        orchestrator: AttestationOrchestrator<A>,
        submitter: CrossChainSubmitter<L>,
        history: HistoryStore,
    ) -> Self {
        Self { store, tree_depth, prover, orchestrator, submitter, history }
    }

    /// Inbound boundary: awaits the full pipeline and reports the outcome.
    /// Never propagates an error to the caller.
    pub async fn verify(&self, record_id: &str, threshold: f64, network: &str) -> VerifyOutcome {
        match self.verify_inner(record_id, threshold, network).await {
            Ok(hash) => {
                info!(record_id, network, "verification complete");
                VerifyOutcome::succeeded(hash)
            }
            Err(e) => {
                warn!(record_id, network, kind = e.kind(), error = %e, "verification failed");
                VerifyOutcome::failed(&e)
            }
        }
    }

    async fn verify_inner(
        &self,
        record_id: &str,
        threshold: f64,
        network: &str,
    ) -> Result<String, VerifyError> {
        let tree = CommitmentTree::build(self.store.records(), self.tree_depth)?;
        let inputs = assembler::assemble(&self.store, record_id, threshold, &tree)?;

        let (proof, signals) = self.prover.prove(&inputs).await?;

        // Pull the pinned positions out before spending anything on the
        // network; malformed signals are a circuit contract violation.
        let root = signals
            .root()
            .ok_or_else(|| ProverError::InputMismatch("public signals missing root".to_string()))?
            .to_string();
        let verification_hash = signals
            .verification_hash()
            .ok_or_else(|| {
                ProverError::InputMismatch("public signals missing verification hash".to_string())
            })?
            .to_string();

        let receipt = self.orchestrator.attest(&proof, &signals).await?;

        let call = VerificationCall {
            attestation_id: receipt.attestation_id,
            root,
            leaf: receipt.leaf_digest,
            merkle_path: receipt.proof_of_existence.merkle_path,
            leaf_count: receipt.proof_of_existence.leaf_count,
            leaf_index: receipt.proof_of_existence.leaf_index,
        };
        self.submitter.submit(network, &call).await?;

        self.history.append(record_id, &verification_hash).await?;
        Ok(verification_hash)
    }
}
