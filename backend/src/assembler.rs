//! Maps a record and a public threshold into the input set the proving
//! circuit expects.

use crate::errors::VerifyError;
use crate::records::RecordStore;
use zk_commitments::merkle::{id_hash, CommitmentTree};
use zk_commitments::types::{fr_to_decimal, CircuitInputs, PrivateInputs, PublicInputs};

/// Build the circuit inputs for one verification request.
///
/// Fails with `RecordNotFound` if `record_id` is not in the store; tree
/// errors propagate unmodified. No retry at this stage.
pub fn assemble(
    store: &RecordStore,
    record_id: &str,
    threshold: f64,
    tree: &CommitmentTree,
) -> Result<CircuitInputs, VerifyError> {
    let (index, record) = store
        .lookup(record_id)
        .ok_or_else(|| VerifyError::RecordNotFound(record_id.to_string()))?;

    let proof = tree.prove_inclusion(index)?;
    let auth_path = proof.lemma.iter().map(fr_to_decimal).collect();

    Ok(CircuitInputs {
        public: PublicInputs {
            merkle_root: fr_to_decimal(&tree.root()),
            threshold: threshold.floor() as u64,
        },
        private: PrivateInputs {
            record_index: index as u64,
            auth_path,
            id_hash: fr_to_decimal(&id_hash(&record.id)),
            score: record.score,
        },
    })
}
