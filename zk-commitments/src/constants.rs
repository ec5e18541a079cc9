//! Crate-wide constants shared by the commitment builder and the host-side
//! pipeline. The score-encoding constants are a pinned contract with the
//! deployed circuit; changing them invalidates every existing commitment.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Scale factor applied to the grade-point component (8.50 becomes 850).
pub const SCORE_SCALE: u64 = 100;

/// Weight applied to the auxiliary test score when folding it into the
/// composite committed score.
pub const AUX_SCORE_WEIGHT: u64 = 10;

/// Default commitment tree depth: 2^10 padded leaves.
pub const DEFAULT_TREE_DEPTH: usize = 10;

// Poseidon sponge configuration.
//
// We use a width-3 sponge (rate=2, capacity=1) to efficiently absorb pairs of
// field elements: (idHash, score) at the leaves, (left, right) at the nodes.
//
// NOTE: This is a prototype. For production, parameters should be reviewed by
// cryptographers and ideally fixed via audited constants / standard sets.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;

// Typical Poseidon parameters for width=3.
pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Poseidon S-box exponent (alpha). Common choices are 5 or 17.
pub const POSEIDON_ALPHA: u64 = 5;

/// Deterministically derive Poseidon parameters for BN254::Fr.
///
/// This uses arkworks' parameter derivation helper (Ark + MDS) so every
/// component recomputing the tree agrees on the same constants.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    // The helper expects the prime field size in bits.
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;

    // Derive the round constants (ARK) and MDS matrix.
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}
