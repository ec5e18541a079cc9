//! Padded fixed-depth Merkle commitment over an ordered record set.
//!
//! The leaf set is the record set padded to `2^depth` entries by repeating
//! the last real record; internal levels hash adjacent pairs, duplicating the
//! last node at an odd boundary. `build` and `prove_inclusion` are pure and
//! reproducible for fixed input: the target ledger contract must be able to
//! recompute and check inclusion independently.

use crate::constants::poseidon_config;
use crate::types::Record;
use ark_bn254::Fr;
use ark_crypto_primitives::crh::sha256::{digest::Digest, Sha256};
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("empty record set")]
    EmptyRecordSet,

    #[error("record set exceeds tree capacity: {records} records, capacity {capacity}")]
    CapacityExceeded { records: usize, capacity: usize },

    #[error("index out of range: {index} not in [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Which side the current node sits on at each level of the walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

/// Sibling chain proving one leaf belongs under the committed root.
///
/// `lemma` is `[leaf, sibling_1, .., sibling_depth, root]`; `path` holds one
/// direction bit per consulted sibling.
#[derive(Clone, Debug)]
pub struct InclusionProof {
    pub path: Vec<Direction>,
    pub lemma: Vec<Fr>,
}

impl InclusionProof {
    pub fn leaf(&self) -> Option<&Fr> {
        self.lemma.first()
    }

    pub fn root(&self) -> Option<&Fr> {
        self.lemma.last()
    }

    /// Refold the sibling chain and compare against the committed root.
    ///
    /// Pure; an independent observer can run the same check.
    pub fn verify(&self) -> bool {
        if self.lemma.len() != self.path.len() + 2 {
            return false;
        }

        let hasher = PairHasher::new();
        let mut acc = self.lemma[0];
        for (i, direction) in self.path.iter().enumerate() {
            let sibling = self.lemma[i + 1];
            acc = match direction {
                Direction::Left => hasher.hash_pair(&acc, &sibling),
                Direction::Right => hasher.hash_pair(&sibling, &acc),
            };
        }

        acc == self.lemma[self.lemma.len() - 1]
    }
}

/// Poseidon two-to-one hasher holding the derived parameters once per use.
struct PairHasher {
    cfg: PoseidonConfig<Fr>,
}

impl PairHasher {
    fn new() -> Self {
        Self { cfg: poseidon_config() }
    }

    fn hash_pair(&self, left: &Fr, right: &Fr) -> Fr {
        let mut sponge = PoseidonSponge::<Fr>::new(&self.cfg);
        sponge.absorb(&[*left, *right].as_slice());
        sponge.squeeze_field_elements(1)[0]
    }

    fn hash_leaf(&self, record: &Record) -> Fr {
        self.hash_pair(&id_hash(&record.id), &Fr::from(record.score))
    }
}

/// Reduce a record identifier into the proving field: SHA-256 of the
/// identifier bytes, interpreted big-endian, mod p. Must match the circuit's
/// identifier encoding.
pub fn id_hash(id: &str) -> Fr {
    let digest = Sha256::digest(id.as_bytes());
    Fr::from_be_bytes_mod_order(&digest)
}

/// Leaf hash: `Poseidon(idHash, score)`.
pub fn leaf_hash(record: &Record) -> Fr {
    PairHasher::new().hash_leaf(record)
}

/// Node hash: `Poseidon(left, right)`.
pub fn node_hash(left: &Fr, right: &Fr) -> Fr {
    PairHasher::new().hash_pair(left, right)
}

/// Full binary hash tree over the padded record set.
///
/// `nodes` is every level concatenated, leaves first; the root is the final
/// entry.
#[derive(Clone, Debug)]
pub struct CommitmentTree {
    depth: usize,
    record_count: usize,
    nodes: Vec<Fr>,
}

impl CommitmentTree {
    pub fn build(records: &[Record], depth: usize) -> Result<Self, MerkleError> {
        if records.is_empty() {
            return Err(MerkleError::EmptyRecordSet);
        }
        let capacity = 1usize << depth;
        if records.len() > capacity {
            return Err(MerkleError::CapacityExceeded { records: records.len(), capacity });
        }

        let hasher = PairHasher::new();

        // Pad to the fixed width by repeating the last real record.
        let mut level: Vec<Fr> = records.iter().map(|r| hasher.hash_leaf(r)).collect();
        let pad = level[level.len() - 1];
        level.resize(capacity, pad);

        let mut nodes = level.clone();
        let mut current = level;
        while current.len() > 1 {
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for i in (0..current.len()).step_by(2) {
                let left = current[i];
                // Self-duplicate at an odd boundary.
                let right = if i + 1 < current.len() { current[i + 1] } else { left };
                next.push(hasher.hash_pair(&left, &right));
            }
            nodes.extend_from_slice(&next);
            current = next;
        }

        Ok(Self { depth, record_count: records.len(), nodes })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn leaf_count(&self) -> usize {
        1 << self.depth
    }

    pub fn root(&self) -> Fr {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.nodes[..self.leaf_count()]
    }

    /// Sibling chain for the record at `index`.
    ///
    /// Only real records are provable; padding leaves are not addressable.
    pub fn prove_inclusion(&self, index: usize) -> Result<InclusionProof, MerkleError> {
        if index >= self.record_count {
            return Err(MerkleError::IndexOutOfRange { index, len: self.record_count });
        }

        let mut path = Vec::with_capacity(self.depth);
        let mut lemma = Vec::with_capacity(self.depth + 2);
        let mut current = index;
        let mut width = self.leaf_count();
        let mut offset = 0;

        lemma.push(self.nodes[current]);
        while width > 1 {
            let is_left = current % 2 == 0;
            let sibling = if !is_left {
                current - 1
            } else if current + 1 < width {
                current + 1
            } else {
                // Odd boundary: the node was hashed with itself.
                current
            };

            path.push(if is_left { Direction::Left } else { Direction::Right });
            lemma.push(self.nodes[offset + sibling]);

            current /= 2;
            offset += width;
            width = width.div_ceil(2);
        }
        lemma.push(self.root());

        Ok(InclusionProof { path, lemma })
    }
}
