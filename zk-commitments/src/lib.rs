//! Commitment layer for the threshold score attestation service.
//!
//! This crate contains:
//! - The padded fixed-depth Merkle commitment over an institution's record set.
//! - Per-record inclusion proofs (sibling chain + direction bits) consumable
//!   by the external proving circuit.
//! - The circuit-input encoding contract: score scaling, identifier hashing,
//!   public-signal positions, opaque proof blobs.
//!
//! Everything here is pure and deterministic; the SNARK machinery itself
//! lives behind the backend's prover port.

pub mod constants;
pub mod merkle;
pub mod types;
