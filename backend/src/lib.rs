//! Core of the threshold score attestation service.
//!
//! An institution commits its record set into a Merkle tree
//! (`zk-commitments`), proves that one record clears a public threshold via
//! an external zero-knowledge prover, has that proof checked and recorded by
//! an independent attestation network, and finally anchors the attestation on
//! a caller-chosen target ledger.
//!
//! This crate is the service core behind that pipeline: record loading,
//! proof-request assembly, the attestation session state machine, cross-chain
//! submission, and result reporting. The HTTP route layer that fronts it, the
//! proving toolchain, and the attestation network itself are external
//! collaborators reached through the capability ports in [`prover`],
//! [`orchestrator`], and [`submitter`].

pub mod assembler;
pub mod config;
pub mod errors;
pub mod ethereum;
pub mod history;
pub mod orchestrator;
pub mod prover;
pub mod records;
pub mod service;
pub mod submitter;
