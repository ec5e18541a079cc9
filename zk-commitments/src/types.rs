//! Types shared between the commitment builder and the host-side pipeline.

use crate::constants::AUX_SCORE_WEIGHT;
use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One committed record: an opaque identifier and the composite scaled score.
///
/// Immutable once read from the institution's store; the tree is rebuilt, not
/// updated, when the record set changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub score: u64,
}

/// Collapse the two graded components into the single value the circuit
/// commits to: `cgpa_centi + AUX_SCORE_WEIGHT * test_score`.
///
/// Pinned contract with the deployed circuit; must match bit-for-bit.
pub fn composite_score(cgpa_centi: u64, test_score: u64) -> u64 {
    cgpa_centi + AUX_SCORE_WEIGHT * test_score
}

/// Render a field element the way the external prover expects its inputs:
/// the canonical integer in decimal.
pub fn fr_to_decimal(x: &Fr) -> String {
    x.into_bigint().to_string()
}

/// JSON-friendly representation of a field element.
///
/// We expose Fr values as hex strings to avoid ambiguities.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrHex {
    pub hex: String,
}

impl FrHex {
    pub fn from_fr(x: &Fr) -> Self {
        // Use arkworks' canonical compressed encoding so all components agree.
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .expect("in-memory serialization");
        Self { hex: hex::encode(bytes) }
    }

    pub fn to_fr(&self) -> Result<Fr, String> {
        let bytes = hex::decode(&self.hex).map_err(|e| format!("invalid hex: {e}"))?;
        Fr::deserialize_compressed(&bytes[..]).map_err(|e| format!("invalid field bytes: {e}"))
    }
}

/// Inputs handed to the external prover for one verification request.
///
/// serde names follow the circuit's signal names; field elements are decimal
/// strings. Built once per request, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircuitInputs {
    pub public: PublicInputs,
    pub private: PrivateInputs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInputs {
    pub merkle_root: String,
    pub threshold: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateInputs {
    pub record_index: u64,
    /// The inclusion proof's lemma, length `depth + 2`.
    pub auth_path: Vec<String>,
    pub id_hash: String,
    pub score: u64,
}

/// Opaque proof returned by the external prover; transported base64-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBlob(pub Vec<u8>);

impl ProofBlob {
    pub fn to_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    pub fn from_b64(b64: &str) -> Result<Self, String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| format!("invalid base64: {e}"))?;
        Ok(Self(bytes))
    }
}

/// Opaque verifying key for the circuit, as produced by its setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKeyBlob(pub Vec<u8>);

impl VerifyingKeyBlob {
    pub fn to_b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    pub fn from_b64(b64: &str) -> Result<Self, String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| format!("invalid base64: {e}"))?;
        Ok(Self(bytes))
    }
}

/// Positional public signals emitted by the circuit, as decimal strings.
///
/// Pinned layout: `[0]` threshold-met flag (`"1"` = met), `[1]` tree root,
/// `[2]` verification hash. Any circuit change that reorders signals must be
/// matched here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals(Vec<String>);

impl PublicSignals {
    pub fn new(signals: Vec<String>) -> Self {
        Self(signals)
    }

    pub fn threshold_met(&self) -> bool {
        self.0.first().map(|s| s == "1").unwrap_or(false)
    }

    pub fn root(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn verification_hash(&self) -> Option<&str> {
        self.0.get(2).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_score_weighs_test_component() {
        // 8.50 CGPA and a test score of 90 -> 850 + 900.
        assert_eq!(composite_score(850, 90), 1750);
        assert_eq!(composite_score(610, 0), 610);
    }

    #[test]
    fn public_signal_positions() {
        let signals = PublicSignals::new(vec![
            "1".to_string(),
            "12345".to_string(),
            "67890".to_string(),
        ]);
        assert!(signals.threshold_met());
        assert_eq!(signals.root(), Some("12345"));
        assert_eq!(signals.verification_hash(), Some("67890"));

        let failed = PublicSignals::new(vec!["0".to_string()]);
        assert!(!failed.threshold_met());
        assert_eq!(failed.root(), None);

        assert!(!PublicSignals::new(Vec::new()).threshold_met());
    }

    #[test]
    fn proof_blob_base64_round_trip() {
        let blob = ProofBlob(vec![0, 1, 2, 250]);
        let decoded = ProofBlob::from_b64(&blob.to_b64()).unwrap();
        assert_eq!(decoded, blob);
        assert!(ProofBlob::from_b64("not-base64!").is_err());
    }

    #[test]
    fn circuit_inputs_use_circuit_signal_names() {
        let inputs = CircuitInputs {
            public: PublicInputs {
                merkle_root: "7".to_string(),
                threshold: 700,
            },
            private: PrivateInputs {
                record_index: 0,
                auth_path: vec!["1".to_string(), "2".to_string()],
                id_hash: "3".to_string(),
                score: 850,
            },
        };

        let json = serde_json::to_value(&inputs).unwrap();
        assert!(json["public"]["merkleRoot"].is_string());
        assert_eq!(json["public"]["threshold"], 700);
        assert_eq!(json["private"]["recordIndex"], 0);
        assert_eq!(json["private"]["authPath"].as_array().unwrap().len(), 2);
        assert!(json["private"]["idHash"].is_string());
    }

    #[test]
    fn fr_hex_round_trip() {
        let x = Fr::from(850u64);
        let hex = FrHex::from_fr(&x);
        assert_eq!(hex.to_fr().unwrap(), x);
    }

    #[test]
    fn fr_to_decimal_is_canonical() {
        assert_eq!(fr_to_decimal(&Fr::from(850u64)), "850");
    }
}
