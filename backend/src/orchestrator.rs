//! Attestation orchestration against the external verification network.
//!
//! One session per verification request walks `Submitted -> IncludedInBlock
//! -> Finalized -> AttestationConfirmed -> Resolved`, driven exclusively by
//! events the network client delivers; the orchestrator never polls. A single
//! timer started at submission races the event stream, and resolution is
//! recorded exactly once: the event source may keep emitting after the
//! session is resolved, so late signals must be no-ops.
//!
//! The proof-of-existence lookup must complete before the session is closed;
//! closing first would make the lookup unreachable.

use crate::config::AttestationConfig;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};
use uuid::Uuid;
use zk_commitments::types::{ProofBlob, PublicSignals, VerifyingKeyBlob};

#[derive(Debug, Error)]
pub enum AttestationError {
    /// The public signals already say the predicate failed; nothing was sent.
    #[error("threshold not met")]
    ThresholdNotMet,

    #[error("attestation transport error: {0}")]
    Transport(String),

    #[error("attestation retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("attestation timed out")]
    Timeout,
}

/// Proof system identifier understood by the attestation network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofSystem {
    Groth16,
}

/// Curve identifier for the submitted proof system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    Bn128,
    Bls12_381,
}

/// Everything the network needs to check one proof.
#[derive(Clone, Debug)]
pub struct SubmitRequest {
    pub proof_system: ProofSystem,
    pub curve: Curve,
    pub vk: VerifyingKeyBlob,
    pub proof: ProofBlob,
    pub public_signals: PublicSignals,
}

/// Events delivered by the network client for one submitted proof.
///
/// The network guarantees `IncludedInBlock` before `Finalized` before
/// `AttestationConfirmed`; `Error` may arrive at any point.
#[derive(Clone, Debug)]
pub enum AttestationEvent {
    IncludedInBlock { attestation_id: u64, leaf_digest: String },
    Finalized { block_hash: String },
    AttestationConfirmed,
    Error { message: String },
}

/// The network's own inclusion proof that an attestation is part of its
/// ledger, consumed by the target ledger contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofOfExistence {
    pub merkle_path: Vec<String>,
    pub leaf_count: u64,
    pub leaf_index: u64,
}

/// Result of a successfully resolved session.
#[derive(Clone, Debug)]
pub struct AttestationReceipt {
    pub attestation_id: u64,
    pub leaf_digest: String,
    pub proof_of_existence: ProofOfExistence,
}

/// Capability interface over the attestation network client.
pub trait AttestationClient: Send + Sync {
    type Session: AttestationSessionApi;

    fn start(
        &self,
        endpoint: &str,
        seed_phrase: &str,
    ) -> impl core::future::Future<Output = Result<Self::Session, AttestationError>> + Send;
}

/// One open connection to the attestation network, scoped to a request.
pub trait AttestationSessionApi: Send {
    /// Submit the proof; events for it arrive on the returned channel.
    fn submit(
        &mut self,
        request: SubmitRequest,
    ) -> impl core::future::Future<Output = Result<mpsc::Receiver<AttestationEvent>, AttestationError>> + Send;

    /// Fetch the proof-of-existence for a confirmed attestation.
    fn poe(
        &mut self,
        attestation_id: u64,
        leaf_digest: &str,
    ) -> impl core::future::Future<Output = Result<ProofOfExistence, AttestationError>> + Send;

    fn close(self) -> impl core::future::Future<Output = ()> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Submitted,
    IncludedInBlock,
    Finalized,
    AttestationConfirmed,
    Resolved,
}

/// What the state machine asks the driver to do after applying an event.
#[derive(Debug)]
pub(crate) enum Step {
    Recorded,
    RetrieveProof { attestation_id: u64, leaf_digest: String },
    Failed(String),
    Ignored,
}

/// Per-request session state machine.
///
/// Transitions are validated against the allowed predecessor state;
/// out-of-order events are rejected and logged rather than applied.
pub struct AttestationSession {
    id: Uuid,
    status: SessionStatus,
    attestation_id: Option<u64>,
    leaf_digest: Option<String>,
}

impl AttestationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Submitted,
            attestation_id: None,
            leaf_digest: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn apply(&mut self, event: AttestationEvent) -> Step {
        if self.status == SessionStatus::Resolved {
            trace!(session = %self.id, ?event, "event after resolution ignored");
            return Step::Ignored;
        }

        match event {
            AttestationEvent::Error { message } => {
                warn!(session = %self.id, %message, "error event from attestation network");
                Step::Failed(message)
            }
            AttestationEvent::IncludedInBlock { attestation_id, leaf_digest } => {
                if self.status != SessionStatus::Submitted {
                    warn!(session = %self.id, status = ?self.status, "out-of-order IncludedInBlock rejected");
                    return Step::Ignored;
                }
                self.status = SessionStatus::IncludedInBlock;
                self.attestation_id = Some(attestation_id);
                self.leaf_digest = Some(leaf_digest);
                info!(session = %self.id, attestation_id, "proof included in block");
                Step::Recorded
            }
            AttestationEvent::Finalized { block_hash } => {
                if self.status != SessionStatus::IncludedInBlock {
                    warn!(session = %self.id, status = ?self.status, "out-of-order Finalized rejected");
                    return Step::Ignored;
                }
                self.status = SessionStatus::Finalized;
                info!(session = %self.id, %block_hash, "attestation transaction finalized");
                Step::Recorded
            }
            AttestationEvent::AttestationConfirmed => {
                if self.status != SessionStatus::Finalized {
                    warn!(session = %self.id, status = ?self.status, "out-of-order AttestationConfirmed rejected");
                    return Step::Ignored;
                }
                let (Some(attestation_id), Some(leaf_digest)) =
                    (self.attestation_id, self.leaf_digest.clone())
                else {
                    return Step::Failed("attestation confirmed without inclusion data".to_string());
                };
                self.status = SessionStatus::AttestationConfirmed;
                info!(session = %self.id, attestation_id, "attestation confirmed");
                Step::RetrieveProof { attestation_id, leaf_digest }
            }
        }
    }

    /// First resolution wins; later calls report `false` and change nothing.
    pub(crate) fn resolve(&mut self) -> bool {
        if self.status == SessionStatus::Resolved {
            trace!(session = %self.id, "duplicate resolution ignored");
            return false;
        }
        self.status = SessionStatus::Resolved;
        true
    }
}

impl Default for AttestationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the multi-stage protocol for one proof at a time.
pub struct AttestationOrchestrator<C> {
    client: C,
    config: AttestationConfig,
    vk: VerifyingKeyBlob,
}

impl<C: AttestationClient> AttestationOrchestrator<C> {
    pub fn new(client: C, config: AttestationConfig, vk: VerifyingKeyBlob) -> Self {
        Self { client, config, vk }
    }

    /// Submit a proof and drive the session to resolution.
    ///
    /// Short-circuits on the threshold-met flag before any network call.
    pub async fn attest(
        &self,
        proof: &ProofBlob,
        signals: &PublicSignals,
    ) -> Result<AttestationReceipt, AttestationError> {
        if !signals.threshold_met() {
            info!("threshold flag not set, skipping attestation submission");
            return Err(AttestationError::ThresholdNotMet);
        }

        let mut network = self
            .client
            .start(&self.config.endpoint, &self.config.seed_phrase)
            .await?;

        let request = SubmitRequest {
            proof_system: ProofSystem::Groth16,
            curve: Curve::Bn128,
            vk: self.vk.clone(),
            proof: proof.clone(),
            public_signals: signals.clone(),
        };

        let mut session = AttestationSession::new();
        info!(session = %session.id(), "submitting proof to attestation network");

        let outcome = tokio::select! {
            _ = tokio::time::sleep(self.config.timeout) => Err(AttestationError::Timeout),
            res = async {
                let events = network.submit(request).await?;
                drive(&mut session, events, &mut network).await
            } => res,
        };

        session.resolve();
        network.close().await;

        match &outcome {
            Ok(receipt) => info!(
                session = %session.id(),
                attestation_id = receipt.attestation_id,
                "attestation session resolved"
            ),
            Err(e) => warn!(session = %session.id(), error = %e, "attestation session failed"),
        }

        outcome
    }
}

/// Consume events until the session can resolve.
///
/// The proof-of-existence is fetched here, before the caller closes the
/// session.
async fn drive<S: AttestationSessionApi>(
    session: &mut AttestationSession,
    mut events: mpsc::Receiver<AttestationEvent>,
    network: &mut S,
) -> Result<AttestationReceipt, AttestationError> {
    while let Some(event) = events.recv().await {
        match session.apply(event) {
            Step::Recorded | Step::Ignored => {}
            Step::Failed(message) => return Err(AttestationError::Transport(message)),
            Step::RetrieveProof { attestation_id, leaf_digest } => {
                let proof_of_existence = network
                    .poe(attestation_id, &leaf_digest)
                    .await
                    .map_err(|e| AttestationError::RetrievalFailed(e.to_string()))?;
                return Ok(AttestationReceipt {
                    attestation_id,
                    leaf_digest,
                    proof_of_existence,
                });
            }
        }
    }

    Err(AttestationError::Transport(
        "event stream closed before attestation confirmed".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn test_config() -> AttestationConfig {
        AttestationConfig {
            endpoint: "wss://attestation.test".to_string(),
            seed_phrase: "test seed".to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    fn sample_poe() -> ProofOfExistence {
        ProofOfExistence {
            merkle_path: vec![format!("0x{}", "11".repeat(32))],
            leaf_count: 4,
            leaf_index: 1,
        }
    }

    fn passing_signals() -> PublicSignals {
        PublicSignals::new(vec!["1".to_string(), "42".to_string(), "77".to_string()])
    }

    /// Scripted network double: replays a fixed event sequence and records
    /// the order of calls made against it.
    #[derive(Clone)]
    struct ScriptedClient {
        events: Vec<AttestationEvent>,
        keep_stream_open: bool,
        poe: Option<ProofOfExistence>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    struct ScriptedSession {
        events: Vec<AttestationEvent>,
        keep_stream_open: bool,
        poe: Option<ProofOfExistence>,
        calls: Arc<Mutex<Vec<&'static str>>>,
        _keepalive: Option<mpsc::Sender<AttestationEvent>>,
    }

    impl AttestationClient for ScriptedClient {
        type Session = ScriptedSession;

        async fn start(&self, _endpoint: &str, _seed: &str) -> Result<ScriptedSession, AttestationError> {
            self.calls.lock().unwrap().push("start");
            Ok(ScriptedSession {
                events: self.events.clone(),
                keep_stream_open: self.keep_stream_open,
                poe: self.poe.clone(),
                calls: self.calls.clone(),
                _keepalive: None,
            })
        }
    }

    impl AttestationSessionApi for ScriptedSession {
        async fn submit(
            &mut self,
            _request: SubmitRequest,
        ) -> Result<mpsc::Receiver<AttestationEvent>, AttestationError> {
            self.calls.lock().unwrap().push("submit");
            let (tx, rx) = mpsc::channel(self.events.len().max(1));
            for event in self.events.drain(..) {
                tx.send(event).await.expect("scripted channel has capacity");
            }
            if self.keep_stream_open {
                self._keepalive = Some(tx);
            }
            Ok(rx)
        }

        async fn poe(
            &mut self,
            _attestation_id: u64,
            _leaf_digest: &str,
        ) -> Result<ProofOfExistence, AttestationError> {
            self.calls.lock().unwrap().push("poe");
            self.poe
                .clone()
                .ok_or_else(|| AttestationError::Transport("poe endpoint unavailable".to_string()))
        }

        async fn close(self) {
            self.calls.lock().unwrap().push("close");
        }
    }

    /// Client that must never be reached; proves the fast-fail path makes no
    /// network call.
    struct RefusingClient;

    impl AttestationClient for RefusingClient {
        type Session = ScriptedSession;

        async fn start(&self, _endpoint: &str, _seed: &str) -> Result<ScriptedSession, AttestationError> {
            panic!("attestation client must not be reached");
        }
    }

    fn full_event_sequence() -> Vec<AttestationEvent> {
        vec![
            AttestationEvent::IncludedInBlock {
                attestation_id: 4242,
                leaf_digest: "0xleaf".to_string(),
            },
            AttestationEvent::Finalized { block_hash: "0xblock".to_string() },
            AttestationEvent::AttestationConfirmed,
        ]
    }

    #[tokio::test]
    async fn resolves_after_full_event_sequence() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            events: full_event_sequence(),
            keep_stream_open: true,
            poe: Some(sample_poe()),
            calls: calls.clone(),
        };
        let orchestrator =
            AttestationOrchestrator::new(client, test_config(), VerifyingKeyBlob(vec![1]));

        let receipt = orchestrator
            .attest(&ProofBlob(vec![2]), &passing_signals())
            .await
            .unwrap();

        assert_eq!(receipt.attestation_id, 4242);
        assert_eq!(receipt.leaf_digest, "0xleaf");
        assert_eq!(receipt.proof_of_existence, sample_poe());

        // poe must have happened before close.
        let calls = calls.lock().unwrap();
        assert_eq!(*calls, vec!["start", "submit", "poe", "close"]);
    }

    #[tokio::test]
    async fn threshold_fast_fail_makes_no_network_call() {
        let orchestrator =
            AttestationOrchestrator::new(RefusingClient, test_config(), VerifyingKeyBlob(vec![1]));

        let signals =
            PublicSignals::new(vec!["0".to_string(), "42".to_string(), "700".to_string()]);
        let err = orchestrator.attest(&ProofBlob(vec![2]), &signals).await.unwrap_err();
        assert!(matches!(err, AttestationError::ThresholdNotMet));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_confirmation_never_arrives() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            events: vec![
                AttestationEvent::IncludedInBlock {
                    attestation_id: 1,
                    leaf_digest: "0xleaf".to_string(),
                },
                AttestationEvent::Finalized { block_hash: "0xblock".to_string() },
            ],
            keep_stream_open: true,
            poe: Some(sample_poe()),
            calls: calls.clone(),
        };
        let orchestrator =
            AttestationOrchestrator::new(client, test_config(), VerifyingKeyBlob(vec![1]));

        let err = orchestrator
            .attest(&ProofBlob(vec![2]), &passing_signals())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Timeout));

        // The session was still torn down, and poe was never reachable.
        let calls = calls.lock().unwrap();
        assert_eq!(*calls, vec!["start", "submit", "close"]);
    }

    #[tokio::test]
    async fn error_event_resolves_as_transport_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            events: vec![
                AttestationEvent::IncludedInBlock {
                    attestation_id: 1,
                    leaf_digest: "0xleaf".to_string(),
                },
                AttestationEvent::Error { message: "connection reset".to_string() },
            ],
            keep_stream_open: true,
            poe: Some(sample_poe()),
            calls: calls.clone(),
        };
        let orchestrator =
            AttestationOrchestrator::new(client, test_config(), VerifyingKeyBlob(vec![1]));

        let err = orchestrator
            .attest(&ProofBlob(vec![2]), &passing_signals())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Transport(m) if m == "connection reset"));
        assert!(calls.lock().unwrap().contains(&"close"));
    }

    #[tokio::test]
    async fn closed_stream_resolves_as_transport_failure() {
        let client = ScriptedClient {
            events: vec![AttestationEvent::IncludedInBlock {
                attestation_id: 1,
                leaf_digest: "0xleaf".to_string(),
            }],
            keep_stream_open: false,
            poe: Some(sample_poe()),
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        let orchestrator =
            AttestationOrchestrator::new(client, test_config(), VerifyingKeyBlob(vec![1]));

        let err = orchestrator
            .attest(&ProofBlob(vec![2]), &passing_signals())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Transport(_)));
    }

    #[tokio::test]
    async fn poe_failure_resolves_as_retrieval_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            events: full_event_sequence(),
            keep_stream_open: true,
            poe: None,
            calls: calls.clone(),
        };
        let orchestrator =
            AttestationOrchestrator::new(client, test_config(), VerifyingKeyBlob(vec![1]));

        let err = orchestrator
            .attest(&ProofBlob(vec![2]), &passing_signals())
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::RetrievalFailed(_)));
        assert!(calls.lock().unwrap().contains(&"close"));
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut session = AttestationSession::new();

        // Finalized before IncludedInBlock must not advance the machine.
        assert!(matches!(
            session.apply(AttestationEvent::Finalized { block_hash: "0xb".to_string() }),
            Step::Ignored
        ));
        assert_eq!(session.status(), SessionStatus::Submitted);

        // Confirmation before finality is equally invalid.
        assert!(matches!(session.apply(AttestationEvent::AttestationConfirmed), Step::Ignored));
        assert_eq!(session.status(), SessionStatus::Submitted);
    }

    #[test]
    fn resolution_is_idempotent_and_late_events_are_noops() {
        let mut session = AttestationSession::new();
        assert!(matches!(
            session.apply(AttestationEvent::IncludedInBlock {
                attestation_id: 9,
                leaf_digest: "0xleaf".to_string(),
            }),
            Step::Recorded
        ));

        assert!(session.resolve());
        assert!(!session.resolve());
        assert_eq!(session.status(), SessionStatus::Resolved);

        // Signals arriving after resolution have no observable effect.
        assert!(matches!(
            session.apply(AttestationEvent::Finalized { block_hash: "0xb".to_string() }),
            Step::Ignored
        ));
        assert!(matches!(
            session.apply(AttestationEvent::Error { message: "late".to_string() }),
            Step::Ignored
        ));
        assert_eq!(session.status(), SessionStatus::Resolved);
    }
}
