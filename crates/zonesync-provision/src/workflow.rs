//! Provisioning workflow
//!
//! ```text
//!   Pending ──► Attempting(1) ──► Succeeded
//!                   │ transient
//!                   ▼  wait base_delay × 1
//!               Attempting(2) ──► Succeeded
//!                   ⋮
//!               Attempting(max) ──► Exhausted
//! ```
//!
//! A reply is transient when the backend has not yet seen the connection
//! it is asked to attach the device to. Transport failures are retried the
//! same way. Missing credentials are not.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use zonesync_common::{
    AttemptOutcome, AttemptRecord, ProvisioningConfig, ProvisioningFailure, RecordKey, SyncError,
    SyncResult, Zone,
};
use zonesync_upstream::{BackendReply, ProvisionCommand, ZoneBackend};

/// Message a zone backend answers while a fresh connection is still propagating
pub const MISSING_CONNECTION_MARKER: &str = "No existe conexión válida";

/// Attempt at which a success counts as recovered
const RECOVERED_FROM_ATTEMPT: u32 = 3;

/// Decides whether a backend reply warrants another attempt
pub trait TransientClassifier: Send + Sync {
    fn is_transient(&self, reply: &BackendReply) -> bool;
}

/// Treats replies carrying [`MISSING_CONNECTION_MARKER`] as transient
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingConnectionMarker;

impl TransientClassifier for MissingConnectionMarker {
    fn is_transient(&self, reply: &BackendReply) -> bool {
        match &reply.message {
            Some(message) => message.contains(MISSING_CONNECTION_MARKER),
            None => reply.payload.to_string().contains(MISSING_CONNECTION_MARKER),
        }
    }
}

/// Attempt budget and linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "attempt")]
pub enum ProvisioningState {
    Pending,
    Attempting(u32),
    Succeeded,
    Exhausted,
}

/// Successful provisioning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningResult {
    pub connection: RecordKey,
    pub serial: String,
    pub profile: String,
    pub attempts: u32,
    /// Success needed three or more attempts
    pub recovered: bool,
    pub response: Value,
    pub history: Vec<AttemptRecord>,
}

/// Retrying provision of one device onto one connection
#[derive(Clone)]
pub struct ProvisioningWorkflow {
    backend: Arc<dyn ZoneBackend>,
    policy: RetryPolicy,
    classifier: Arc<dyn TransientClassifier>,
}

impl ProvisioningWorkflow {
    pub fn new(backend: Arc<dyn ZoneBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            classifier: Arc::new(MissingConnectionMarker),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TransientClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run(&self, zone: &Zone, command: ProvisionCommand) -> SyncResult<ProvisioningResult> {
        zone.credentials()?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = ProvisioningState::Pending;
        let mut history = Vec::new();
        let mut last_response = None;

        info!(
            zone = %zone.id,
            connection = %command.connection,
            serial = %command.serial,
            profile = %command.profile,
            ?state,
            "provisioning device"
        );

        for attempt in 1..=max_attempts {
            state = ProvisioningState::Attempting(attempt);
            debug!(zone = %zone.id, ?state, "provision attempt");

            match self.backend.provision(zone, &command).await {
                Ok(reply) if !self.classifier.is_transient(&reply) => {
                    history.push(AttemptRecord::new(attempt, AttemptOutcome::Accepted, reply.message));
                    state = ProvisioningState::Succeeded;
                    info!(zone = %zone.id, attempts = attempt, ?state, "device provisioned");
                    return Ok(ProvisioningResult {
                        connection: command.connection,
                        serial: command.serial,
                        profile: command.profile,
                        attempts: attempt,
                        recovered: attempt >= RECOVERED_FROM_ATTEMPT,
                        response: reply.payload,
                        history,
                    });
                }
                Ok(reply) => {
                    history.push(AttemptRecord::new(attempt, AttemptOutcome::Transient, reply.message));
                    last_response = Some(reply.payload);
                }
                Err(SyncError::Upstream(err)) => {
                    history.push(AttemptRecord::new(
                        attempt,
                        AttemptOutcome::TransportError,
                        Some(err.to_string()),
                    ));
                }
                Err(other) => return Err(other),
            }

            if attempt < max_attempts {
                let wait = self.policy.delay_after(attempt);
                warn!(
                    zone = %zone.id,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "provisioning not accepted yet, retrying"
                );
                tokio::time::sleep(wait).await;
            }
        }

        state = ProvisioningState::Exhausted;
        error!(zone = %zone.id, attempts = max_attempts, ?state, "provisioning exhausted");
        Err(SyncError::ProvisioningExhausted(Box::new(ProvisioningFailure {
            zone: zone.id.clone(),
            connection: command.connection.to_string(),
            attempts: max_attempts,
            last_response,
            history,
        })))
    }
}
