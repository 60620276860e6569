//! Provisioning attempt history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How one provisioning attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Backend accepted the change
    Accepted,
    /// Backend answered with a transient condition
    Transient,
    /// Request never produced a usable answer
    TransportError,
}

/// One entry of a provisioning attempt history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    /// Backend message or transport error text
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(attempt: u32, outcome: AttemptOutcome, detail: Option<String>) -> Self {
        Self {
            attempt,
            outcome,
            detail,
            at: Utc::now(),
        }
    }
}
