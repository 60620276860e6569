//! Error types for zonesync

use crate::attempt::AttemptRecord;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Failure of a call to the central service or a zone backend.
///
/// Carries the HTTP status and body when the upstream answered, and the
/// transport error as source when it did not.
#[derive(Debug)]
pub struct UpstreamError {
    /// Upstream name, e.g. `central` or a zone id
    pub service: String,
    pub url: String,
    pub status: Option<u16>,
    pub body: Option<String>,
    pub message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl UpstreamError {
    /// Non-2xx answer
    pub fn status(service: &str, url: &str, status: u16, body: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            url: url.to_string(),
            status: Some(status),
            body: Some(body.into()),
            message: format!("HTTP {status}"),
            source: None,
        }
    }

    /// Transport or decoding failure
    pub fn transport<E>(service: &str, url: &str, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            service: service.to_string(),
            url: url.to_string(),
            status: None,
            body: None,
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Answer that could not be interpreted
    pub fn malformed(service: &str, url: &str, message: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            url: url.to_string(),
            status: None,
            body: None,
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request to {} failed: {}", self.service, self.url, self.message)?;
        if let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) {
            write!(f, " ({body})")?;
        }
        Ok(())
    }
}

impl StdError for UpstreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Diagnostic payload of an exhausted provisioning run
#[derive(Debug, Clone)]
pub struct ProvisioningFailure {
    pub zone: String,
    pub connection: String,
    pub attempts: u32,
    /// Last backend payload, if any attempt got one
    pub last_response: Option<Value>,
    pub history: Vec<AttemptRecord>,
}

/// zonesync error type
#[derive(Error, Debug)]
pub enum SyncError {
    /// Unknown zone identifier
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    /// Zone configured without a usable credential pair
    #[error("credentials missing for zone {zone}")]
    CredentialsMissing { zone: String },

    /// Upstream call failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Provisioning retry budget exhausted
    #[error("provisioning of {} in zone {} exhausted after {} attempts", .0.connection, .0.zone, .0.attempts)]
    ProvisioningExhausted(Box<ProvisioningFailure>),

    /// Caller supplied an unusable request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for zonesync
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_display() {
        let err = UpstreamError::status("GTRE01", "https://g3/x", 503, "busy");
        assert_eq!(err.to_string(), "GTRE01 request to https://g3/x failed: HTTP 503 (busy)");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_upstream_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = SyncError::from(UpstreamError::transport("central", "http://c", io));

        let upstream = match &err {
            SyncError::Upstream(u) => u,
            other => panic!("unexpected {other:?}"),
        };
        assert!(upstream.status.is_none());
        assert!(upstream.source().is_some());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_exhausted_display() {
        let err = SyncError::ProvisioningExhausted(Box::new(ProvisioningFailure {
            zone: "GTRE01".into(),
            connection: "9".into(),
            attempts: 5,
            last_response: None,
            history: vec![],
        }));
        assert_eq!(err.to_string(), "provisioning of 9 in zone GTRE01 exhausted after 5 attempts");
    }
}
