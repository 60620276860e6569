//! zonesync Provisioning
//!
//! Attaches an unprovisioned device (ONU) and a network profile to an
//! existing zone connection.
//!
//! - [`serial`]: locate the operator's serial in the device directory
//! - [`profile`]: choose the profile id
//! - [`workflow`]: send the provision command, retrying while the backend
//!   has not caught up with a new connection
//! - [`service`]: the three steps chained for one request

pub mod profile;
pub mod serial;
pub mod service;
pub mod workflow;

pub use profile::{CallerSuppliedProfile, ProfileStrategy, VendorProfileHeuristic};
pub use serial::{DeviceIdentity, MatchRule, MatchedDevice, SerialMatch, SerialMatcher};
pub use service::{ProvisionOutcome, ProvisionRequest, ProvisioningService};
pub use workflow::{
    MissingConnectionMarker, ProvisioningResult, ProvisioningState, ProvisioningWorkflow,
    RetryPolicy, TransientClassifier, MISSING_CONNECTION_MARKER,
};
