//! zonesync Common - Shared types for subscriber/connection reconciliation
//!
//! This crate provides the vocabulary every other zonesync crate speaks:
//! - Zones and the explicitly passed zone registry
//! - Subscriber, connection and reference records as they arrive on the wire
//! - The attribute merge used to build reconciled clients
//! - Error taxonomy
//! - Service configuration loading
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          zonesync                                 │
//! │                                                                   │
//! │  ┌──────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │   Central    │    │ Zone backend │    │  Zone backend  ...  │  │
//! │  │ subscribers  │    │   (zone A)   │    │     (zone B)        │  │
//! │  └──────┬───────┘    └──────┬───────┘    └──────────┬──────────┘  │
//! │         │                   │  reference tables     │             │
//! │         │                   ▼                       ▼             │
//! │         │            ┌─────────────────────────────────────┐      │
//! │         │            │     enrichment (names, sentinel)     │      │
//! │         │            └──────────────────┬──────────────────┘      │
//! │         ▼                               ▼                         │
//! │  ┌──────────────────────────────────────────────────────────────┐ │
//! │  │        join: connector key == subscriber service id           │ │
//! │  └──────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attempt;
pub mod config;
pub mod error;
pub mod merge;
pub mod record;
pub mod zone;

pub use attempt::{AttemptOutcome, AttemptRecord};
pub use config::{
    BackendRoutes, CentralConfig, HttpConfig, ProvisioningConfig, ServiceConfig, ZoneConfig,
};
pub use error::{ProvisioningFailure, SyncError, SyncResult, UpstreamError};
pub use merge::{merge_attributes, AttributeMap};
pub use record::{
    ConnectionFields, EnrichedConnection, ListingItem, LookupOutcome, RawConnection,
    ReconciledClient, RecordKey, SubscriberRecord, ZoneRef, UNKNOWN_REFERENCE,
};
pub use zone::{Credentials, Zone, ZoneRegistry};
