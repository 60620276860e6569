//! zonesync Upstream Clients
//!
//! HTTP clients for the two record owners:
//!
//! - **Central subscriber service**: paginated listing with a static API key
//! - **Zone backends**: per-zone HTTP Basic credentials, connection and
//!   reference listings, device directory, provisioning writes
//!
//! Both sit behind a trait ([`SubscriberSource`], [`ZoneBackend`]) so the
//! reconciliation and provisioning engines can run against the in-memory
//! implementations in [`memory`].

pub mod central;
pub mod memory;
pub mod model;
pub mod zone;

mod http;

pub use central::{CentralClient, SubscriberSource};
pub use memory::{InMemorySubscriberSource, InMemoryZoneBackend, ProvisionStep};
pub use model::{
    BackendReply, CatalogEntry, ConnectionForm, DirectoryEntry, ProvisionCommand, Table, UNNAMED,
};
pub use zone::{basic_authorization, ZoneBackend, ZoneBackendClient};
