//! zonesync Reconciliation Engine
//!
//! Joins central subscriber records with zone backend connection records.
//!
//! ```text
//!   ZoneRegistry ──► ZoneBackend ──► ReferenceResolver ──► EnrichmentPipeline
//!                                                                 │
//!   SubscriberSource ───────────────────────────────► ReconciliationJoiner
//! ```
//!
//! Nothing is cached: every call recomputes from the live sources.

pub mod enrichment;
pub mod joiner;
pub mod resolver;

pub use enrichment::EnrichmentPipeline;
pub use joiner::{join_records, NationalIdMatch, ReconciliationJoiner};
pub use resolver::{ReferenceIndex, ReferenceIndexes, ReferenceResolver};
