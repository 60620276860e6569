//! Subscriber ↔ connection join
//!
//! # Paths
//!
//! - **Single zone**: the zone's connections are enriched and joined against
//!   the subscribers assigned to that zone
//! - **All zones**: every registered zone is enriched concurrently; the
//!   central universe is fetched once and shared by all joins
//! - **National id**: the central service is searched for the id, each
//!   contract is resolved in its own zone with a backend-side search, and
//!   the connection diagnostic is attached to each pair
//!
//! Joins are inner: connections with no matching subscriber are dropped,
//! as are subscribers with no connection.

use crate::enrichment::EnrichmentPipeline;
use crate::resolver::ReferenceResolver;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zonesync_common::{
    EnrichedConnection, LookupOutcome, RecordKey, ReconciledClient, SubscriberRecord, SyncResult,
    Zone, ZoneRegistry,
};
use zonesync_upstream::{SubscriberSource, ZoneBackend};

/// A contract found by national id, with its connection diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct NationalIdMatch {
    pub client: ReconciledClient,
    pub diagnostic: Value,
}

/// Inner join of subscribers and enriched connections on
/// `service_id == connector`.
///
/// Output follows connection order. When several subscribers share a
/// service id the last one wins.
pub fn join_records(
    subscribers: Vec<SubscriberRecord>,
    connections: Vec<EnrichedConnection>,
) -> Vec<ReconciledClient> {
    let mut by_service: HashMap<RecordKey, SubscriberRecord> = HashMap::with_capacity(subscribers.len());
    for subscriber in subscribers {
        if let Some(id) = subscriber.service_id.clone() {
            by_service.insert(id, subscriber);
        }
    }

    connections
        .into_iter()
        .filter_map(|connection| {
            let subscriber = connection.connector().and_then(|c| by_service.get(c))?.clone();
            Some(ReconciledClient::new(subscriber, connection))
        })
        .collect()
}

/// Reconciliation entry point
pub struct ReconciliationJoiner {
    registry: ZoneRegistry,
    subscribers: Arc<dyn SubscriberSource>,
    backend: Arc<dyn ZoneBackend>,
    resolver: ReferenceResolver,
}

impl ReconciliationJoiner {
    pub fn new(
        registry: ZoneRegistry,
        subscribers: Arc<dyn SubscriberSource>,
        backend: Arc<dyn ZoneBackend>,
    ) -> Self {
        let resolver = ReferenceResolver::new(backend.clone());
        Self {
            registry,
            subscribers,
            backend,
            resolver,
        }
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// All connections of `zone`, enriched
    pub async fn enriched_connections(&self, zone: &Zone) -> SyncResult<Vec<EnrichedConnection>> {
        let (raws, indexes) = tokio::try_join!(
            self.backend.list_connections(zone, None),
            self.resolver.resolve(zone),
        )?;
        debug!(zone = %zone.id, connections = raws.len(), "enriching connections");
        Ok(EnrichmentPipeline::new(indexes).enrich_all(raws))
    }

    /// Join one zone's connections with the subscribers assigned to it
    pub async fn reconcile_zone(&self, zone_id: &str) -> SyncResult<Vec<ReconciledClient>> {
        let zone = self.registry.get(zone_id)?;
        let (connections, subscribers) = tokio::try_join!(
            self.enriched_connections(zone),
            self.subscribers.fetch_all(),
        )?;

        let in_zone: Vec<SubscriberRecord> = subscribers
            .into_iter()
            .filter(|s| s.zone_name() == Some(zone.id.as_str()))
            .collect();
        let joined = join_records(in_zone, connections);
        info!(zone = %zone.id, clients = joined.len(), "zone reconciled");
        Ok(joined)
    }

    /// Join every registered zone against one shared subscriber universe.
    /// Any zone failure fails the whole call.
    pub async fn reconcile_all(&self) -> SyncResult<Vec<ReconciledClient>> {
        let limit = self.registry.len().max(1);
        let futures: Vec<_> = self
            .registry
            .iter()
            .map(|zone| self.enriched_connections(zone))
            .collect();
        let per_zone = stream::iter(futures)
            .buffered(limit)
            .try_collect::<Vec<_>>();

        let (per_zone, subscribers) = tokio::try_join!(per_zone, self.subscribers.fetch_all())?;

        let connections: Vec<EnrichedConnection> = per_zone.into_iter().flatten().collect();
        let joined = join_records(subscribers, connections);
        info!(zones = self.registry.len(), clients = joined.len(), "all zones reconciled");
        Ok(joined)
    }

    /// Find every contract held under `national_id` and pair each with its
    /// zone connection and diagnostic.
    pub async fn lookup_national_id(
        &self,
        national_id: &str,
    ) -> SyncResult<LookupOutcome<Vec<NationalIdMatch>>> {
        let contracts = self.subscribers.find_by_national_id(national_id).await?;
        if contracts.is_empty() {
            return Ok(LookupOutcome::not_found(format!(
                "no subscriber with national id {national_id}"
            )));
        }

        // Group by zone so each zone is searched and resolved once
        let mut groups: Vec<(String, Vec<SubscriberRecord>)> = Vec::new();
        for contract in contracts {
            let Some(zone_name) = contract.zone_name().map(str::to_string) else {
                warn!(national_id, service_id = ?contract.service_id, "contract has no zone");
                continue;
            };
            match groups.iter_mut().find(|(name, _)| *name == zone_name) {
                Some((_, group)) => group.push(contract),
                None => groups.push((zone_name, vec![contract])),
            }
        }

        let mut matches = Vec::new();
        for (zone_name, group) in groups {
            let zone = self.registry.get(&zone_name)?;
            let (raws, indexes) = tokio::try_join!(
                self.backend.list_connections(zone, Some(national_id)),
                self.resolver.resolve(zone),
            )?;
            let pipeline = EnrichmentPipeline::new(indexes);
            let any_connector = raws.iter().any(|r| r.fields.connector.is_some());

            for (position, contract) in group.into_iter().enumerate() {
                let raw = if any_connector {
                    raws.iter()
                        .find(|r| r.fields.connector.is_some() && r.fields.connector == contract.service_id)
                } else {
                    // No connector keys to join on: pair contracts and connections by position
                    raws.get(position)
                };
                let Some(raw) = raw else {
                    debug!(zone = %zone.id, service_id = ?contract.service_id, "no connection for contract");
                    continue;
                };

                let connection = pipeline.enrich(raw.clone());
                let diagnostic = self.backend.diagnostic(zone, &connection.pk).await?;
                matches.push(NationalIdMatch {
                    client: ReconciledClient::new(contract, connection),
                    diagnostic,
                });
            }
        }

        if matches.is_empty() {
            return Ok(LookupOutcome::not_found(format!(
                "no zone connection for national id {national_id}"
            )));
        }
        info!(national_id, matches = matches.len(), "national id resolved");
        Ok(LookupOutcome::Found(matches))
    }
}
