//! In-memory upstreams
//!
//! Fixed-data implementations of [`SubscriberSource`] and [`ZoneBackend`] for
//! running the engines without live services. Provisioning replies are
//! scripted per call.

use crate::central::SubscriberSource;
use crate::model::{BackendReply, ConnectionForm, DirectoryEntry, ProvisionCommand, Table};
use crate::zone::ZoneBackend;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use zonesync_common::{
    ListingItem, RawConnection, RecordKey, SubscriberRecord, SyncError, SyncResult, UpstreamError,
    Zone,
};

/// Subscriber source over a fixed record set
#[derive(Default)]
pub struct InMemorySubscriberSource {
    subscribers: Vec<SubscriberRecord>,
    fetch_all_calls: AtomicUsize,
}

impl InMemorySubscriberSource {
    pub fn new(subscribers: Vec<SubscriberRecord>) -> Self {
        Self {
            subscribers,
            fetch_all_calls: AtomicUsize::new(0),
        }
    }

    /// Number of full-universe fetches served
    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriberSource for InMemorySubscriberSource {
    async fn fetch_all(&self) -> SyncResult<Vec<SubscriberRecord>> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.subscribers.clone())
    }

    async fn find_by_national_id(&self, national_id: &str) -> SyncResult<Vec<SubscriberRecord>> {
        Ok(self
            .subscribers
            .iter()
            .filter(|s| s.national_id.as_ref().map(RecordKey::as_str) == Some(national_id))
            .cloned()
            .collect())
    }
}

/// Scripted answer of one provisioning call
#[derive(Debug, Clone)]
pub enum ProvisionStep {
    Reply(Value),
    TransportFailure(String),
}

#[derive(Default)]
struct ZoneData {
    connections: Vec<RawConnection>,
    tables: HashMap<Table, Vec<ListingItem>>,
    failing_tables: HashSet<Table>,
    diagnostics: HashMap<RecordKey, Value>,
    devices: Vec<DirectoryEntry>,
}

/// Zone backend over fixed per-zone data
#[derive(Default)]
pub struct InMemoryZoneBackend {
    zones: HashMap<String, ZoneData>,
    provision_script: Mutex<VecDeque<ProvisionStep>>,
    provision_calls: Mutex<Vec<(String, ProvisionCommand)>>,
    created: Mutex<Vec<(String, ConnectionForm)>>,
}

impl InMemoryZoneBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn zone_mut(&mut self, zone: &str) -> &mut ZoneData {
        self.zones.entry(zone.to_string()).or_default()
    }

    pub fn with_connections(mut self, zone: &str, connections: Vec<RawConnection>) -> Self {
        self.zone_mut(zone).connections = connections;
        self
    }

    pub fn with_table(mut self, zone: &str, table: Table, items: Vec<ListingItem>) -> Self {
        self.zone_mut(zone).tables.insert(table, items);
        self
    }

    /// Listing of `table` in `zone` answers HTTP 500
    pub fn with_failing_table(mut self, zone: &str, table: Table) -> Self {
        self.zone_mut(zone).failing_tables.insert(table);
        self
    }

    pub fn with_diagnostic(mut self, zone: &str, connection: RecordKey, report: Value) -> Self {
        self.zone_mut(zone).diagnostics.insert(connection, report);
        self
    }

    pub fn with_devices(mut self, zone: &str, devices: Vec<DirectoryEntry>) -> Self {
        self.zone_mut(zone).devices = devices;
        self
    }

    /// Answers of successive provisioning calls; once drained, calls answer `{}`
    pub fn with_provision_script(self, steps: Vec<ProvisionStep>) -> Self {
        *self.provision_script.lock() = steps.into();
        self
    }

    /// Provisioning calls received, in order
    pub fn provision_calls(&self) -> Vec<(String, ProvisionCommand)> {
        self.provision_calls.lock().clone()
    }

    /// Connection creations received, in order
    pub fn created_connections(&self) -> Vec<(String, ConnectionForm)> {
        self.created.lock().clone()
    }

    fn data(&self, zone: &Zone) -> SyncResult<Option<&ZoneData>> {
        zone.credentials()?;
        Ok(self.zones.get(&zone.id))
    }
}

fn memory_url(zone: &Zone, what: &str) -> String {
    format!("memory://{}/{}", zone.id, what)
}

#[async_trait]
impl ZoneBackend for InMemoryZoneBackend {
    async fn list_connections(
        &self,
        zone: &Zone,
        national_id: Option<&str>,
    ) -> SyncResult<Vec<RawConnection>> {
        let Some(data) = self.data(zone)? else {
            return Ok(Vec::new());
        };
        Ok(data
            .connections
            .iter()
            .filter(|c| match national_id {
                Some(id) => c.fields.other.get("extra_1").and_then(Value::as_str) == Some(id),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_table(&self, zone: &Zone, table: Table) -> SyncResult<Vec<ListingItem>> {
        let Some(data) = self.data(zone)? else {
            return Ok(Vec::new());
        };
        if data.failing_tables.contains(&table) {
            return Err(UpstreamError::status(
                &zone.id,
                &memory_url(zone, table.as_str()),
                500,
                "listing unavailable",
            )
            .into());
        }
        Ok(data.tables.get(&table).cloned().unwrap_or_default())
    }

    async fn diagnostic(&self, zone: &Zone, connection: &RecordKey) -> SyncResult<Value> {
        let report = self
            .data(zone)?
            .and_then(|d| d.diagnostics.get(connection).cloned());
        Ok(report.unwrap_or(Value::Null))
    }

    async fn unprovisioned_devices(
        &self,
        zone: &Zone,
        _node: Option<&RecordKey>,
    ) -> SyncResult<Vec<DirectoryEntry>> {
        Ok(self.data(zone)?.map(|d| d.devices.clone()).unwrap_or_default())
    }

    async fn create_connection(&self, zone: &Zone, form: &ConnectionForm) -> SyncResult<Value> {
        zone.credentials()?;
        if form.ip_pk.is_none() {
            return Err(SyncError::InvalidRequest("available IP not provided".into()));
        }
        let mut created = self.created.lock();
        created.push((zone.id.clone(), form.clone()));
        Ok(serde_json::json!({ "pk": created.len() }))
    }

    async fn provision(&self, zone: &Zone, command: &ProvisionCommand) -> SyncResult<BackendReply> {
        zone.credentials()?;
        self.provision_calls
            .lock()
            .push((zone.id.clone(), command.clone()));

        let step = self.provision_script.lock().pop_front();
        match step {
            Some(ProvisionStep::Reply(payload)) => Ok(BackendReply::from_payload(payload)),
            Some(ProvisionStep::TransportFailure(message)) => Err(UpstreamError::malformed(
                &zone.id,
                &memory_url(zone, "provision"),
                message,
            )
            .into()),
            None => Ok(BackendReply::from_payload(serde_json::json!({}))),
        }
    }
}
