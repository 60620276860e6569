//! Provisioning service
//!
//! Serial lookup, profile choice and the retrying workflow, in that order.

use crate::profile::{CallerSuppliedProfile, ProfileStrategy, VendorProfileHeuristic};
use crate::serial::{MatchedDevice, SerialMatch, SerialMatcher};
use crate::workflow::{ProvisioningResult, ProvisioningWorkflow, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use zonesync_common::{ProvisioningConfig, RecordKey, SyncResult, ZoneRegistry};
use zonesync_upstream::{ProvisionCommand, ZoneBackend};

/// Operator request to attach a device to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub zone: String,
    pub connection: RecordKey,
    /// Serial as typed by the operator
    pub serial: String,
    /// Network node whose directory is searched
    #[serde(default)]
    pub node: Option<RecordKey>,
    /// Explicit profile id; the vendor heuristic applies when absent
    #[serde(default)]
    pub profile: Option<String>,
}

/// What a provisioning request ended in, short of an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    Provisioned {
        device: MatchedDevice,
        strategy: &'static str,
        result: ProvisioningResult,
    },
    SerialNotAvailable {
        serial: String,
    },
}

pub struct ProvisioningService {
    registry: ZoneRegistry,
    backend: Arc<dyn ZoneBackend>,
    matcher: SerialMatcher,
    workflow: ProvisioningWorkflow,
    heuristic: VendorProfileHeuristic,
}

impl ProvisioningService {
    pub fn new(
        registry: ZoneRegistry,
        backend: Arc<dyn ZoneBackend>,
        policy: RetryPolicy,
        heuristic: VendorProfileHeuristic,
    ) -> Self {
        let workflow = ProvisioningWorkflow::new(backend.clone(), policy);
        Self {
            registry,
            backend,
            matcher: SerialMatcher,
            workflow,
            heuristic,
        }
    }

    pub fn from_config(
        registry: ZoneRegistry,
        backend: Arc<dyn ZoneBackend>,
        config: &ProvisioningConfig,
    ) -> Self {
        Self::new(
            registry,
            backend,
            RetryPolicy::from_config(config),
            VendorProfileHeuristic::from_config(config),
        )
    }

    pub fn workflow(&self) -> &ProvisioningWorkflow {
        &self.workflow
    }

    /// Search a zone's unprovisioned devices for `serial`
    pub async fn match_serial(
        &self,
        zone_id: &str,
        node: Option<&RecordKey>,
        serial: &str,
    ) -> SyncResult<SerialMatch> {
        let zone = self.registry.get(zone_id)?;
        let directory = self.backend.unprovisioned_devices(zone, node).await?;
        Ok(self.matcher.match_serial(&directory, serial))
    }

    pub async fn provision(&self, request: ProvisionRequest) -> SyncResult<ProvisionOutcome> {
        let zone = self.registry.get(&request.zone)?;

        let device = match self
            .match_serial(&zone.id, request.node.as_ref(), &request.serial)
            .await?
        {
            SerialMatch::Matched(device) => device,
            SerialMatch::NotAvailable => {
                info!(zone = %zone.id, serial = %request.serial, "serial not available");
                return Ok(ProvisionOutcome::SerialNotAvailable {
                    serial: request.serial,
                });
            }
        };

        let strategy: &dyn ProfileStrategy = match request.profile {
            Some(_) => &CallerSuppliedProfile,
            None => &self.heuristic,
        };
        let profile = strategy.select(&device, request.profile.as_deref())?;

        let command = ProvisionCommand {
            connection: request.connection,
            serial: device.serial().to_string(),
            profile,
        };
        let result = self.workflow.run(zone, command).await?;

        Ok(ProvisionOutcome::Provisioned {
            device,
            strategy: strategy.name(),
            result,
        })
    }
}
