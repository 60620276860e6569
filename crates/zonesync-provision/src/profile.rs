//! Profile selection strategies
//!
//! The provisioning workflow takes a profile id that was already chosen.
//! These strategies make that choice.

use crate::serial::MatchedDevice;
use std::collections::BTreeMap;
use zonesync_common::{ProvisioningConfig, SyncError, SyncResult};

/// Chooses the network profile for a matched device
pub trait ProfileStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Profile id to provision `device` with. `requested` is the operator's
    /// choice, if any.
    fn select(&self, device: &MatchedDevice, requested: Option<&str>) -> SyncResult<String>;
}

/// Uses the profile id the operator supplied
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerSuppliedProfile;

impl ProfileStrategy for CallerSuppliedProfile {
    fn name(&self) -> &'static str {
        "caller_supplied"
    }

    fn select(&self, _device: &MatchedDevice, requested: Option<&str>) -> SyncResult<String> {
        requested
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SyncError::InvalidRequest("profile id is required".into()))
    }
}

/// Derives the profile from the device's vendor prefix
#[derive(Debug, Clone, Default)]
pub struct VendorProfileHeuristic {
    /// Uppercased vendor prefix → profile id
    profiles: BTreeMap<String, String>,
    default_profile: Option<String>,
}

impl VendorProfileHeuristic {
    pub fn new(profiles: BTreeMap<String, String>, default_profile: Option<String>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|(vendor, profile)| (vendor.to_ascii_uppercase(), profile))
                .collect(),
            default_profile,
        }
    }

    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::new(config.vendor_profiles.clone(), config.default_profile.clone())
    }
}

impl ProfileStrategy for VendorProfileHeuristic {
    fn name(&self) -> &'static str {
        "vendor_heuristic"
    }

    fn select(&self, device: &MatchedDevice, _requested: Option<&str>) -> SyncResult<String> {
        let vendor = device.identity.vendor_prefix().map(str::to_ascii_uppercase);
        vendor
            .as_ref()
            .and_then(|v| self.profiles.get(v))
            .or(self.default_profile.as_ref())
            .cloned()
            .ok_or_else(|| {
                SyncError::InvalidRequest(format!(
                    "no profile configured for vendor {}",
                    vendor.as_deref().unwrap_or("unknown")
                ))
            })
    }
}
