//! Zones and the zone registry
//!
//! A zone is one region's network-management backend. The registry is a plain
//! value built from configuration and handed to every component that needs it.

use crate::error::{SyncError, SyncResult};
use std::collections::HashMap;
use std::fmt;

/// Credential pair for one zone backend
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both halves present
    pub fn is_usable(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One region's network-management backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Zone id, equal to the zone name carried by subscriber records
    pub id: String,
    /// Backend base URL, no trailing slash
    pub base_url: String,
    pub credentials: Option<Credentials>,
    /// City code used when creating connections in this zone
    pub city_code: Option<i64>,
}

impl Zone {
    pub fn new(id: impl Into<String>, base_url: &str) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            city_code: None,
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn with_city_code(mut self, city_code: i64) -> Self {
        self.city_code = Some(city_code);
        self
    }

    /// Usable credentials of this zone, or `CredentialsMissing`
    pub fn credentials(&self) -> SyncResult<&Credentials> {
        self.credentials
            .as_ref()
            .filter(|c| c.is_usable())
            .ok_or_else(|| SyncError::CredentialsMissing {
                zone: self.id.clone(),
            })
    }

    /// Absolute URL for a backend-relative route
    pub fn url(&self, route: &str) -> String {
        if route.starts_with('/') {
            format!("{}{}", self.base_url, route)
        } else {
            format!("{}/{}", self.base_url, route)
        }
    }
}

/// Static zone id → zone mapping, immutable once built.
///
/// Iteration follows configuration order. A repeated id replaces the earlier
/// zone in place.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    index: HashMap<String, usize>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut registry = Self::default();
        for zone in zones {
            match registry.index.get(&zone.id) {
                Some(&at) => registry.zones[at] = zone,
                None => {
                    registry.index.insert(zone.id.clone(), registry.zones.len());
                    registry.zones.push(zone);
                }
            }
        }
        registry
    }

    /// Look up a zone, `ZoneNotFound` when unknown
    pub fn get(&self, id: &str) -> SyncResult<&Zone> {
        self.index
            .get(id)
            .map(|&at| &self.zones[at])
            .ok_or_else(|| SyncError::ZoneNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Zones in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
