//! Service configuration
//!
//! Loaded once at startup from a JSON file. Secrets may be referenced by
//! environment variable name instead of being written into the file.

use crate::error::{SyncError, SyncResult};
use crate::zone::{Zone, ZoneRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Central subscriber service
    pub central: CentralConfig,
    /// Zone backends
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    /// HTTP client settings shared by every upstream
    #[serde(default)]
    pub http: HttpConfig,
    /// Zone backend routes
    #[serde(default)]
    pub routes: BackendRoutes,
    /// Provisioning retry and profile settings
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

impl ServiceConfig {
    /// Load from file
    pub fn load(path: &str) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse from JSON text
    pub fn from_json(content: &str) -> SyncResult<Self> {
        serde_json::from_str(content).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Zone registry with secrets read from the process environment
    pub fn zone_registry(&self) -> ZoneRegistry {
        self.zone_registry_with(|name| std::env::var(name).ok())
    }

    /// Zone registry with secrets read through `lookup`
    pub fn zone_registry_with<F>(&self, lookup: F) -> ZoneRegistry
    where
        F: Fn(&str) -> Option<String>,
    {
        ZoneRegistry::from_zones(self.zones.iter().map(|z| z.to_zone(&lookup)))
    }

    /// Central API key from the file or the environment
    pub fn central_api_key(&self) -> SyncResult<String> {
        self.central.api_key_with(|name| std::env::var(name).ok())
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

/// Central subscriber service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl CentralConfig {
    /// Inline key first, then the named environment variable
    pub fn api_key_with<F>(&self, lookup: F) -> SyncResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .or_else(|| self.api_key_env.as_deref().and_then(&lookup))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SyncError::Config("central API key not configured".into()))
    }
}

fn default_page_size() -> usize {
    300
}

/// One zone backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: String,
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub city_code: Option<i64>,
}

impl ZoneConfig {
    fn to_zone<F>(&self, lookup: &F) -> Zone
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut zone = Zone::new(self.id.clone(), &self.base_url);
        let password = self
            .password
            .clone()
            .or_else(|| self.password_env.as_deref().and_then(lookup));

        match (&self.username, password) {
            (Some(user), Some(pass)) => zone = zone.with_credentials(user, &pass),
            _ => tracing::warn!(zone = %self.id, "zone configured without credentials"),
        }
        if let Some(code) = self.city_code {
            zone = zone.with_city_code(code);
        }
        zone
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Zone backends often serve self-signed certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Zone backend routes, relative to the zone base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendRoutes {
    pub connections: String,
    pub cities: String,
    pub equipment: String,
    pub ip_addresses: String,
    pub nodes: String,
    pub plans: String,
    pub dhcp_accesses: String,
    pub diagnostic: String,
    pub unprovisioned_devices: String,
    pub create_connection: String,
    pub provision: String,
}

impl Default for BackendRoutes {
    fn default() -> Self {
        Self {
            connections: "/gateway/integracion/clientes/cuentasimple/listar?json".into(),
            cities: "/gateway/integracion/geografico/ciudad/listar?json".into(),
            equipment: "/gateway/integracion/hardware/equipocliente/listar?json".into(),
            ip_addresses: "/gateway/integracion/red/direccionip/listar?json".into(),
            nodes: "/gateway/integracion/hardware/nodored/listar?activo=True&admite_clientes=True&json"
                .into(),
            plans: "/gateway/integracion/clientes/plan/listar?json".into(),
            dhcp_accesses: "/gateway/integracion/red/accesodhcp/listar?json".into(),
            diagnostic: "/gateway/integracion/clientes/cuentasimple/diagnostico?json".into(),
            unprovisioned_devices: "/gateway/integracion/hardware/onu/disponibles?json".into(),
            create_connection: "/gateway/integracion/clientes/cuentasimple/crear?json".into(),
            provision: "/gateway/integracion/clientes/cuentasimple/aprovisionar?json".into(),
        }
    }
}

/// Provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n × base_delay_ms` before the next one
    pub base_delay_ms: u64,
    /// Vendor prefix → profile id, used by the vendor heuristic
    pub vendor_profiles: BTreeMap<String, String>,
    pub default_profile: Option<String>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            vendor_profiles: BTreeMap::new(),
            default_profile: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const SAMPLE: &str = r#"{
        "central": {"base_url": "https://central.example.com", "api_key_env": "CENTRAL_KEY"},
        "zones": [
            {"id": "GTRE01", "base_url": "https://g3.example.net:815", "username": "api",
             "password_env": "PASS_GTRE01", "city_code": 40},
            {"id": "BRMNORTE1", "base_url": "https://g2.example.net:815", "username": "api"}
        ],
        "provisioning": {"vendor_profiles": {"SKYW": "12"}}
    }"#;

    fn env(name: &str) -> Option<String> {
        match name {
            "CENTRAL_KEY" => Some("k-123".into()),
            "PASS_GTRE01" => Some("s3cret".into()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = assert_ok!(ServiceConfig::from_json(SAMPLE));

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.central.page_size, 300);
        assert_eq!(config.http.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.provisioning.max_attempts, 5);
        assert_eq!(config.provisioning.base_delay_ms, 2000);
        assert_eq!(config.provisioning.vendor_profiles["SKYW"], "12");
        assert_eq!(config.routes, BackendRoutes::default());
    }

    #[test]
    fn test_zone_registry_resolves_secrets() {
        let config = ServiceConfig::from_json(SAMPLE).unwrap();
        let registry = config.zone_registry_with(env);

        let gtre = registry.get("GTRE01").unwrap();
        assert_eq!(gtre.credentials().unwrap().password(), "s3cret");
        assert_eq!(gtre.city_code, Some(40));

        let norte = registry.get("BRMNORTE1").unwrap();
        assert_err!(norte.credentials());
    }

    #[test]
    fn test_central_api_key() {
        let config = ServiceConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.central.api_key_with(env).unwrap(), "k-123");
        assert_err!(config.central.api_key_with(|_| None));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(ServiceConfig::from_json("{"), Err(SyncError::Config(_))));
    }
}
