// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fleet Gateway Configuration Types
//
// Defines the configuration schema for AEGIS fleet gateway nodes, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Node identity (the token audience value)
// - Network, TLS, and trust-mode settings
// - Service allowlist and supervisor adapter settings
// - Outbound dispatch timeouts and observability settings

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FleetGatewayConfig")
    pub kind: String,

    /// Manifest metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Gateway configuration specification
    pub spec: GatewaySpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Labels for categorization and discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Gateway configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySpec {
    /// Node identity
    pub identity: IdentityConfig,

    /// Network configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Trust verification configuration
    #[serde(default)]
    pub trust: TrustConfig,

    /// Remotely controllable services
    #[serde(default)]
    pub services: ServicesConfig,

    /// Process supervisor adapter configuration
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Outbound dispatch configuration (manager side)
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Observability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Stable node identifier. Doubles as the required token audience in
    /// mutual-trust mode.
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// TLS configuration. Presence enables mutually-authenticated serving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            tls: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to the server certificate
    pub cert_path: String,

    /// Path to the server private key
    pub key_path: String,

    /// Path to the CA certificate clients must chain to
    pub ca_path: String,
}

/// Trust strategy selection. The two modes are interchangeable per
/// deployment, never combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustMode {
    SharedSecret,
    MutualTls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    #[serde(default = "default_trust_mode")]
    pub mode: TrustMode,

    /// Path to the persisted shared-secret key file
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Path to the issuer public key (PEM), required in mutual-tls mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_key_path: Option<String>,

    /// Optional issuer pin for token verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            mode: default_trust_mode(),
            key_file: default_key_file(),
            issuer_key_path: None,
            issuer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    /// Exact names of services eligible for remote control
    #[serde(default)]
    pub allowed: Vec<String>,

    /// Report every supervised process in /health instead of only
    /// allowlisted ones
    #[serde(default)]
    pub expose_all_in_health: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Supervisor binary to shell out to
    #[serde(default = "default_pm2_bin")]
    pub pm2_bin: String,

    /// Upper bound on any single supervisor call
    #[serde(with = "humantime_serde", default = "default_call_timeout")]
    pub command_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            pm2_bin: default_pm2_bin(),
            command_timeout: default_call_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on any single manager → agent call
    #[serde(with = "humantime_serde", default = "default_call_timeout")]
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: default_call_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Port for the Prometheus exposition endpoint; None disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8443
}

fn default_trust_mode() -> TrustMode {
    TrustMode::SharedSecret
}

fn default_key_file() -> String {
    "key.json".to_string()
}

fn default_pm2_bin() -> String {
    "pm2".to_string()
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for GatewaySpec {
    fn default() -> Self {
        Self {
            identity: IdentityConfig {
                id: uuid::Uuid::new_v4().to_string(),
            },
            network: NetworkConfig::default(),
            trust: TrustConfig::default(),
            services: ServicesConfig::default(),
            supervisor: SupervisorConfig::default(),
            dispatch: DispatchConfig::default(),
            observability: None,
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "fleet-node".to_string());

        Self {
            api_version: "100monkeys.ai/v1".to_string(),
            kind: "FleetGatewayConfig".to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                labels: None,
            },
            spec: GatewaySpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_FLEET_CONFIG_PATH environment variable
    /// 2. ./fleetgate.yaml (working directory)
    /// 3. ~/.fleetgate/config.yaml (user home)
    /// 4. /etc/fleetgate/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AEGIS_FLEET_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./fleetgate.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fleetgate").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/fleetgate/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AEGIS_FLEET_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: AEGIS_FLEET_PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for AEGIS_FLEET_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("AEGIS_FLEET_TRUST_MODE") {
            match val.as_str() {
                "shared-secret" => self.spec.trust.mode = TrustMode::SharedSecret,
                "mutual-tls" => self.spec.trust.mode = TrustMode::MutualTls,
                _ => {
                    tracing::warn!(
                        "Invalid value for AEGIS_FLEET_TRUST_MODE: '{}'. Expected shared-secret or mutual-tls. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != "100monkeys.ai/v1" {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '100monkeys.ai/v1'",
                self.api_version
            );
        }

        if self.kind != "FleetGatewayConfig" {
            anyhow::bail!("Invalid kind: '{}'. Must be 'FleetGatewayConfig'", self.kind);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.identity.id.is_empty() {
            anyhow::bail!("spec.identity.id cannot be empty");
        }

        if self.spec.trust.key_file.is_empty() {
            anyhow::bail!("spec.trust.key_file cannot be empty");
        }

        // Mutual-trust mode needs both the token issuer key and a TLS
        // listener that can demand client certificates.
        if self.spec.trust.mode == TrustMode::MutualTls {
            if self.spec.trust.issuer_key_path.is_none() {
                anyhow::bail!("spec.trust.issuer_key_path is required in mutual-tls mode");
            }
            if self.spec.network.tls.is_none() {
                anyhow::bail!("spec.network.tls is required in mutual-tls mode");
            }
        }

        for name in &self.spec.services.allowed {
            if name.is_empty() {
                anyhow::bail!("spec.services.allowed entries cannot be empty");
            }
        }

        Ok(())
    }
}
