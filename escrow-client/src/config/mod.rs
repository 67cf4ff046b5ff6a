//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the escrow client.
//! Configuration includes the network endpoint, confirmation polling settings,
//! API server settings and the location of the trade views.

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentLevel;
use std::time::Duration;

/// Environment variable overriding the default config path.
pub const CONFIG_PATH_ENV: &str = "ESCROW_CLIENT_CONFIG_PATH";
/// Config path used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/escrow-client.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure.
///
/// This structure holds configuration for:
/// - Network connection (RPC endpoint, commitment, confirmation polling)
/// - API server (host, port, CORS)
/// - Trade views served by the page router
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EscrowClientConfig {
    /// Network connection settings
    #[serde(default)]
    pub network: NetworkConfig,
    /// API server settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Trade view settings
    #[serde(default)]
    pub views: ViewsConfig,
}

/// Network connection settings passed explicitly to every escrow operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Solana JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Commitment used for reads, preflight and confirmation
    #[serde(
        default = "default_commitment",
        deserialize_with = "deserialize_commitment"
    )]
    pub commitment: CommitmentLevel,
    /// Interval between signature status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for confirmation after this many milliseconds
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
}

impl NetworkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            commitment: default_commitment(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind
    #[serde(default = "default_api_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Allowed CORS origins ("*" allows any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Trade view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Directory holding `alice.html` and `bob.html`
    #[serde(default = "default_views_dir")]
    pub dir: String,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            dir: default_views_dir(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://localhost:8899".to_string()
}

fn default_commitment() -> CommitmentLevel {
    CommitmentLevel::Confirmed
}

/// Parses a commitment name, accepting the legacy names older Solana tooling
/// still writes: `recent`, `single`, `singleGossip`, `root` and `max`.
pub fn parse_commitment(name: &str) -> Option<CommitmentLevel> {
    match name {
        "processed" | "recent" => Some(CommitmentLevel::Processed),
        "confirmed" | "single" | "singleGossip" => Some(CommitmentLevel::Confirmed),
        "finalized" | "root" | "max" => Some(CommitmentLevel::Finalized),
        _ => None,
    }
}

fn deserialize_commitment<'de, D>(deserializer: D) -> Result<CommitmentLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    parse_commitment(&name).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "unknown commitment '{}', expected processed, confirmed or finalized",
            name
        ))
    })
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_confirmation_timeout_ms() -> u64 {
    30_000
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    3400
}

fn default_views_dir() -> String {
    "views".to_string()
}

impl EscrowClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// This function:
    /// 1. Uses the provided path, or ESCROW_CLIENT_CONFIG_PATH, or config/escrow-client.toml
    /// 2. Parses the file if it exists
    /// 3. Validates the configuration
    /// 4. Falls back to defaults only when no path was requested explicitly
    ///    and the default file is absent
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to config file
    ///
    /// # Returns
    ///
    /// * `Ok(EscrowClientConfig)` - Loaded and validated configuration
    /// * `Err(anyhow::Error)` - Missing explicit file, parse error or validation failure
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let explicit = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EscrowClientConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else if explicit.is_some() {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/escrow-client.template.toml config/escrow-client.toml\n\
                Then edit config/escrow-client.toml with your actual values.",
                config_path
            ))
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - RPC URL is http(s)
    /// - Poll interval is nonzero and not longer than the confirmation timeout
    /// - Views directory is set
    pub fn validate(&self) -> anyhow::Result<()> {
        let rpc_url = &self.network.rpc_url;
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            anyhow::bail!(
                "Configuration error: network.rpc_url must be an http(s) URL, got '{}'",
                rpc_url
            );
        }

        if self.network.poll_interval_ms == 0 {
            anyhow::bail!("Configuration error: network.poll_interval_ms must be positive");
        }

        if self.network.confirmation_timeout_ms < self.network.poll_interval_ms {
            anyhow::bail!(
                "Configuration error: network.confirmation_timeout_ms ({}) is shorter than poll_interval_ms ({})",
                self.network.confirmation_timeout_ms,
                self.network.poll_interval_ms
            );
        }

        if self.views.dir.trim().is_empty() {
            anyhow::bail!("Configuration error: views.dir must not be empty");
        }

        Ok(())
    }
}
