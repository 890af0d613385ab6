use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::errors::FundClientError;

/// Blockchain network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "Sepolia Testnet".to_string(),
            rpc_url: "https://rpc.sepolia.org".to_string(),
            chain_id: 11155111,
        }
    }
}

/// Deployed contract addresses the client talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Multi-token asset registry (share classes).
    pub asset_registry: String,
    /// Settlement currency token (6 decimals).
    pub payment_token: String,
    pub primary_market: String,
    pub secondary_market: String,
}

/// Transaction confirmation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// How long the native confirmation wait may run before the fallback
    /// receipt check takes over (milliseconds).
    #[serde(default = "ConfirmationConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ConfirmationConfig {
    fn default_timeout_ms() -> u64 {
        15_000
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self { timeout_ms: Self::default_timeout_ms() }
    }
}

/// Snapshot refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Automatic refresh interval in seconds.
    #[serde(default = "RefreshConfig::default_interval_secs")]
    pub interval_secs: u64,
}

impl RefreshConfig {
    fn default_interval_secs() -> u64 {
        30
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: Self::default_interval_secs() }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundClientConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    pub contracts: ContractAddresses,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Base URL for off-chain asset metadata documents.
    #[serde(default)]
    pub metadata_base_url: Option<String>,
}

impl FundClientConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, FundClientError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FundClientError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|e| {
            FundClientError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables take precedence over file values. Only
    /// non-sensitive endpoint settings are overridable this way.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FUND_CLIENT_RPC_URL") {
            self.network.rpc_url = url;
        }
        if let Ok(raw) = std::env::var("FUND_CLIENT_CHAIN_ID") {
            match raw.parse() {
                Ok(id) => self.network.chain_id = id,
                Err(_) => tracing::warn!(value = %raw, "Ignoring malformed FUND_CLIENT_CHAIN_ID"),
            }
        }
        if let Ok(url) = std::env::var("FUND_CLIENT_METADATA_URL") {
            self.metadata_base_url = Some(url);
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation.timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }
}
