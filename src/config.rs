use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::NetworkProfile;

/// Main application configuration.
///
/// Loaded from a TOML file with environment overrides on top; validation
/// runs before any monitor is constructed so a broken config never leaves a
/// partially-watching process behind.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
    #[serde(default)]
    pub forwarder: ForwarderConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One monitored network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Display name, also the logging key for this network
    pub name: String,
    /// HTTP JSON-RPC endpoint URL
    pub rpc_url: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Stablecoin token contract address on this network
    pub token_address: String,
    /// Optional per-network gas policy; the global `[gas]` section applies
    /// when absent
    #[serde(default)]
    pub gas: Option<GasConfig>,
}

impl NetworkConfig {
    pub fn profile(&self) -> NetworkProfile {
        NetworkProfile {
            name: self.name.clone(),
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            token_address: self.token_address.clone(),
        }
    }
}

/// Custody contract and signing credential.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForwarderConfig {
    /// Custody contract address, identical on every network
    #[serde(default)]
    pub custody_address: String,
    /// Signing key, environment-only (`FORWARDER_PRIVATE_KEY`); never read
    /// from or written to the config file
    #[serde(skip)]
    pub private_key: Option<String>,
}

/// Gas policy values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Price ceiling in wei
    pub max_gas_price_wei: u64,
    /// Compute budget per forwarding transaction
    pub gas_limit: u64,
}

/// Monitor timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Deposit log poll cadence in seconds
    pub poll_interval_seconds: u64,
    /// Periodic balance re-check in seconds; 0 disables it
    pub recheck_interval_seconds: u64,
    /// Upper bound on the confirmation wait in seconds
    pub confirmation_timeout_seconds: u64,
    /// Receipt poll cadence in seconds
    pub confirmation_poll_seconds: u64,
}

/// RPC transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_gas_price_wei: 50_000_000_000, // 50 gwei
            gas_limit: 300_000,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
            recheck_interval_seconds: 300,
            confirmation_timeout_seconds: 300,
            confirmation_poll_seconds: 3,
        }
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE`
    /// (default `config.toml`), falling back to defaults when absent.
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(address) = env::var("CUSTODY_ADDRESS") {
            self.forwarder.custody_address = address;
        }
        if let Ok(key) = env::var("FORWARDER_PRIVATE_KEY") {
            self.forwarder.private_key = Some(key);
        }

        if let Ok(price) = env::var("MAX_GAS_PRICE_WEI") {
            self.gas.max_gas_price_wei = parse_env_u64("MAX_GAS_PRICE_WEI", &price)?;
        }
        if let Ok(limit) = env::var("GAS_LIMIT") {
            self.gas.gas_limit = parse_env_u64("GAS_LIMIT", &limit)?;
        }

        if let Ok(interval) = env::var("POLL_INTERVAL_SECONDS") {
            self.monitor.poll_interval_seconds =
                parse_env_u64("POLL_INTERVAL_SECONDS", &interval)?;
        }
        if let Ok(interval) = env::var("RECHECK_INTERVAL_SECONDS") {
            self.monitor.recheck_interval_seconds =
                parse_env_u64("RECHECK_INTERVAL_SECONDS", &interval)?;
        }
        if let Ok(timeout) = env::var("CONFIRMATION_TIMEOUT_SECONDS") {
            self.monitor.confirmation_timeout_seconds =
                parse_env_u64("CONFIRMATION_TIMEOUT_SECONDS", &timeout)?;
        }

        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = parse_env_u64("RPC_TIMEOUT_SECONDS", &timeout)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        // Per-network endpoint overrides, e.g. ARBITRUM_SEPOLIA_RPC_URL for
        // a network named "Arbitrum Sepolia"
        for network in &mut self.networks {
            let var = format!("{}_RPC_URL", env_key(&network.name));
            if let Ok(url) = env::var(&var) {
                network.rpc_url = url;
            }
        }

        Ok(())
    }

    /// The signing credential, environment-only.
    pub fn signing_key(&self) -> Result<String, ConfigError> {
        match &self.forwarder.private_key {
            Some(key) => Ok(key.clone()),
            None => env::var("FORWARDER_PRIVATE_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("FORWARDER_PRIVATE_KEY".to_string())),
        }
    }

    /// Validate configuration values. Any failure here prevents startup
    /// before a single monitor is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }

        let mut seen = std::collections::HashSet::new();
        for network in &self.networks {
            if !seen.insert(network.name.as_str()) {
                return Err(ConfigError::DuplicateNetwork(network.name.clone()));
            }

            if !network.rpc_url.starts_with("http://") && !network.rpc_url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(network.rpc_url.clone()));
            }
            if network.chain_id == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("networks.{}.chain_id", network.name),
                    value: "0".to_string(),
                });
            }
            if !is_hex_address(&network.token_address) {
                return Err(ConfigError::InvalidAddress {
                    key: format!("networks.{}.token_address", network.name),
                    value: network.token_address.clone(),
                });
            }
            if let Some(gas) = &network.gas {
                validate_gas(gas, &format!("networks.{}.gas", network.name))?;
            }
        }

        if !is_hex_address(&self.forwarder.custody_address) {
            return Err(ConfigError::InvalidAddress {
                key: "forwarder.custody_address".to_string(),
                value: self.forwarder.custody_address.clone(),
            });
        }

        validate_gas(&self.gas, "gas")?;

        if self.monitor.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_interval_seconds".to_string(),
                value: "0".to_string(),
            });
        }
        if self.monitor.confirmation_timeout_seconds == 0
            || self.monitor.confirmation_poll_seconds == 0
        {
            return Err(ConfigError::InvalidValue {
                key: "monitor.confirmation".to_string(),
                value: "0".to_string(),
            });
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        // The key itself is parsed when the signer is built; here only the
        // fail-fast presence and shape checks
        let key = self.signing_key()?;
        let stripped = key.strip_prefix("0x").unwrap_or(&key);
        if stripped.len() != 64 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidSigningKey(
                "Expected a 32-byte hex key".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate a sample configuration file with one placeholder network.
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let mut config = Self::default();
        config.networks.push(NetworkConfig {
            name: "Arbitrum Sepolia".to_string(),
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
            chain_id: 421614,
            token_address: "0x75faf114eafb1bdbe2f0316df893fd58ce46aa4d".to_string(),
            gas: None,
        });
        config.forwarder.custody_address =
            "0x0000000000000000000000000000000000000000".to_string();
        toml::to_string_pretty(&config).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn validate_gas(gas: &GasConfig, key: &str) -> Result<(), ConfigError> {
    if gas.max_gas_price_wei == 0 {
        return Err(ConfigError::InvalidValue {
            key: format!("{}.max_gas_price_wei", key),
            value: "0".to_string(),
        });
    }
    if gas.gas_limit == 0 {
        return Err(ConfigError::InvalidValue {
            key: format!("{}.gas_limit", key),
            value: "0".to_string(),
        });
    }
    Ok(())
}

fn parse_env_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn is_hex_address(address: &str) -> bool {
    address.starts_with("0x")
        && address.len() == 42
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
