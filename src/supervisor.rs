use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{ClientTiming, EvmChainClient};
use crate::config::AppConfig;
use crate::error::{ConfigError, ForwarderError};
use crate::logging::LogContext;
use crate::models::GasPolicy;
use crate::monitor::{ChainMonitor, MonitorError};

/// Owns the fleet of per-network monitors.
///
/// Startup is sequential and all-or-nothing at the process level: the first
/// monitor that fails to start aborts the sequence and the error is left to
/// the caller, which terminates the process. Already-started monitors are not
/// rolled back; process exit tears them down.
pub struct MonitorSupervisor {
    monitors: Vec<ChainMonitor>,
}

impl MonitorSupervisor {
    pub fn new(monitors: Vec<ChainMonitor>) -> Self {
        Self { monitors }
    }

    /// Build one monitor per configured network. Fails fast on any
    /// credential or address that validation let through malformed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ForwarderError> {
        let custody_address =
            Address::from_str(&config.forwarder.custody_address).map_err(|_| {
                ConfigError::InvalidAddress {
                    key: "forwarder.custody_address".to_string(),
                    value: config.forwarder.custody_address.clone(),
                }
            })?;

        let key = config.signing_key()?;
        let signer = PrivateKeySigner::from_str(&key)
            .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;

        let timing = ClientTiming {
            poll_interval: Duration::from_secs(config.monitor.poll_interval_seconds),
            confirmation_poll: Duration::from_secs(config.monitor.confirmation_poll_seconds),
            confirmation_timeout: Duration::from_secs(config.monitor.confirmation_timeout_seconds),
        };
        let recheck_interval = match config.monitor.recheck_interval_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        };

        let mut monitors = Vec::with_capacity(config.networks.len());
        for network in &config.networks {
            let gas_policy = network
                .gas
                .as_ref()
                .map(|gas| GasPolicy::new(gas.max_gas_price_wei, gas.gas_limit))
                .unwrap_or_else(|| GasPolicy::new(config.gas.max_gas_price_wei, config.gas.gas_limit));

            let client = EvmChainClient::new(
                network.profile(),
                custody_address,
                signer.clone(),
                config.rpc.timeout_seconds,
                timing,
            );

            monitors.push(ChainMonitor::new(
                network.profile(),
                Arc::new(client),
                gas_policy,
                recheck_interval,
            ));
        }

        Ok(Self::new(monitors))
    }

    pub fn monitors(&self) -> &[ChainMonitor] {
        &self.monitors
    }

    /// Start every monitor in configuration order, aborting on the first
    /// failure.
    pub async fn start(&self) -> Result<(), MonitorError> {
        LogContext::new("supervisor", "start")
            .with_metadata("monitor_count", serde_json::json!(self.monitors.len()))
            .info("Starting deposit monitors");

        for monitor in &self.monitors {
            monitor.start().await?;
        }

        LogContext::new("supervisor", "start")
            .with_outcome("running")
            .info("All deposit monitors started");
        Ok(())
    }

    /// Best-effort shutdown: every tracked monitor is stopped regardless of
    /// what the others do.
    pub fn stop(&self) {
        LogContext::new("supervisor", "stop").info("Stopping deposit monitors");
        // Each monitor logs its own stop record
        for monitor in &self.monitors {
            monitor.stop();
        }
    }
}
