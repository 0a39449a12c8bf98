use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Immutable description of one monitored network, supplied at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkProfile {
    /// Display name used as the logging key for everything on this network
    pub name: String,
    /// HTTP JSON-RPC endpoint URL
    pub rpc_url: String,
    /// EIP-155 chain id, embedded into every signed transaction
    pub chain_id: u64,
    /// Stablecoin token contract address on this network
    pub token_address: String,
}

/// Cost guard applied to every forwarding attempt.
///
/// Shared as a read-only value by default; individual networks may carry
/// their own override (see `NetworkConfig::gas`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    /// Price ceiling in wei; a prevailing gas price at or above this skips
    /// the forwarding attempt entirely
    pub max_gas_price: U256,
    /// Compute budget handed to every forwarding transaction
    pub gas_limit: u64,
}

impl GasPolicy {
    pub fn new(max_gas_price_wei: u64, gas_limit: u64) -> Self {
        Self {
            max_gas_price: U256::from(max_gas_price_wei),
            gas_limit,
        }
    }

    /// True when `gas_price` is low enough to act on.
    pub fn allows(&self, gas_price: U256) -> bool {
        gas_price < self.max_gas_price
    }
}
