use alloy::primitives::{keccak256, Address, B256, U256};
use once_cell::sync::Lazy;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::rpc_client::EthLog;
use crate::models::DepositEvent;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Invalid log format: {0}")]
    InvalidLog(String),
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),
    #[error("Hex decoding error: {0}")]
    HexDecoding(String),
}

/// Deposit event emitted by the custody contract:
/// `USDCDeposited(address indexed sender, uint256 amount, uint256 timestamp)`
pub const DEPOSIT_EVENT_SIGNATURE: &str = "USDCDeposited(address,uint256,uint256)";

/// `forwardUSDC(uint256 amount)` on the custody contract
pub const FORWARD_FUNCTION_SIGNATURE: &str = "forwardUSDC(uint256)";

/// `getBalance() returns (uint256)` on the custody contract
pub const BALANCE_FUNCTION_SIGNATURE: &str = "getBalance()";

static DEPOSIT_EVENT_TOPIC: Lazy<B256> = Lazy::new(|| keccak256(DEPOSIT_EVENT_SIGNATURE));

/// Topic-0 filter value for the deposit event, 0x-prefixed.
pub fn deposit_event_topic() -> String {
    format!("{:#x}", *DEPOSIT_EVENT_TOPIC)
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Raw calldata bytes for `forwardUSDC(amount)`.
pub fn forward_calldata(amount: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector(FORWARD_FUNCTION_SIGNATURE));
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data
}

/// Calldata for `getBalance()`, 0x-prefixed.
pub fn encode_balance_call() -> String {
    format!("0x{}", hex::encode(selector(BALANCE_FUNCTION_SIGNATURE)))
}

/// Decode the return data of `getBalance()`.
pub fn decode_balance(return_data: &str) -> Result<U256, ContractError> {
    let stripped = return_data.strip_prefix("0x").unwrap_or(return_data);
    if stripped.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(stripped, 16)
        .map_err(|e| ContractError::HexDecoding(format!("Invalid balance data: {}", e)))
}

/// Check whether a raw log is a deposit event from the custody contract.
pub fn is_deposit_log(log: &EthLog) -> bool {
    match log.topics.first() {
        Some(topic) => topic.eq_ignore_ascii_case(&deposit_event_topic()),
        None => false,
    }
}

/// Decode a deposit event log into a `DepositEvent`.
///
/// The deposit event has two topics (signature, indexed sender) and packs
/// `amount` and `timestamp` as two 32-byte words in the data field.
pub fn decode_deposit_log(log: &EthLog) -> Result<DepositEvent, ContractError> {
    if !is_deposit_log(log) {
        return Err(ContractError::InvalidLog(
            "Log is not a custody deposit event".to_string(),
        ));
    }

    if log.topics.len() != 2 {
        return Err(ContractError::InvalidLog(format!(
            "Expected 2 topics, got {}",
            log.topics.len()
        )));
    }

    let sender = extract_address_from_topic(&log.topics[1])?;

    let data = log.data.strip_prefix("0x").unwrap_or(&log.data);
    let bytes = hex::decode(data)
        .map_err(|e| ContractError::HexDecoding(format!("Invalid log data: {}", e)))?;
    if bytes.len() < 64 {
        return Err(ContractError::InvalidLog(format!(
            "Expected at least 64 data bytes, got {}",
            bytes.len()
        )));
    }

    let amount = U256::from_be_slice(&bytes[0..32]);
    let timestamp_word = U256::from_be_slice(&bytes[32..64]);
    let timestamp: u64 = timestamp_word
        .try_into()
        .map_err(|_| ContractError::InvalidLog("Timestamp does not fit in u64".to_string()))?;

    let transaction_hash = B256::from_str(&log.transaction_hash).map_err(|e| {
        ContractError::InvalidLog(format!("Invalid transaction hash in log: {}", e))
    })?;

    Ok(DepositEvent {
        sender,
        amount,
        timestamp,
        transaction_hash,
    })
}

/// Addresses arrive in event topics left-padded to 32 bytes.
fn extract_address_from_topic(topic: &str) -> Result<Address, ContractError> {
    let stripped = topic.strip_prefix("0x").unwrap_or(topic);
    let bytes = hex::decode(stripped)
        .map_err(|e| ContractError::HexDecoding(format!("Invalid topic: {}", e)))?;
    if bytes.len() != 32 {
        return Err(ContractError::InvalidAddress(format!(
            "Expected 32-byte topic, got {} bytes",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes[12..]))
}
