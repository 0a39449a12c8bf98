use alloy::primitives::{B256, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Filter passed to `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFilter {
    #[serde(rename = "fromBlock")]
    pub from_block: String,
    #[serde(rename = "toBlock")]
    pub to_block: String,
    pub address: Option<String>,
    pub topics: Option<Vec<Option<String>>>,
}

/// Raw log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EthLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
}

/// Transaction receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "gasUsed")]
    pub gas_used: String,
    /// "0x1" for success, "0x0" for revert
    pub status: String,
}

#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_seconds))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint,
        }
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let rpc_response: JsonRpcResponse = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("No result in response".to_string()))
    }

    pub async fn get_latest_block_number(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;
        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Block number is not a string".to_string()))?;
        parse_hex_to_u64(hex_string)
    }

    pub async fn get_logs(&self, filter: LogFilter) -> Result<Vec<EthLog>, RpcError> {
        let params = vec![serde_json::to_value(filter)?];
        let result = self.make_request("eth_getLogs", params).await?;
        let logs: Vec<EthLog> = serde_json::from_value(result)?;
        Ok(logs)
    }

    /// `eth_call` against the latest block; returns the raw hex return data.
    pub async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        let params = vec![
            serde_json::json!({ "to": to, "data": data }),
            Value::String("latest".to_string()),
        ];
        let result = self.make_request("eth_call", params).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RpcError::InvalidResponse("Call result is not a string".to_string()))
    }

    pub async fn gas_price(&self) -> Result<U256, RpcError> {
        let result = self.make_request("eth_gasPrice", vec![]).await?;
        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Gas price is not a string".to_string()))?;
        parse_hex_to_u256(hex_string)
    }

    /// Pending-state transaction count, used as the next nonce.
    pub async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError> {
        let params = vec![
            Value::String(address.to_string()),
            Value::String("pending".to_string()),
        ];
        let result = self.make_request("eth_getTransactionCount", params).await?;
        let hex_string = result.as_str().ok_or_else(|| {
            RpcError::InvalidResponse("Transaction count is not a string".to_string())
        })?;
        parse_hex_to_u64(hex_string)
    }

    /// Submit a signed raw transaction; returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw_tx_hex: &str) -> Result<B256, RpcError> {
        let params = vec![Value::String(raw_tx_hex.to_string())];
        let result = self.make_request("eth_sendRawTransaction", params).await?;
        let hex_string = result.as_str().ok_or_else(|| {
            RpcError::InvalidResponse("Transaction hash is not a string".to_string())
        })?;
        B256::from_str(hex_string)
            .map_err(|e| RpcError::InvalidResponse(format!("Invalid transaction hash: {}", e)))
    }

    /// Returns `None` while the transaction is not yet included in a block.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let params = vec![Value::String(format!("{:#x}", tx_hash))];
        let result = self
            .make_request("eth_getTransactionReceipt", params)
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: TransactionReceipt = serde_json::from_value(result)?;
        Ok(Some(receipt))
    }
}

pub fn parse_hex_to_u64(hex_str: &str) -> Result<u64, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse hex to u64: {}", e)))
}

pub fn parse_hex_to_u256(hex_str: &str) -> Result<U256, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    U256::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse hex to u256: {}", e)))
}
