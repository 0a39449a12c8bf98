use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

/// Initialize the process-wide logger.
///
/// `json` suppresses env_logger's own prefix so each `LogContext` record is
/// the entire line; `pretty` keeps the default human-readable prefix.
/// Repeated calls are no-ops.
pub fn init_logger(level: &str, format: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    if format == "json" {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    let _ = builder.try_init();
}

/// Structured logging context for the forwarder.
///
/// Every record carries the network name and the operation being performed,
/// so per-network activity can be filtered out of a single shared log stream.
pub struct LogContext {
    pub network: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(network: &str, operation: &str) -> Self {
        Self {
            network: network.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_amount(self, amount: &str) -> Self {
        self.with_metadata("amount", json!(amount))
    }

    pub fn with_transaction_hash(self, tx_hash: &str) -> Self {
        self.with_metadata("transaction_hash", json!(tx_hash))
    }

    pub fn with_gas_price(self, gas_price: &str) -> Self {
        self.with_metadata("gas_price_wei", json!(gas_price))
    }

    pub fn with_block_number(self, block_number: u64) -> Self {
        self.with_metadata("block_number", json!(block_number))
    }

    pub fn with_outcome(self, outcome: &str) -> Self {
        self.with_metadata("outcome", json!(outcome))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "network": self.network,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }
}
