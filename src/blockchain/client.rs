use alloy::primitives::U256;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::blockchain::contract::ContractError;
use crate::blockchain::rpc_client::RpcError;
use crate::models::{DepositEvent, ForwardReceipt, PendingForward};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Contract codec error: {0}")]
    Contract(#[from] ContractError),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },
    #[error("Confirmation not received within {seconds} seconds")]
    ConfirmationTimeout { seconds: u64 },
}

/// Lazy, infinite, cancellable sequence of deposit events for one network.
///
/// Backed by a channel fed from a background task. Dropping the stream (or
/// calling `cancel`) tears the producer down; it never cancels forwarding
/// work that events already triggered.
pub struct DepositStream {
    receiver: mpsc::Receiver<DepositEvent>,
    producer: Option<JoinHandle<()>>,
}

impl DepositStream {
    pub fn new(receiver: mpsc::Receiver<DepositEvent>, producer: JoinHandle<()>) -> Self {
        Self {
            receiver,
            producer: Some(producer),
        }
    }

    /// Stream without a producer task, for feeding events by hand in tests.
    pub fn from_channel(receiver: mpsc::Receiver<DepositEvent>) -> Self {
        Self {
            receiver,
            producer: None,
        }
    }

    /// Next event, or `None` once the producer is gone and drained.
    pub async fn next(&mut self) -> Option<DepositEvent> {
        self.receiver.recv().await
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
    }
}

impl Drop for DepositStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Access to one blockchain network, as consumed by `ChainMonitor`.
///
/// One implementation per transport; the concrete `EvmChainClient` talks
/// JSON-RPC, test doubles script responses.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Open the deposit event subscription. Errors here are fatal to monitor
    /// startup; errors after establishment are the producer's to log and
    /// absorb.
    async fn subscribe_deposits(&self) -> Result<DepositStream, ClientError>;

    /// Balance currently held by the custody contract, in smallest units.
    async fn held_balance(&self) -> Result<U256, ClientError>;

    /// Prevailing network gas price in wei.
    async fn gas_price(&self) -> Result<U256, ClientError>;

    /// Sign and submit a forwarding transaction. Exactly one submission per
    /// call: implementations must not retry internally.
    async fn submit_forward(
        &self,
        amount: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<PendingForward, ClientError>;

    /// Wait for the submitted transaction to be included and succeed.
    async fn await_confirmation(
        &self,
        pending: &PendingForward,
    ) -> Result<ForwardReceipt, ClientError>;
}
