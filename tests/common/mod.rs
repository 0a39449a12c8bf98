#![allow(dead_code)]

use alloy::primitives::{B256, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use usdc_forwarder::blockchain::{ChainClient, ClientError, DepositStream};
use usdc_forwarder::models::{
    DepositEvent, ForwardReceipt, GasPolicy, NetworkProfile, PendingForward,
};
use usdc_forwarder::monitor::ChainMonitor;

/// Scripted chain client that records every call, shared by the integration
/// tests.
pub struct MockChainClient {
    pub gas_price: Mutex<U256>,
    pub balance: Mutex<U256>,
    pub subscribe_fails: AtomicBool,
    pub submit_fails: AtomicBool,
    pub confirm_fails: AtomicBool,
    pub submissions: Mutex<Vec<Submission>>,
    event_sender: Mutex<Option<mpsc::Sender<DepositEvent>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub amount: U256,
    pub gas_price: U256,
    pub gas_limit: u64,
}

impl MockChainClient {
    pub fn new(gas_price_wei: u64, balance: u64) -> Arc<Self> {
        Arc::new(Self {
            gas_price: Mutex::new(U256::from(gas_price_wei)),
            balance: Mutex::new(U256::from(balance)),
            subscribe_fails: AtomicBool::new(false),
            submit_fails: AtomicBool::new(false),
            confirm_fails: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
            event_sender: Mutex::new(None),
        })
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn set_balance(&self, balance: u64) {
        *self.balance.lock().unwrap() = U256::from(balance);
    }

    /// Push a deposit event into the live subscription.
    pub async fn emit_deposit(&self, amount: u64) {
        let sender = self
            .event_sender
            .lock()
            .unwrap()
            .clone()
            .expect("No live subscription to emit into");
        sender
            .send(DepositEvent {
                sender: alloy::primitives::Address::ZERO,
                amount: U256::from(amount),
                timestamp: 1640995200,
                transaction_hash: B256::ZERO,
            })
            .await
            .expect("Subscription receiver dropped");
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn subscribe_deposits(&self) -> Result<DepositStream, ClientError> {
        if self.subscribe_fails.load(Ordering::Relaxed) {
            return Err(ClientError::Signing("subscription refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(16);
        *self.event_sender.lock().unwrap() = Some(tx);
        Ok(DepositStream::from_channel(rx))
    }

    async fn held_balance(&self) -> Result<U256, ClientError> {
        Ok(*self.balance.lock().unwrap())
    }

    async fn gas_price(&self) -> Result<U256, ClientError> {
        Ok(*self.gas_price.lock().unwrap())
    }

    async fn submit_forward(
        &self,
        amount: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<PendingForward, ClientError> {
        if self.submit_fails.load(Ordering::Relaxed) {
            return Err(ClientError::Signing("submission refused".to_string()));
        }
        self.submissions.lock().unwrap().push(Submission {
            amount,
            gas_price,
            gas_limit,
        });
        Ok(PendingForward {
            transaction_hash: B256::repeat_byte(0xab),
        })
    }

    async fn await_confirmation(
        &self,
        pending: &PendingForward,
    ) -> Result<ForwardReceipt, ClientError> {
        if self.confirm_fails.load(Ordering::Relaxed) {
            return Err(ClientError::ConfirmationTimeout { seconds: 1 });
        }
        Ok(ForwardReceipt {
            transaction_hash: pending.transaction_hash,
            block_number: 4242,
            gas_used: 65_000,
        })
    }
}

pub fn profile(name: &str) -> NetworkProfile {
    NetworkProfile {
        name: name.to_string(),
        rpc_url: "http://localhost:8545".to_string(),
        chain_id: 31337,
        token_address: "0x2222222222222222222222222222222222222222".to_string(),
    }
}

pub fn monitor(name: &str, client: Arc<MockChainClient>, ceiling_wei: u64) -> ChainMonitor {
    ChainMonitor::new(
        profile(name),
        client,
        GasPolicy::new(ceiling_wei, 300_000),
        None,
    )
}
