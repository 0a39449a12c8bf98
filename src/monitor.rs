use alloy::primitives::U256;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::blockchain::{ChainClient, ClientError, DepositStream};
use crate::logging::LogContext;
use crate::models::{
    ForwardOutcome, ForwardReceipt, ForwardingAttempt, GasPolicy, NetworkProfile, PendingForward,
};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to establish deposit subscription for {network}: {source}")]
    Subscribe {
        network: String,
        #[source]
        source: ClientError,
    },
    #[error("Monitor for {network} cannot start from state {state:?}")]
    InvalidState {
        network: String,
        state: MonitorState,
    },
}

/// Lifecycle of one monitor. `Stopped` is terminal; a stopped monitor is
/// inert and a fresh instance is required to watch the network again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Watches one network's custody contract and forwards detected deposits.
///
/// Owns its chain client and signing path exclusively; the only values shared
/// with other monitors are the read-only gas policy and the supervisor's
/// lifecycle calls.
pub struct ChainMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    profile: NetworkProfile,
    client: Arc<dyn ChainClient>,
    gas_policy: GasPolicy,
    /// Optional periodic reconciliation, retry vector for gas-gated amounts
    /// and missed events
    recheck_interval: Option<Duration>,
    state: StdMutex<MonitorState>,
    /// Serializes overlapping forward attempts for this monitor
    forward_lock: Mutex<()>,
    event_task: StdMutex<Option<JoinHandle<()>>>,
}

impl ChainMonitor {
    pub fn new(
        profile: NetworkProfile,
        client: Arc<dyn ChainClient>,
        gas_policy: GasPolicy,
        recheck_interval: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                profile,
                client,
                gas_policy,
                recheck_interval,
                state: StdMutex::new(MonitorState::Created),
                forward_lock: Mutex::new(()),
                event_task: StdMutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.inner.state()
    }

    /// Establish the deposit subscription and run the startup reconciliation.
    ///
    /// When this returns `Ok`, the subscription is live and the initial
    /// reconciliation has completed (successfully or with a logged failure).
    /// A subscription failure is fatal and left to the caller.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let inner = &self.inner;
        let current = inner.state();
        if current != MonitorState::Created {
            return Err(MonitorError::InvalidState {
                network: inner.profile.name.clone(),
                state: current,
            });
        }
        inner.set_state(MonitorState::Starting);

        LogContext::new(&inner.profile.name, "start").info("Starting monitor");

        let stream = match inner.client.subscribe_deposits().await {
            Ok(stream) => stream,
            Err(e) => {
                inner.set_state(MonitorState::Stopped);
                return Err(MonitorError::Subscribe {
                    network: inner.profile.name.clone(),
                    source: e,
                });
            }
        };

        // Deposits are edge-triggered; recover whatever accumulated while no
        // monitor was watching. Failure here is logged, not fatal.
        inner.reconcile().await;

        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(task_inner.event_loop(stream));
        *inner.event_task.lock().unwrap() = Some(handle);

        inner.set_state(MonitorState::Running);
        LogContext::new(&inner.profile.name, "start")
            .with_outcome("running")
            .info("Monitor started");
        Ok(())
    }

    /// Cancel the deposit subscription. Idempotent; in-flight forwarding
    /// attempts are left to run to completion.
    pub fn stop(&self) {
        let inner = &self.inner;
        if inner.state() == MonitorState::Stopped {
            return;
        }
        inner.set_state(MonitorState::Stopping);

        // Dropping the stream inside the aborted task tears down the
        // subscription poller as well.
        if let Some(handle) = inner.event_task.lock().unwrap().take() {
            handle.abort();
        }

        inner.set_state(MonitorState::Stopped);
        LogContext::new(&inner.profile.name, "stop")
            .with_outcome("stopped")
            .info("Monitor stopped");
    }

    /// Check the custody contract's held balance and forward it if non-zero.
    pub async fn reconcile(&self) {
        self.inner.reconcile().await;
    }

    /// Run the gate-and-forward procedure for `amount`.
    pub async fn forward(&self, amount: U256) -> ForwardingAttempt {
        self.inner.forward(amount).await
    }
}

impl MonitorInner {
    fn state(&self) -> MonitorState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock().unwrap() = state;
    }

    async fn event_loop(self: Arc<Self>, mut stream: DepositStream) {
        let mut ticker = self.recheck_interval.map(interval);
        if let Some(t) = ticker.as_mut() {
            t.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The immediate first tick would duplicate the startup
            // reconciliation
            t.tick().await;
        }

        loop {
            tokio::select! {
                event = stream.next() => match event {
                    Some(event) => {
                        LogContext::new(&self.profile.name, "deposit_detected")
                            .with_amount(&event.amount.to_string())
                            .with_transaction_hash(&format!("{:#x}", event.transaction_hash))
                            .with_metadata(
                                "sender",
                                serde_json::json!(format!("{:#x}", event.sender)),
                            )
                            .info("New deposit detected");

                        // Forward without blocking the subscription; the
                        // spawned attempt also survives stop()
                        let monitor = Arc::clone(&self);
                        tokio::spawn(async move {
                            monitor.forward(event.amount).await;
                        });
                    }
                    None => {
                        LogContext::new(&self.profile.name, "event_loop")
                            .warn("Deposit stream ended");
                        break;
                    }
                },
                _ = async {
                    match ticker.as_mut() {
                        Some(t) => { t.tick().await; }
                        None => std::future::pending().await,
                    }
                } => {
                    self.reconcile().await;
                }
            }
        }
    }

    /// All errors logged and swallowed; a failed reconciliation leaves the
    /// balance for the next trigger.
    async fn reconcile(&self) {
        match self.client.held_balance().await {
            Ok(balance) if balance > U256::ZERO => {
                LogContext::new(&self.profile.name, "reconcile")
                    .with_amount(&balance.to_string())
                    .info("Found pending custody balance");
                self.forward(balance).await;
            }
            Ok(_) => {
                LogContext::new(&self.profile.name, "reconcile")
                    .debug("No pending custody balance");
            }
            Err(e) => {
                LogContext::new(&self.profile.name, "reconcile")
                    .error(&format!("Failed to check pending balance: {}", e));
            }
        }
    }

    /// The gate-and-forward procedure: gas gate, submission, confirmation.
    ///
    /// Attempts are serialized per monitor, and the amount is clamped to the
    /// contract's currently held balance so overlapping triggers cannot
    /// double-spend. Every failure is logged and absorbed; the balance stays
    /// in the contract for a later trigger.
    async fn forward(&self, amount: U256) -> ForwardingAttempt {
        let _guard = self.forward_lock.lock().await;

        let gas_price = match self.client.gas_price().await {
            Ok(price) => price,
            Err(e) => {
                LogContext::new(&self.profile.name, "gas_gate")
                    .with_amount(&amount.to_string())
                    .error(&format!("Failed to query gas price: {}", e));
                return ForwardingAttempt {
                    amount,
                    outcome: ForwardOutcome::Failed,
                };
            }
        };

        if !self.gas_policy.allows(gas_price) {
            LogContext::new(&self.profile.name, "gas_gate")
                .with_amount(&amount.to_string())
                .with_gas_price(&gas_price.to_string())
                .with_outcome("skipped")
                .warn("Gas price at or above ceiling, skipping forward");
            return ForwardingAttempt {
                amount,
                outcome: ForwardOutcome::Skipped { gas_price },
            };
        }

        // The contract balance is the idempotent source of truth: a trigger
        // that lost the race to an earlier forward collapses to a no-op here.
        let amount = match self.client.held_balance().await {
            Ok(balance) if balance.is_zero() => {
                LogContext::new(&self.profile.name, "forward")
                    .with_outcome("nothing_to_forward")
                    .debug("Custody balance already forwarded");
                return ForwardingAttempt {
                    amount,
                    outcome: ForwardOutcome::NothingToForward,
                };
            }
            Ok(balance) => amount.min(balance),
            Err(e) => {
                LogContext::new(&self.profile.name, "forward").warn(&format!(
                    "Balance re-check failed, using requested amount: {}",
                    e
                ));
                amount
            }
        };

        let pending = match self
            .client
            .submit_forward(amount, gas_price, self.gas_policy.gas_limit)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                LogContext::new(&self.profile.name, "forward")
                    .with_amount(&amount.to_string())
                    .with_outcome("failed")
                    .error(&format!("Failed to submit forwarding transaction: {}", e));
                return ForwardingAttempt {
                    amount,
                    outcome: ForwardOutcome::Failed,
                };
            }
        };

        LogContext::new(&self.profile.name, "forward")
            .with_amount(&amount.to_string())
            .with_transaction_hash(&format!("{:#x}", pending.transaction_hash))
            .info("Forwarding transaction sent");

        match self.confirm(&pending).await {
            Ok(receipt) => {
                LogContext::new(&self.profile.name, "forward")
                    .with_amount(&amount.to_string())
                    .with_transaction_hash(&format!("{:#x}", receipt.transaction_hash))
                    .with_block_number(receipt.block_number)
                    .with_metadata("gas_used", serde_json::json!(receipt.gas_used))
                    .with_outcome("confirmed")
                    .info("Forwarding completed");
                ForwardingAttempt {
                    amount,
                    outcome: ForwardOutcome::Confirmed(receipt),
                }
            }
            Err(e) => {
                LogContext::new(&self.profile.name, "forward")
                    .with_amount(&amount.to_string())
                    .with_transaction_hash(&format!("{:#x}", pending.transaction_hash))
                    .with_outcome("failed")
                    .error(&format!("Forwarding confirmation failed: {}", e));
                ForwardingAttempt {
                    amount,
                    outcome: ForwardOutcome::Failed,
                }
            }
        }
    }

    async fn confirm(&self, pending: &PendingForward) -> Result<ForwardReceipt, ClientError> {
        self.client.await_confirmation(pending).await
    }
}
