use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::blockchain::client::{ChainClient, ClientError, DepositStream};
use crate::blockchain::contract;
use crate::blockchain::rpc_client::{parse_hex_to_u64, LogFilter, RpcClient};
use crate::logging::LogContext;
use crate::models::{ForwardReceipt, NetworkProfile, PendingForward};

/// Poll cadences and the confirmation deadline for one client.
#[derive(Debug, Clone, Copy)]
pub struct ClientTiming {
    pub poll_interval: Duration,
    pub confirmation_poll: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for ClientTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            confirmation_poll: Duration::from_secs(3),
            confirmation_timeout: Duration::from_secs(300),
        }
    }
}

/// JSON-RPC implementation of `ChainClient` for one EVM network.
///
/// Deposit "subscription" is a log-poll task over `eth_getLogs`; the write
/// path signs legacy transactions locally and submits them raw.
pub struct EvmChainClient {
    profile: NetworkProfile,
    rpc: RpcClient,
    custody_address: Address,
    signer: PrivateKeySigner,
    timing: ClientTiming,
}

impl EvmChainClient {
    pub fn new(
        profile: NetworkProfile,
        custody_address: Address,
        signer: PrivateKeySigner,
        rpc_timeout_seconds: u64,
        timing: ClientTiming,
    ) -> Self {
        let rpc = RpcClient::new(profile.rpc_url.clone(), rpc_timeout_seconds);
        Self {
            profile,
            rpc,
            custody_address,
            signer,
            timing,
        }
    }

    fn custody_hex(&self) -> String {
        format!("{:#x}", self.custody_address)
    }

    /// Build and sign a forwarding transaction, returning its raw 0x hex.
    fn sign_forward_tx(
        &self,
        nonce: u64,
        amount: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<String, ClientError> {
        let gas_price: u128 = gas_price
            .try_into()
            .map_err(|_| ClientError::Signing("Gas price exceeds u128".to_string()))?;

        let mut tx = TxLegacy {
            chain_id: Some(self.profile.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(self.custody_address),
            value: U256::ZERO,
            input: Bytes::from(contract::forward_calldata(amount)),
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| ClientError::Signing(e.to_string()))?;
        let signed = tx.into_signed(signature);

        Ok(format!("0x{}", hex::encode(signed.encoded_2718())))
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn subscribe_deposits(&self) -> Result<DepositStream, ClientError> {
        // The initial head fetch doubles as the connectivity check; failing
        // here fails monitor startup.
        let mut cursor = self.rpc.get_latest_block_number().await?;

        let (tx, rx) = mpsc::channel(64);
        let rpc = self.rpc.clone();
        let network = self.profile.name.clone();
        let custody = self.custody_hex();
        let poll_interval = self.timing.poll_interval;

        let producer = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let latest = match rpc.get_latest_block_number().await {
                    Ok(latest) => latest,
                    Err(e) => {
                        LogContext::new(&network, "poll_deposits")
                            .warn(&format!("Failed to fetch chain head: {}", e));
                        continue;
                    }
                };
                if latest <= cursor {
                    continue;
                }

                let filter = LogFilter {
                    from_block: format!("0x{:x}", cursor + 1),
                    to_block: format!("0x{:x}", latest),
                    address: Some(custody.clone()),
                    topics: Some(vec![Some(contract::deposit_event_topic())]),
                };

                // On failure the cursor stays put, so the same range is
                // re-scanned next tick and no event is lost.
                let logs = match rpc.get_logs(filter).await {
                    Ok(logs) => logs,
                    Err(e) => {
                        LogContext::new(&network, "poll_deposits")
                            .with_block_number(latest)
                            .warn(&format!("Failed to fetch deposit logs: {}", e));
                        continue;
                    }
                };

                for log in logs {
                    match contract::decode_deposit_log(&log) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                // Subscription cancelled
                                return;
                            }
                        }
                        Err(e) => {
                            LogContext::new(&network, "poll_deposits")
                                .error(&format!("Undecodable deposit log: {}", e));
                        }
                    }
                }

                cursor = latest;
            }
        });

        Ok(DepositStream::new(rx, producer))
    }

    async fn held_balance(&self) -> Result<U256, ClientError> {
        let return_data = self
            .rpc
            .call(&self.custody_hex(), &contract::encode_balance_call())
            .await?;
        Ok(contract::decode_balance(&return_data)?)
    }

    async fn gas_price(&self) -> Result<U256, ClientError> {
        Ok(self.rpc.gas_price().await?)
    }

    async fn submit_forward(
        &self,
        amount: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<PendingForward, ClientError> {
        let sender = format!("{:#x}", self.signer.address());
        let nonce = self.rpc.get_transaction_count(&sender).await?;

        let raw_tx = self.sign_forward_tx(nonce, amount, gas_price, gas_limit)?;
        let transaction_hash = self.rpc.send_raw_transaction(&raw_tx).await?;

        Ok(PendingForward { transaction_hash })
    }

    async fn await_confirmation(
        &self,
        pending: &PendingForward,
    ) -> Result<ForwardReceipt, ClientError> {
        let deadline = Instant::now() + self.timing.confirmation_timeout;

        loop {
            if let Some(receipt) = self
                .rpc
                .get_transaction_receipt(pending.transaction_hash)
                .await?
            {
                if receipt.status != "0x1" {
                    return Err(ClientError::TransactionReverted {
                        tx_hash: receipt.transaction_hash,
                    });
                }
                return Ok(ForwardReceipt {
                    transaction_hash: pending.transaction_hash,
                    block_number: parse_hex_to_u64(&receipt.block_number)?,
                    gas_used: parse_hex_to_u64(&receipt.gas_used)?,
                });
            }

            if Instant::now() >= deadline {
                return Err(ClientError::ConfirmationTimeout {
                    seconds: self.timing.confirmation_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.timing.confirmation_poll).await;
        }
    }
}
