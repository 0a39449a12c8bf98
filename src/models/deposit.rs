use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// One observed deposit into the custody contract. Transient: it triggers a
/// forwarding attempt and is otherwise only logged, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepositEvent {
    pub sender: Address,
    /// Amount in the token's smallest unit
    pub amount: U256,
    /// On-chain timestamp (seconds) carried by the event
    pub timestamp: u64,
    /// Transaction that emitted the deposit event
    pub transaction_hash: B256,
}

/// Handle for a submitted but not yet confirmed forwarding transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingForward {
    pub transaction_hash: B256,
}

/// Final receipt for a confirmed forwarding transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForwardReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Result of one run of the gate-and-forward procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Gas price was at or above the configured ceiling; nothing submitted
    Skipped { gas_price: U256 },
    /// Custody balance was zero by the time the attempt ran
    NothingToForward,
    /// Transaction submitted and confirmed
    Confirmed(ForwardReceipt),
    /// Submission or confirmation failed; balance stays in the contract
    Failed,
}

/// One forwarding attempt, transient and only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingAttempt {
    pub amount: U256,
    pub outcome: ForwardOutcome,
}

impl ForwardingAttempt {
    pub fn submitted(&self) -> bool {
        matches!(
            self.outcome,
            ForwardOutcome::Confirmed(_) | ForwardOutcome::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deposit_event_serialization() {
        let event = DepositEvent {
            sender: Address::from_str("0xf977814e90da44bfa03b6295a0616a897441acec").unwrap(),
            amount: U256::from(1_000_000u64),
            timestamp: 1640995200,
            transaction_hash: B256::ZERO,
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: DepositEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_attempt_submitted_classification() {
        let skipped = ForwardingAttempt {
            amount: U256::from(500u64),
            outcome: ForwardOutcome::Skipped {
                gas_price: U256::from(60_000_000_000u64),
            },
        };
        assert!(!skipped.submitted());

        let failed = ForwardingAttempt {
            amount: U256::from(500u64),
            outcome: ForwardOutcome::Failed,
        };
        assert!(failed.submitted());

        let confirmed = ForwardingAttempt {
            amount: U256::from(500u64),
            outcome: ForwardOutcome::Confirmed(ForwardReceipt {
                transaction_hash: B256::ZERO,
                block_number: 100,
                gas_used: 65_000,
            }),
        };
        assert!(confirmed.submitted());
    }
}
