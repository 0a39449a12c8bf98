mod common;

use std::time::Duration;

use alloy::primitives::U256;
use common::{monitor, profile, MockChainClient};
use usdc_forwarder::models::{ForwardOutcome, GasPolicy};
use usdc_forwarder::monitor::{ChainMonitor, MonitorState};

const CEILING_WEI: u64 = 50_000_000_000;

/// Fee rate one below the ceiling: the deposit is forwarded once with the
/// event amount and the configured gas limit, and confirmed.
#[tokio::test]
async fn deposit_below_ceiling_forwards_once() {
    let client = MockChainClient::new(CEILING_WEI - 1, 1000);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);

    mon.start().await.unwrap();
    // Startup reconciliation already forwarded the pending 1000
    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].amount, U256::from(1000u64));
    assert_eq!(submissions[0].gas_limit, 300_000);

    mon.stop();
}

/// Fee rate one above the ceiling: zero submissions, attempt reported as
/// skipped.
#[tokio::test]
async fn deposit_above_ceiling_is_skipped() {
    let client = MockChainClient::new(CEILING_WEI + 1, 500);
    let mon = monitor("network-b", client.clone(), CEILING_WEI);

    let attempt = mon.forward(U256::from(500u64)).await;

    assert!(client.submissions().is_empty());
    assert!(matches!(attempt.outcome, ForwardOutcome::Skipped { .. }));
}

/// Startup with a leftover balance of 250 and no live event: reconciliation
/// forwards exactly that amount.
#[tokio::test]
async fn startup_reconciliation_recovers_pending_balance() {
    let client = MockChainClient::new(1, 250);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);

    mon.start().await.unwrap();

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].amount, U256::from(250u64));

    mon.stop();
}

/// Startup with an empty contract: no forwarding attempt at all.
#[tokio::test]
async fn startup_reconciliation_skips_empty_contract() {
    let client = MockChainClient::new(1, 0);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);

    mon.start().await.unwrap();
    assert!(client.submissions().is_empty());

    mon.stop();
}

/// A confirmation error is logged and absorbed; the monitor keeps processing
/// the next incoming event normally.
#[tokio::test]
async fn confirmation_error_does_not_stall_monitor() {
    let client = MockChainClient::new(1, 0);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);
    mon.start().await.unwrap();

    client
        .confirm_fails
        .store(true, std::sync::atomic::Ordering::Relaxed);
    client.set_balance(400);
    client.emit_deposit(400).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.submissions().len(), 1);
    assert_eq!(mon.state(), MonitorState::Running);

    client
        .confirm_fails
        .store(false, std::sync::atomic::Ordering::Relaxed);
    client.set_balance(600);
    client.emit_deposit(600).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[1].amount, U256::from(600u64));

    mon.stop();
}

/// A submission error leaves the balance in the contract and the monitor
/// running.
#[tokio::test]
async fn submission_error_is_non_fatal() {
    let client = MockChainClient::new(1, 0);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);
    mon.start().await.unwrap();

    client
        .submit_fails
        .store(true, std::sync::atomic::Ordering::Relaxed);
    client.set_balance(100);
    client.emit_deposit(100).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(client.submissions().is_empty());
    assert_eq!(mon.state(), MonitorState::Running);

    mon.stop();
}

/// Overlapping triggers for the same funds collapse onto the contract's held
/// balance: the second attempt sees a drained contract and submits nothing.
#[tokio::test]
async fn overlapping_triggers_do_not_double_spend() {
    let client = MockChainClient::new(1, 700);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);

    let first = mon.forward(U256::from(700u64)).await;
    assert!(matches!(first.outcome, ForwardOutcome::Confirmed(_)));

    // The chain drained the contract when the first forward confirmed
    client.set_balance(0);
    let second = mon.forward(U256::from(700u64)).await;

    assert_eq!(second.outcome, ForwardOutcome::NothingToForward);
    assert_eq!(client.submissions().len(), 1);
}

/// With the periodic re-check enabled, a balance left behind by a gas-gated
/// startup is forwarded by a later tick once the price drops, without any new
/// deposit event arriving.
#[tokio::test]
async fn recheck_forwards_gated_balance_after_price_drop() {
    let client = MockChainClient::new(CEILING_WEI + 1, 500);
    let mon = ChainMonitor::new(
        profile("network-a"),
        client.clone(),
        GasPolicy::new(CEILING_WEI, 300_000),
        Some(Duration::from_millis(100)),
    );

    mon.start().await.unwrap();
    // Startup reconciliation found the balance but hit the gas gate
    assert!(client.submissions().is_empty());

    *client.gas_price.lock().unwrap() = U256::from(1u64);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while client.submissions().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let submissions = client.submissions();
    assert!(!submissions.is_empty());
    assert_eq!(submissions[0].amount, U256::from(500u64));

    mon.stop();
}

/// stop() twice, and before start(), with no errors or duplicate teardown.
#[tokio::test]
async fn stop_is_idempotent() {
    let client = MockChainClient::new(1, 0);
    let mon = monitor("network-a", client.clone(), CEILING_WEI);

    mon.stop();
    mon.stop();
    assert_eq!(mon.state(), MonitorState::Stopped);

    let client = MockChainClient::new(1, 0);
    let mon = monitor("network-a", client, CEILING_WEI);
    mon.start().await.unwrap();
    mon.stop();
    mon.stop();
    assert_eq!(mon.state(), MonitorState::Stopped);
}
