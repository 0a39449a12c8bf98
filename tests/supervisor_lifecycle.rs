mod common;

use std::sync::atomic::Ordering;

use common::{monitor, MockChainClient};
use usdc_forwarder::monitor::MonitorState;
use usdc_forwarder::supervisor::MonitorSupervisor;

const CEILING_WEI: u64 = 50_000_000_000;

#[tokio::test]
async fn all_monitors_start_or_startup_aborts() {
    // Happy path: every monitor running
    let supervisor = MonitorSupervisor::new(vec![
        monitor("network-a", MockChainClient::new(1, 0), CEILING_WEI),
        monitor("network-b", MockChainClient::new(1, 0), CEILING_WEI),
        monitor("network-c", MockChainClient::new(1, 0), CEILING_WEI),
    ]);
    supervisor.start().await.unwrap();
    for mon in supervisor.monitors() {
        assert_eq!(mon.state(), MonitorState::Running);
    }
    supervisor.stop();

    // One broken network: startup aborts at it and later monitors are never
    // attempted
    let broken = MockChainClient::new(1, 0);
    broken.subscribe_fails.store(true, Ordering::Relaxed);
    let supervisor = MonitorSupervisor::new(vec![
        monitor("network-a", MockChainClient::new(1, 0), CEILING_WEI),
        monitor("network-b", broken, CEILING_WEI),
        monitor("network-c", MockChainClient::new(1, 0), CEILING_WEI),
    ]);

    assert!(supervisor.start().await.is_err());
    assert_eq!(supervisor.monitors()[0].state(), MonitorState::Running);
    assert_eq!(supervisor.monitors()[1].state(), MonitorState::Stopped);
    assert_eq!(supervisor.monitors()[2].state(), MonitorState::Created);
    supervisor.stop();
}

#[tokio::test]
async fn stop_reaches_every_monitor() {
    let supervisor = MonitorSupervisor::new(vec![
        monitor("network-a", MockChainClient::new(1, 0), CEILING_WEI),
        monitor("network-b", MockChainClient::new(1, 0), CEILING_WEI),
    ]);
    supervisor.start().await.unwrap();

    supervisor.stop();
    for mon in supervisor.monitors() {
        assert_eq!(mon.state(), MonitorState::Stopped);
    }

    // Repeat stop is harmless
    supervisor.stop();
}

#[tokio::test]
async fn monitors_on_different_networks_are_isolated() {
    let client_a = MockChainClient::new(1, 300);
    let client_b = MockChainClient::new(CEILING_WEI + 1, 500);
    let supervisor = MonitorSupervisor::new(vec![
        monitor("network-a", client_a.clone(), CEILING_WEI),
        monitor("network-b", client_b.clone(), CEILING_WEI),
    ]);
    supervisor.start().await.unwrap();

    // A forwarded its reconciled balance; B was gas-gated and submitted
    // nothing
    assert_eq!(client_a.submissions().len(), 1);
    assert!(client_b.submissions().is_empty());

    supervisor.stop();
}
