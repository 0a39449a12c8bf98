pub mod deposit;
pub mod network;

pub use deposit::{DepositEvent, ForwardOutcome, ForwardReceipt, ForwardingAttempt, PendingForward};
pub use network::{GasPolicy, NetworkProfile};
