pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod supervisor;

pub use blockchain::{ChainClient, ClientError, ClientTiming, DepositStream, EvmChainClient};
pub use config::AppConfig;
pub use error::{ConfigError, ForwarderError};
pub use logging::LogContext;
pub use models::{DepositEvent, ForwardOutcome, ForwardingAttempt, GasPolicy, NetworkProfile};
pub use monitor::{ChainMonitor, MonitorError, MonitorState};
pub use supervisor::MonitorSupervisor;
