pub mod client;
pub mod contract;
pub mod evm_client;
pub mod rpc_client;

pub use client::{ChainClient, ClientError, DepositStream};
pub use contract::ContractError;
pub use evm_client::{ClientTiming, EvmChainClient};
pub use rpc_client::{EthLog, LogFilter, RpcClient, RpcError, TransactionReceipt};
