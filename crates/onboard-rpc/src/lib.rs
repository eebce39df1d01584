//! JSON-RPC backed [`ChainDataProvider`](onboard_common::ChainDataProvider).

pub mod config;
pub mod provider;
pub mod transport;

pub use config::{OnboardConfig, RpcConfig};
pub use provider::JsonRpcProvider;
pub use transport::{get_gas_price, rpc_request, RpcContext};
