//! Shared primitives for the onboard wallet connectors.
//!
//! The interesting part is [`populate::populate_transaction`], which decides
//! the type and fee fields of a partially specified transaction and fills in
//! its nonce, gas limit and chain id from a [`provider::ChainDataProvider`].

pub mod config;
pub mod constants;
pub mod errors;
pub mod hdwallets;
pub mod populate;
pub mod provider;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::PopulateConfig;
pub use errors::{ErrorCode, PopulateError, PopulateResult, ProviderError, ProviderResult};
pub use populate::populate_transaction;
pub use provider::ChainDataProvider;
pub use types::{BlockTag, FeeData, FeeScheme, TransactionRequest, TxType};
