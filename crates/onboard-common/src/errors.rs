use error_stack::Report;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::{TransactionRequest, TxType};

pub type PopulateResult<T> = Result<T, Report<PopulateError>>;
pub type ProviderResult<T> = Result<T, Report<ProviderError>>;

/// Failure classes a chain data provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownError,
    ServerError,
    Timeout,
    NetworkError,
    /// The node simulated the transaction and it reverted
    CallException,
    InsufficientFunds,
    /// The nonce has already been used
    NonceExpired,
    ReplacementUnderpriced,
    UnpredictableGasLimit,
}

impl ErrorCode {
    /// Transport level failures that are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::Timeout | ErrorCode::NetworkError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::CallException => "CALL_EXCEPTION",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::NonceExpired => "NONCE_EXPIRED",
            ErrorCode::ReplacementUnderpriced => "REPLACEMENT_UNDERPRICED",
            ErrorCode::UnpredictableGasLimit => "UNPREDICTABLE_GAS_LIMIT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a [`crate::provider::ChainDataProvider`] lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: ErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Errors returned by transaction population
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    /// The caller mixed legacy and fee-market fields, or picked a type that
    /// cannot carry the fields it supplied
    #[error("incompatible fee fields: {0}")]
    IncompatibleFeeFields(String),

    #[error("network does not support EIP-1559")]
    UnsupportedFeeMarket,

    #[error("failed to get consistent fee data")]
    InconsistentFeeData,

    #[error("cannot estimate gas; transaction may fail or may require manual gas limit")]
    GasEstimationFailed,

    #[error("chain id mismatch: transaction uses {requested} but the network reports {network}")]
    ChainIdMismatch { requested: u64, network: u64 },

    /// A provider lookup failed; the provider's error is kept as is
    #[error("provider lookup failed: {0}")]
    Provider(ProviderError),
}

impl PopulateError {
    pub(crate) fn legacy_with_fee_market() -> Self {
        PopulateError::IncompatibleFeeFields(
            "eip-1559 transactions do not support gasPrice".to_string(),
        )
    }

    pub(crate) fn fee_market_on_legacy_type() -> Self {
        PopulateError::IncompatibleFeeFields(
            "pre-eip-1559 transactions do not support maxFeePerGas/maxPriorityFeePerGas"
                .to_string(),
        )
    }
}

/// Snapshot of the draft being populated, attached to every populate error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionContext {
    pub tx_type: Option<TxType>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub nonce: Option<u64>,
    pub gas_limit: Option<u64>,
    pub chain_id: Option<u64>,
}

impl From<&TransactionRequest> for TransactionContext {
    fn from(request: &TransactionRequest) -> Self {
        Self {
            tx_type: request.tx_type,
            gas_price: request.gas_price,
            max_fee_per_gas: request.max_fee_per_gas,
            max_priority_fee_per_gas: request.max_priority_fee_per_gas,
            nonce: request.nonce,
            gas_limit: request.gas_limit,
            chain_id: request.chain_id,
        }
    }
}

impl fmt::Display for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tx_type {
            Some(tx_type) => write!(f, "Transaction type {}", tx_type)?,
            None => write!(f, "Transaction type unspecified")?,
        }
        if let Some(gas_price) = self.gas_price {
            write!(f, " gasPrice: {}", gas_price)?;
        }
        if let Some(max_fee) = self.max_fee_per_gas {
            write!(f, " maxFeePerGas: {}", max_fee)?;
        }
        if let Some(max_priority) = self.max_priority_fee_per_gas {
            write!(f, " maxPriorityFeePerGas: {}", max_priority)?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, " nonce: {}", nonce)?;
        }
        if let Some(gas) = self.gas_limit {
            write!(f, " gas: {}", gas)?;
        }
        if let Some(chain_id) = self.chain_id {
            write!(f, " chainId: {}", chain_id)?;
        }
        Ok(())
    }
}

/// Helpers for enriching populate errors
pub trait PopulateErrorExt {
    /// Attach a summary of the draft transaction
    fn with_transaction_context(self, request: &TransactionRequest) -> Self;
}

impl<T> PopulateErrorExt for PopulateResult<T> {
    fn with_transaction_context(self, request: &TransactionRequest) -> Self {
        self.map_err(|e| e.attach(TransactionContext::from(request)))
    }
}

/// Converts a failed provider lookup into a populate error, keeping the
/// provider's report as the cause.
pub(crate) fn provider_failure(report: Report<ProviderError>) -> Report<PopulateError> {
    let cause = report.current_context().clone();
    report.change_context(PopulateError::Provider(cause))
}
