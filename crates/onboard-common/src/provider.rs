use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::errors::ProviderResult;
use crate::types::{BlockTag, FeeData, TransactionRequest};

/// Chain data lookups needed to populate a transaction.
///
/// Implementations are shared between concurrent populate calls, so they must
/// be reentrant. Retries and timeouts are the implementation's business.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    async fn get_fee_data(&self) -> ProviderResult<FeeData>;

    async fn get_gas_price(&self) -> ProviderResult<u128>;

    /// Transaction count of the account this provider acts for
    async fn get_transaction_count(&self, block: BlockTag) -> ProviderResult<u64>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> ProviderResult<u64>;

    async fn get_chain_id(&self) -> ProviderResult<u64>;
}
