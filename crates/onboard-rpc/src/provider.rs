use std::future::Future;

use alloy_primitives::Address;
use async_trait::async_trait;
use error_stack::{Report, ResultExt};
use log::warn;
use onboard_common::config::{ConfigError, ConfigResult};
use onboard_common::constants::DEFAULT_MAX_PRIORITY_FEE_PER_GAS;
use onboard_common::{
    BlockTag, ChainDataProvider, ErrorCode, FeeData, ProviderError, ProviderResult,
    TransactionRequest,
};
use serde_derive::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::RpcConfig;
use crate::transport::{decode_u128, decode_u64, rpc_request};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlock {
    #[serde(default, with = "alloy_serde::quantity::opt")]
    base_fee_per_gas: Option<u128>,
}

/// Fee data the way wallets derive it from the latest block: a fixed tip on
/// top of twice the current base fee.
pub fn fee_data_from_block(base_fee_per_gas: Option<u128>, gas_price: Option<u128>) -> FeeData {
    match base_fee_per_gas {
        Some(base_fee) => FeeData {
            gas_price,
            max_fee_per_gas: Some(
                base_fee.saturating_mul(2).saturating_add(DEFAULT_MAX_PRIORITY_FEE_PER_GAS),
            ),
            max_priority_fee_per_gas: Some(DEFAULT_MAX_PRIORITY_FEE_PER_GAS),
        },
        None => FeeData { gas_price, max_fee_per_gas: None, max_priority_fee_per_gas: None },
    }
}

/// Chain data provider backed by a JSON-RPC node, acting for `account`
#[derive(Clone, Debug)]
pub struct JsonRpcProvider {
    pub url: Url,
    pub account: Address,
    client: reqwest::Client,
    config: RpcConfig,
}

impl JsonRpcProvider {
    pub fn new(config: RpcConfig, account: Address) -> ConfigResult<Self> {
        let url = config.parsed_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                Report::new(ConfigError::InvalidValue {
                    field: "request_timeout_secs".to_string(),
                    value: e.to_string(),
                })
            })?;
        Ok(Self { url, account, client, config })
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        retry_async(&self.config, method, || rpc_request(&self.client, &self.url, method, params.clone()))
            .await
    }

    async fn get_latest_block(&self) -> ProviderResult<LatestBlock> {
        let block = self.request("eth_getBlockByNumber", json!(["latest", false])).await?;
        serde_json::from_value(block).map_err(|e| {
            Report::new(ProviderError::new(ErrorCode::ServerError, "invalid block"))
                .attach_printable(e.to_string())
        })
    }
}

#[async_trait]
impl ChainDataProvider for JsonRpcProvider {
    async fn get_fee_data(&self) -> ProviderResult<FeeData> {
        let (block, gas_price) = futures::join!(self.get_latest_block(), self.get_gas_price());
        let block = block.attach_printable("Fetching latest block for fee data")?;

        let gas_price = match gas_price {
            Ok(gas_price) => Some(gas_price),
            Err(e) => {
                warn!("eth_gasPrice failed while assembling fee data: {}", e.current_context());
                None
            }
        };

        Ok(fee_data_from_block(block.base_fee_per_gas, gas_price))
    }

    async fn get_gas_price(&self) -> ProviderResult<u128> {
        let result = self.request("eth_gasPrice", json!([])).await?;
        decode_u128(result)
    }

    async fn get_transaction_count(&self, block: BlockTag) -> ProviderResult<u64> {
        let result = self
            .request("eth_getTransactionCount", json!([self.account, block.as_str()]))
            .await
            .attach_printable(format!("Getting nonce for address {}", self.account))?;
        decode_u64(result)
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> ProviderResult<u64> {
        let mut request = request.clone();
        request.from.get_or_insert(self.account);
        let params = serde_json::to_value(&request).map_err(|e| {
            Report::new(ProviderError::new(ErrorCode::UnknownError, "unserializable transaction"))
                .attach_printable(e.to_string())
        })?;
        let result = self
            .request("eth_estimateGas", json!([params]))
            .await
            .attach_printable("Estimating gas for transaction")?;
        decode_u64(result)
    }

    async fn get_chain_id(&self) -> ProviderResult<u64> {
        let result = self.request("eth_chainId", json!([])).await?;
        decode_u64(result)
    }
}

/// Retries `f` while it fails with a retryable error, waiting a little
/// longer before each attempt.
async fn retry_async<T, Fut, F>(config: &RpcConfig, method: &str, f: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if retries >= config.max_retries || !e.current_context().code.is_retryable() {
                    return Err(e);
                }
                retries += 1;
                warn!(
                    "{} failed ({}), retrying ({}/{})",
                    method,
                    e.current_context(),
                    retries,
                    config.max_retries
                );
                tokio::time::sleep(config.retry_delay(retries)).await;
            }
        }
    }
}
