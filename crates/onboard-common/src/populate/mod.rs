pub mod plan;

use error_stack::{Report, ResultExt};
use log::{debug, trace};

use crate::config::PopulateConfig;
use crate::errors::{provider_failure, PopulateError, PopulateErrorExt, PopulateResult};
use crate::provider::ChainDataProvider;
use crate::types::{BlockTag, FeeScheme, TransactionRequest, TxType};

pub use plan::{plan_fees, resolve_with_fee_data, FeeLookup, FeePlan};

/// Fills in the type, fee fields, nonce, gas limit and chain id of `request`.
///
/// Fee field validation happens before any lookup. The remaining lookups are
/// issued concurrently and all of them settle before this returns; the first
/// failure, in the order fees, nonce, gas limit, chain id, is reported.
///
/// `request` is never modified: the populated transaction is a new value and
/// the caller's draft is left as it was on success and on failure.
pub async fn populate_transaction<P>(
    provider: &P,
    request: &TransactionRequest,
    config: &PopulateConfig,
) -> PopulateResult<TransactionRequest>
where
    P: ChainDataProvider + ?Sized,
{
    let plan = plan_fees(request).with_transaction_context(request)?;
    debug!("populating transaction with fee plan {:?}", plan);

    let (fees, nonce, gas_limit, chain_id) = futures::join!(
        resolve_fees(provider, &plan),
        fill_nonce(provider, request.nonce),
        fill_gas_limit(provider, request, config),
        fill_chain_id(provider, request.chain_id),
    );

    let (tx_type, scheme) = fees.with_transaction_context(request)?;
    let nonce = nonce.with_transaction_context(request)?;
    let gas_limit = gas_limit.with_transaction_context(request)?;
    let chain_id = chain_id.with_transaction_context(request)?;

    let mut populated = request.clone();
    populated.tx_type = Some(tx_type);
    scheme.apply(&mut populated);
    populated.nonce = Some(nonce);
    populated.gas_limit = Some(gas_limit);
    populated.chain_id = Some(chain_id);

    debug!("populated transaction as type {}", tx_type);
    Ok(populated)
}

async fn resolve_fees<P>(provider: &P, plan: &FeePlan) -> PopulateResult<(TxType, FeeScheme)>
where
    P: ChainDataProvider + ?Sized,
{
    match plan.lookup() {
        FeeLookup::None => plan::resolve_without_fee_data(plan, None),
        FeeLookup::GasPrice => {
            trace!("looking up gas price");
            let gas_price = provider
                .get_gas_price()
                .await
                .map_err(provider_failure)
                .attach_printable("Fetching gas price for a legacy transaction")?;
            plan::resolve_without_fee_data(plan, Some(gas_price))
        }
        FeeLookup::FeeData => {
            trace!("looking up fee data");
            let fee_data = provider
                .get_fee_data()
                .await
                .map_err(provider_failure)
                .attach_printable("Fetching fee data")?;
            resolve_with_fee_data(plan, &fee_data)
        }
    }
}

async fn fill_nonce<P>(provider: &P, nonce: Option<u64>) -> PopulateResult<u64>
where
    P: ChainDataProvider + ?Sized,
{
    if let Some(nonce) = nonce {
        return Ok(nonce);
    }
    trace!("looking up pending transaction count");
    provider
        .get_transaction_count(BlockTag::Pending)
        .await
        .map_err(provider_failure)
        .attach_printable("Fetching pending nonce")
}

async fn fill_gas_limit<P>(
    provider: &P,
    request: &TransactionRequest,
    config: &PopulateConfig,
) -> PopulateResult<u64>
where
    P: ChainDataProvider + ?Sized,
{
    if let Some(gas_limit) = request.gas_limit {
        return Ok(gas_limit);
    }
    trace!("estimating gas");
    provider.estimate_gas(request).await.map_err(|report| {
        let cause = report.current_context().clone();
        if config.forwards(cause.code) {
            report.change_context(PopulateError::Provider(cause))
        } else {
            report
                .change_context(PopulateError::GasEstimationFailed)
                .attach_printable(format!("Estimation failed with {}", cause.code))
        }
    })
}

async fn fill_chain_id<P>(provider: &P, chain_id: Option<u64>) -> PopulateResult<u64>
where
    P: ChainDataProvider + ?Sized,
{
    trace!("looking up chain id");
    let network = provider
        .get_chain_id()
        .await
        .map_err(provider_failure)
        .attach_printable("Fetching chain id")?;

    match chain_id {
        None => Ok(network),
        // A provider reporting 0 cannot contradict the caller
        Some(requested) if network != 0 && requested != network => {
            Err(Report::new(PopulateError::ChainIdMismatch { requested, network }))
        }
        Some(requested) => Ok(requested),
    }
}
