//! Fee resolution expressed as a decision table over the caller's type and
//! fee fields. Planning validates the draft and decides which lookup, if any,
//! the fee scheme needs; resolution turns a plan plus lookup results into a
//! concrete type and fee scheme.

use error_stack::Report;

use crate::errors::{PopulateError, PopulateResult};
use crate::types::{FeeData, FeeScheme, TransactionRequest, TxType};

/// Fee-market fields the caller may have supplied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeMarketFields {
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeMarketFields {
    fn from_request(request: &TransactionRequest) -> Self {
        Self {
            max_fee_per_gas: request.max_fee_per_gas,
            max_priority_fee_per_gas: request.max_priority_fee_per_gas,
        }
    }

    fn any(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }

    /// Missing fields taken from `fee_data`; fails if either is still missing.
    fn fill_from(&self, fee_data: &FeeData) -> PopulateResult<FeeScheme> {
        let max_fee_per_gas = self.max_fee_per_gas.or(fee_data.max_fee_per_gas);
        let max_priority_fee_per_gas =
            self.max_priority_fee_per_gas.or(fee_data.max_priority_fee_per_gas);
        match (max_fee_per_gas, max_priority_fee_per_gas) {
            (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => {
                Ok(FeeScheme::FeeMarket { max_fee_per_gas, max_priority_fee_per_gas })
            }
            _ => Err(Report::new(PopulateError::InconsistentFeeData)
                .attach_printable("fee data is missing a fee-market field the transaction needs")),
        }
    }
}

/// What the caller's fee fields still need
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeePlan {
    /// Type 2 or unspecified, both fee-market fields supplied
    FeeMarketComplete { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
    /// Explicit type 0 or 1
    Legacy { tx_type: TxType, gas_price: Option<u128> },
    /// Type unspecified; the network's fee data decides
    Detect { gas_price: Option<u128>, fee_market: FeeMarketFields },
    /// Explicit type 2 with at least one fee-market field missing
    FeeMarketFill { fee_market: FeeMarketFields },
}

/// Lookup a plan needs before it can be resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeLookup {
    None,
    GasPrice,
    FeeData,
}

impl FeePlan {
    pub fn lookup(&self) -> FeeLookup {
        match self {
            FeePlan::FeeMarketComplete { .. } => FeeLookup::None,
            FeePlan::Legacy { gas_price: Some(_), .. } => FeeLookup::None,
            FeePlan::Legacy { gas_price: None, .. } => FeeLookup::GasPrice,
            FeePlan::Detect { .. } | FeePlan::FeeMarketFill { .. } => FeeLookup::FeeData,
        }
    }
}

/// Rejects drafts that mix fee schemes.
pub fn validate_fee_fields(request: &TransactionRequest) -> PopulateResult<()> {
    let has_fee_market = request.has_fee_market_field();

    if request.gas_price.is_some()
        && (request.tx_type == Some(TxType::FeeMarket) || has_fee_market)
    {
        return Err(Report::new(PopulateError::legacy_with_fee_market()));
    }
    if request.tx_type.is_some_and(|t| t.is_legacy_fee_model()) && has_fee_market {
        return Err(Report::new(PopulateError::fee_market_on_legacy_type()));
    }
    Ok(())
}

/// Validates the draft and picks its row of the decision table.
pub fn plan_fees(request: &TransactionRequest) -> PopulateResult<FeePlan> {
    validate_fee_fields(request)?;

    let fee_market = FeeMarketFields::from_request(request);
    let plan = match (request.tx_type, fee_market.max_fee_per_gas, fee_market.max_priority_fee_per_gas) {
        (None | Some(TxType::FeeMarket), Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => {
            FeePlan::FeeMarketComplete { max_fee_per_gas, max_priority_fee_per_gas }
        }
        (Some(tx_type @ (TxType::Legacy | TxType::AccessList)), _, _) => {
            FeePlan::Legacy { tx_type, gas_price: request.gas_price }
        }
        (None, _, _) => FeePlan::Detect { gas_price: request.gas_price, fee_market },
        (Some(TxType::FeeMarket), _, _) => FeePlan::FeeMarketFill { fee_market },
    };
    Ok(plan)
}

/// Resolves a plan that needs no fee data. `gas_price` is the looked up
/// price for a legacy plan without one.
pub fn resolve_without_fee_data(
    plan: &FeePlan,
    gas_price: Option<u128>,
) -> PopulateResult<(TxType, FeeScheme)> {
    match *plan {
        FeePlan::FeeMarketComplete { max_fee_per_gas, max_priority_fee_per_gas } => Ok((
            TxType::FeeMarket,
            FeeScheme::FeeMarket { max_fee_per_gas, max_priority_fee_per_gas },
        )),
        FeePlan::Legacy { tx_type, gas_price: supplied } => supplied
            .or(gas_price)
            .map(|gas_price| (tx_type, FeeScheme::Legacy { gas_price }))
            .ok_or_else(|| {
                Report::new(PopulateError::InconsistentFeeData)
                    .attach_printable("no gas price available for a legacy transaction")
            }),
        FeePlan::Detect { .. } | FeePlan::FeeMarketFill { .. } => {
            Err(Report::new(PopulateError::InconsistentFeeData)
                .attach_printable("fee data is required to resolve this transaction"))
        }
    }
}

/// Resolves a plan against the network's fee data.
pub fn resolve_with_fee_data(
    plan: &FeePlan,
    fee_data: &FeeData,
) -> PopulateResult<(TxType, FeeScheme)> {
    match *plan {
        FeePlan::Detect { gas_price, fee_market } => {
            if fee_data.supports_fee_market() {
                // A legacy price on a fee-market network pays that price as both fields
                let scheme = match gas_price {
                    Some(gas_price) => FeeScheme::FeeMarket {
                        max_fee_per_gas: gas_price,
                        max_priority_fee_per_gas: gas_price,
                    },
                    None => fee_market.fill_from(fee_data)?,
                };
                Ok((TxType::FeeMarket, scheme))
            } else if let Some(network_gas_price) = fee_data.gas_price {
                if fee_market.any() {
                    return Err(Report::new(PopulateError::UnsupportedFeeMarket)
                        .attach_printable("maxFeePerGas/maxPriorityFeePerGas set on a legacy network"));
                }
                Ok((
                    TxType::Legacy,
                    FeeScheme::Legacy { gas_price: gas_price.unwrap_or(network_gas_price) },
                ))
            } else {
                Err(Report::new(PopulateError::InconsistentFeeData)
                    .attach_printable("provider returned neither gasPrice nor fee-market fields"))
            }
        }
        FeePlan::FeeMarketFill { fee_market } => {
            Ok((TxType::FeeMarket, fee_market.fill_from(fee_data)?))
        }
        FeePlan::FeeMarketComplete { .. } | FeePlan::Legacy { .. } => {
            resolve_without_fee_data(plan, None)
        }
    }
}
