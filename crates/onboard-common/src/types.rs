use std::fmt;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::de::Error as _;
use serde::{Deserializer, Serializer};
use serde_derive::{Deserialize, Serialize};

/// Ethereum transaction types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    Legacy = 0,
    /// EIP-2930
    AccessList = 1,
    /// EIP-1559
    FeeMarket = 2,
}

impl TxType {
    pub fn is_legacy_fee_model(&self) -> bool {
        matches!(self, TxType::Legacy | TxType::AccessList)
    }
}

impl TryFrom<u8> for TxType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::FeeMarket),
            other => Err(format!("unsupported transaction type: {}", other)),
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl serde::Serialize for TxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        alloy_serde::quantity::serialize(&(*self as u8), serializer)
    }
}

impl<'de> serde::Deserialize<'de> for TxType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: u8 = alloy_serde::quantity::deserialize(deserializer)?;
        TxType::try_from(raw).map_err(D::Error::custom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// A transaction draft. Fields left as `None` are inferred during population.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "input")]
    pub data: Option<Bytes>,

    /// Amount of wei sent with the transaction. Never touched by population.
    #[serde(default)]
    pub value: U256,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub nonce: Option<u64>,

    #[serde(
        rename = "gas",
        alias = "gasLimit",
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub gas_limit: Option<u64>,

    /// Legacy gas price, only valid for type 0 and 1
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub gas_price: Option<u128>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub max_fee_per_gas: Option<u128>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub max_priority_fee_per_gas: Option<u128>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub chain_id: Option<u64>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TxType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
}

impl TransactionRequest {
    pub fn has_fee_market_field(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }

    /// The fee scheme this request carries, if it carries exactly one complete scheme.
    pub fn fee_scheme(&self) -> Option<FeeScheme> {
        match (self.gas_price, self.max_fee_per_gas, self.max_priority_fee_per_gas) {
            (Some(gas_price), None, None) => Some(FeeScheme::Legacy { gas_price }),
            (None, Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => {
                Some(FeeScheme::FeeMarket { max_fee_per_gas, max_priority_fee_per_gas })
            }
            _ => None,
        }
    }

    /// True once type, fee scheme, nonce, gas limit and chain id are all concrete.
    pub fn is_populated(&self) -> bool {
        self.tx_type.is_some()
            && self.fee_scheme().is_some()
            && self.nonce.is_some()
            && self.gas_limit.is_some()
            && self.chain_id.is_some()
    }
}

/// A provider's current view of network gas pricing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub gas_price: Option<u128>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeData {
    pub fn supports_fee_market(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }

    pub fn supports_legacy(&self) -> bool {
        self.gas_price.is_some()
    }
}

/// The fee fields a populated transaction ends up with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeScheme {
    Legacy { gas_price: u128 },
    FeeMarket { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

impl FeeScheme {
    /// Writes the scheme into `request`, clearing the fields of the other scheme.
    pub fn apply(&self, request: &mut TransactionRequest) {
        match *self {
            FeeScheme::Legacy { gas_price } => {
                request.gas_price = Some(gas_price);
                request.max_fee_per_gas = None;
                request.max_priority_fee_per_gas = None;
            }
            FeeScheme::FeeMarket { max_fee_per_gas, max_priority_fee_per_gas } => {
                request.gas_price = None;
                request.max_fee_per_gas = Some(max_fee_per_gas);
                request.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
            }
        }
    }
}

/// Block tags accepted by count lookups
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
