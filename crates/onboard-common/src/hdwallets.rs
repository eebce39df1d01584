//! Pure helpers used by hardware wallet connectors before they hand a
//! transaction to a signing device.

use std::fmt;

use alloy_primitives::hex;
use serde_derive::{Deserialize, Serialize};

use crate::constants::KNOWN_CHAINS;
use crate::types::TransactionRequest;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hardfork {
    Berlin,
    #[default]
    London,
    Merge,
    Shanghai,
    Cancun,
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hardfork::Berlin => "berlin",
            Hardfork::London => "london",
            Hardfork::Merge => "merge",
            Hardfork::Shanghai => "shanghai",
            Hardfork::Cancun => "cancun",
        };
        f.write_str(name)
    }
}

/// Network parameters supplied by an application for chains a signing
/// device does not know about
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomNetwork {
    pub name: String,
    pub chain_id: u64,
    pub network_id: u64,
    #[serde(default)]
    pub hardfork: Hardfork,
}

/// Chain parameters a hardware wallet signs against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub name: String,
    pub chain_id: u64,
    pub network_id: u64,
    pub hardfork: Hardfork,
    /// False for chains known by name
    pub custom: bool,
}

/// Builds the chain descriptor used when signing with a hardware wallet.
///
/// A custom network always wins. Otherwise known chains resolve by name and
/// anything else becomes a custom chain carrying only its id.
pub fn chain_descriptor(custom_network: Option<&CustomNetwork>, chain_id: u64) -> ChainDescriptor {
    if let Some(network) = custom_network {
        return ChainDescriptor {
            name: network.name.clone(),
            chain_id: network.chain_id,
            network_id: network.network_id,
            hardfork: network.hardfork,
            custom: true,
        };
    }

    match KNOWN_CHAINS.iter().find(|(_, id)| *id == chain_id) {
        Some((name, id)) => ChainDescriptor {
            name: name.to_string(),
            chain_id: *id,
            network_id: *id,
            hardfork: Hardfork::default(),
            custom: false,
        },
        None => ChainDescriptor {
            name: format!("custom-{}", chain_id),
            chain_id,
            network_id: chain_id,
            hardfork: Hardfork::default(),
            custom: true,
        },
    }
}

/// A transaction with every field rendered as the hex string signing devices expect
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
}

fn hex_quantity<T: fmt::LowerHex>(value: T) -> String {
    format!("{:#x}", value)
}

impl From<&TransactionRequest> for HardwareTransaction {
    fn from(request: &TransactionRequest) -> Self {
        Self {
            from: request.from.map(|a| a.to_string()),
            to: request.to.map(|a| a.to_string()),
            data: request.data.as_ref().map(|d| hex::encode_prefixed(d)),
            value: hex_quantity(request.value),
            nonce: request.nonce.map(hex_quantity),
            gas_limit: request.gas_limit.map(hex_quantity),
            gas_price: request.gas_price.map(hex_quantity),
            max_fee_per_gas: request.max_fee_per_gas.map(hex_quantity),
            max_priority_fee_per_gas: request.max_priority_fee_per_gas.map(hex_quantity),
            chain_id: request.chain_id.map(hex_quantity),
            tx_type: request.tx_type.map(|t| hex_quantity(t as u8)),
        }
    }
}
