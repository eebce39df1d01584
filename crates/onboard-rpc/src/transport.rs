//! Minimal JSON-RPC over HTTP

use std::fmt;

use alloy_primitives::{U128, U64};
use error_stack::{Report, ResultExt};
use onboard_common::{ErrorCode, ProviderError, ProviderResult};
use serde_derive::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

/// Where a failed call was headed, attached to transport errors
#[derive(Debug, Clone)]
pub struct RpcContext {
    pub endpoint: String,
    pub method: String,
    pub params: Option<String>,
}

impl fmt::Display for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC {} at {}", self.method, self.endpoint)?;
        if let Some(params) = &self.params {
            write!(f, " with params {}", params)?;
        }
        Ok(())
    }
}

/// The `error` member of a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error (code {}): {}", self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

/// Maps a node's error object onto a provider error code.
pub fn classify_rpc_error(error: &JsonRpcErrorObject) -> ErrorCode {
    let message = error.message.to_ascii_lowercase();
    if message.contains("insufficient funds") {
        ErrorCode::InsufficientFunds
    } else if message.contains("nonce too low") || message.contains("nonce has already been used") {
        ErrorCode::NonceExpired
    } else if message.contains("replacement transaction underpriced")
        || message.contains("replacement fee too low")
    {
        ErrorCode::ReplacementUnderpriced
    } else if message.contains("gas required exceeds allowance")
        || message.contains("always failing transaction")
    {
        ErrorCode::UnpredictableGasLimit
    } else if error.code == 3 || message.contains("execution reverted") {
        ErrorCode::CallException
    } else {
        ErrorCode::ServerError
    }
}

/// Unwraps a JSON-RPC response body: its `result` when present and non-null,
/// its `error` otherwise.
pub fn parse_response(body: Value) -> ProviderResult<Value> {
    let response: JsonRpcResponse = serde_json::from_value(body).map_err(|e| {
        Report::new(ProviderError::new(ErrorCode::ServerError, "malformed JSON-RPC response"))
            .attach_printable(e.to_string())
    })?;

    match (response.result, response.error) {
        (Some(result), _) if !result.is_null() => Ok(result),
        (_, Some(error)) => {
            let code = classify_rpc_error(&error);
            Err(Report::new(ProviderError::new(code, error.message.clone())).attach(error))
        }
        _ => Err(Report::new(ProviderError::new(
            ErrorCode::ServerError,
            "JSON-RPC response carries neither result nor error",
        ))),
    }
}

fn transport_error(error: reqwest::Error) -> Report<ProviderError> {
    let code = if error.is_timeout() { ErrorCode::Timeout } else { ErrorCode::NetworkError };
    Report::new(ProviderError::new(code, error.to_string()))
}

/// Issues a single JSON-RPC call and returns its `result`.
pub async fn rpc_request(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Value,
) -> ProviderResult<Value> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 42,
        "method": method,
        "params": params,
    });
    let context = RpcContext {
        endpoint: url.to_string(),
        method: method.to_string(),
        params: Some(params.to_string()),
    };

    let response = client
        .post(url.clone())
        .json(&body)
        .send()
        .await
        .map_err(transport_error)
        .attach(context.clone())?;

    let body: Value = response
        .json()
        .await
        .map_err(transport_error)
        .attach(context.clone())?;

    parse_response(body).attach(context)
}

pub fn decode_u64(value: Value) -> ProviderResult<u64> {
    let quantity: U64 = serde_json::from_value(value.clone()).map_err(|e| {
        Report::new(ProviderError::new(ErrorCode::ServerError, "invalid quantity"))
            .attach_printable(format!("{}: {}", value, e))
    })?;
    Ok(quantity.to::<u64>())
}

pub fn decode_u128(value: Value) -> ProviderResult<u128> {
    let quantity: U128 = serde_json::from_value(value.clone()).map_err(|e| {
        Report::new(ProviderError::new(ErrorCode::ServerError, "invalid quantity"))
            .attach_printable(format!("{}: {}", value, e))
    })?;
    Ok(quantity.to::<u128>())
}

/// `eth_gasPrice` against `url`
pub async fn get_gas_price(client: &reqwest::Client, url: &Url) -> ProviderResult<u128> {
    let result = rpc_request(client, url, "eth_gasPrice", json!([])).await?;
    decode_u128(result)
}
