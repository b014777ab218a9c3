//! # JSON-RPC Envelopes
//!
//! Request and response shapes spoken by namecoind. The daemon follows the
//! JSON-RPC 1.0 convention of Bitcoin Core: no `jsonrpc` field, positional
//! parameters, and both `result` and `error` present in every response (one
//! of them `null`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request sent to namecoind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// RPC method name, e.g. `name_show`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
    /// Request identifier, echoed back in the response.
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            id,
        }
    }
}

/// A response from namecoind.
///
/// `id` is kept as a raw value: a malformed request can come back with
/// `"id": null`, and that must surface as a mismatch rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
            id: Value::from(id),
        }
    }

    pub fn failure(id: u64, error: RpcErrorObject) -> Self {
        Self {
            result: None,
            error: Some(error),
            id: Value::from(id),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_has_no_jsonrpc_field() {
        let req = RpcRequest::new(7, "name_show", vec![json!("id/domob")]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({ "method": "name_show", "params": ["id/domob"], "id": 7 })
        );
    }

    #[test]
    fn bitcoin_style_success_response_parses() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"result":true,"error":null,"id":3}"#).unwrap();
        assert_eq!(resp.result, Some(json!(true)));
        assert!(resp.error.is_none());
        assert_eq!(resp.id, json!(3));
    }

    #[test]
    fn error_response_parses_code_and_message() {
        let body = r#"{"result":null,"error":{"code":-4,"message":"name not found"},"id":1}"#;
        let resp: RpcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.error, Some(RpcErrorObject::new(-4, "name not found")));
    }

    #[test]
    fn missing_members_default() {
        let resp: RpcResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.result, None);
        assert_eq!(resp.error, None);
        assert_eq!(resp.id, Value::Null);
    }
}
