use crate::constants::JSONRPC_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(
            id,
            METHOD_NOT_FOUND,
            format!("client does not implement method '{method}'"),
        )
    }
}

/// A message read from the provider, classified by shape.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Response {
        id: String,
        outcome: Result<Value, RpcError>,
    },
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    Unrecognized,
}

impl Inbound {
    pub fn classify(mut value: Value) -> Self {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);
        let params = value.get_mut("params").map(Value::take).unwrap_or(Value::Null);

        match (value.get("id").cloned(), method) {
            (Some(id), Some(method)) => Self::Request { id, method, params },
            (None, Some(method)) => Self::Notification { method, params },
            (Some(id), None) => {
                let Some(id) = response_key(&id) else {
                    return Self::Unrecognized;
                };
                let outcome = match value.get_mut("error").map(Value::take) {
                    Some(error) if !error.is_null() => {
                        Err(serde_json::from_value(error).unwrap_or_else(|_| RpcError {
                            code: -32000,
                            message: "unknown error".to_string(),
                            data: None,
                        }))
                    }
                    _ => Ok(value
                        .get_mut("result")
                        .map(Value::take)
                        .unwrap_or(Value::Null)),
                };
                Self::Response { id, outcome }
            }
            (None, None) => Self::Unrecognized,
        }
    }
}

/// Request ids are tracked as strings regardless of their JSON type.
pub fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
