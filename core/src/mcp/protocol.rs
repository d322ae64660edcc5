//! JSON-RPC 2.0 message types for tool servers speaking over stdio.
//!
//! - **Requests**: host → server (`initialize`, `tools/list`, `tools/call`)
//! - **Responses**: server → host (result or error)
//! - **Notifications**: either direction, no `id` (e.g. `notifications/initialized`)

use crate::traits::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "mcphost";

/// JSON-RPC "method not found", sent back for server-initiated requests.
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// Outgoing error response to a request the server sent us.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorOut {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: Value,
}

impl JsonRpcErrorOut {
    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error: json!({
                "code": METHOD_NOT_FOUND,
                "message": format!("Method not supported by client: {}", method),
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Has `id`, no `method`.
    Response,
    /// Has `id` and `method`; the server expects an answer.
    IncomingRequest,
    /// Has `method`, no `id`.
    Notification,
}

/// Classify a JSON-RPC frame by inspecting its `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let has_id = json.get("id").is_some_and(|v| !v.is_null());
    let has_method = json.get("method").and_then(|v| v.as_str()).is_some();

    match (has_id, has_method) {
        (true, true) => MessageKind::IncomingRequest,
        (true, false) => MessageKind::Response,
        _ => MessageKind::Notification,
    }
}

/// True when `json` carries the numeric id we issued. String or missing ids never match.
pub fn is_response_to(json: &Value, id: u64) -> bool {
    json.get("id").and_then(Value::as_u64) == Some(id)
}

pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": CLIENT_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

/// Convert one entry of a `tools/list` result into a descriptor.
///
/// Servers differ on the schema field name; both `inputSchema` and
/// `input_schema` are accepted.
pub fn descriptor_from_wire(tool: &Value) -> Option<ToolDescriptor> {
    let name = tool.get("name")?.as_str()?.to_string();
    let description = tool
        .get("description")
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string();
    let input_schema = tool
        .get("inputSchema")
        .or_else(|| tool.get("input_schema"))
        .cloned()
        .unwrap_or_else(|| json!({"type": "object"}));

    Some(ToolDescriptor {
        name,
        description,
        input_schema,
    })
}

/// Parsed `tools/call` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// The JSON payload handed back to callers: `{"content": [...]}`, plus
    /// `structuredContent` when the server sent one.
    pub fn into_payload(self) -> Value {
        let mut payload = json!({ "content": self.content });
        if let Some(structured) = self.structured_content {
            payload["structuredContent"] = structured;
        }
        payload
    }

    /// Text blocks joined by newlines, used as the message of a failed call.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
