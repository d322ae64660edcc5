use crate::error::ToolResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A tool as advertised by a server or by the built-in registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// One block of tool output. Bytes that are not valid UTF-8 travel hex-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text { text: String },
    Bytes { encoding: String, data: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text { text },
            Err(e) => Self::Bytes {
                encoding: "hex".to_string(),
                data: hex::encode(e.into_bytes()),
            },
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> Value;

    async fn execute(&self, args: &Value) -> ToolResult<Vec<ToolContent>>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// The result shape shared by every tool call: `{"content": [blocks]}`.
pub fn content_payload(blocks: Vec<ToolContent>) -> Value {
    json!({ "content": blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bytes_become_text() {
        let block = ToolContent::from_bytes(b"hello".to_vec());
        assert_eq!(block, ToolContent::text("hello"));
    }

    #[test]
    fn binary_bytes_become_hex() {
        let block = ToolContent::from_bytes(vec![0xff, 0x00, 0x10]);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "bytes", "encoding": "hex", "data": "ff0010"}));
    }

    #[test]
    fn payload_wraps_blocks_in_content() {
        let payload = content_payload(vec![ToolContent::text("ok")]);
        assert_eq!(payload, json!({"content": [{"type": "text", "text": "ok"}]}));
    }
}
