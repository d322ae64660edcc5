use crate::config::ServerConfig;
use crate::mcp::error::{ClientError, Result};
use crate::mcp::protocol::{CallToolResult, descriptor_from_wire, initialize_params};
use crate::mcp::transport::StdioTransport;
use crate::traits::ToolDescriptor;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const MAX_LIST_PAGES: usize = 64;

/// An initialized connection to one tool server.
pub struct McpSession {
    transport: StdioTransport,
    timeout: Duration,
    server_info: Value,
}

impl McpSession {
    /// Spawn the server and run the `initialize` handshake.
    ///
    /// When the handshake fails the child is shut down before the error is
    /// returned, so a failed session never leaks a process.
    pub async fn connect(config: &ServerConfig, timeout: Duration) -> Result<Self> {
        let mut transport = StdioTransport::spawn(config)?;

        match Self::handshake(&mut transport, timeout).await {
            Ok(server_info) => {
                info!(server = %config.id, "Tool server initialized");
                Ok(Self {
                    transport,
                    timeout,
                    server_info,
                })
            }
            Err(e) => {
                if let Err(close_err) = transport.shutdown(SHUTDOWN_GRACE).await {
                    debug!(server = %config.id, "Shutdown after failed handshake: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn handshake(transport: &mut StdioTransport, timeout: Duration) -> Result<Value> {
        let result = transport
            .request("initialize", Some(initialize_params()), timeout)
            .await?;
        if !result.is_object() {
            return Err(ClientError::UnexpectedResponse(format!(
                "initialize returned {}",
                result
            )));
        }
        transport.notify("notifications/initialized", None).await?;
        Ok(result.get("serverInfo").cloned().unwrap_or(Value::Null))
    }

    pub fn server_info(&self) -> &Value {
        &self.server_info
    }

    /// All tools the server advertises, following `nextCursor` pagination.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self
                .transport
                .request("tools/list", params, self.timeout)
                .await?;

            let page = result
                .get("tools")
                .and_then(|t| t.as_array())
                .ok_or_else(|| {
                    ClientError::UnexpectedResponse("tools/list without a tools array".into())
                })?;
            tools.extend(page.iter().filter_map(descriptor_from_wire));

            cursor = result
                .get("nextCursor")
                .and_then(|c| c.as_str())
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        Ok(tools)
    }

    pub async fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<CallToolResult> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self
            .transport
            .request("tools/call", Some(params), self.timeout)
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn close(mut self) -> Result<()> {
        self.transport.shutdown(SHUTDOWN_GRACE).await
    }
}
