//! Newline-delimited JSON-RPC over a child process's stdin/stdout.
//!
//! The transport owns the child exclusively. Requests are strictly
//! sequential: one request is written, then frames are read until the
//! response with the same id arrives. Notifications are skipped and
//! server-initiated requests are answered with "method not found".

use crate::config::ServerConfig;
use crate::mcp::error::{ClientError, Result};
use crate::mcp::protocol::{
    JsonRpcErrorOut, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, MessageKind,
    classify_message, is_response_to,
};
use serde::Serialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub struct StdioTransport {
    server_id: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<()>>,
    next_id: u64,
}

impl StdioTransport {
    /// Spawn `config.command` with `config.env` merged over the inherited environment.
    pub fn spawn(config: &ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::Spawn(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::Spawn(std::io::Error::other("Failed to capture stdout")))?;

        let stderr_task = child.stderr.take().map(|stderr| {
            let server_id = config.id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server_id, "stderr: {}", line);
                }
            })
        });

        debug!(server = %config.id, command = %config.command, "Spawned tool server");

        Ok(Self {
            server_id: config.id.clone(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            stderr_task,
            next_id: 1,
        })
    }

    async fn write_frame<T: Serialize>(&mut self, frame: &T) -> Result<()> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        let stdin = self.stdin.as_mut().ok_or(ClientError::TransportClosed)?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|_| ClientError::TransportClosed)?;
        stdin.flush().await.map_err(|_| ClientError::TransportClosed)?;
        Ok(())
    }

    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.write_frame(&JsonRpcNotification::new(method, params))
            .await
    }

    /// Send one request and wait up to `timeout` for its response.
    pub async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        self.write_frame(&JsonRpcRequest::new(id, method, params))
            .await?;

        tokio::time::timeout(timeout, self.read_response(id))
            .await
            .map_err(|_| ClientError::Timeout(method.to_string()))?
    }

    async fn read_response(&mut self, id: u64) -> Result<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|_| ClientError::TransportClosed)?
                .ok_or(ClientError::TransportClosed)?;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let json: Value = match serde_json::from_str(line) {
                Ok(json) => json,
                Err(_) => {
                    debug!(server = %self.server_id, "Skipping non-JSON stdout line: {}", line);
                    continue;
                }
            };

            match classify_message(&json) {
                MessageKind::Response => {
                    if !is_response_to(&json, id) {
                        debug!(
                            server = %self.server_id,
                            "Ignoring response for id {} while waiting for {}",
                            json["id"],
                            id
                        );
                        continue;
                    }
                    let response: JsonRpcResponse = serde_json::from_value(json)?;
                    if let Some(error) = response.error {
                        return Err(ClientError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                MessageKind::IncomingRequest => {
                    let method = json
                        .get("method")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let request_id = json.get("id").cloned().unwrap_or(Value::Null);
                    debug!(server = %self.server_id, %method, "Rejecting server request");
                    self.write_frame(&JsonRpcErrorOut::method_not_found(request_id, &method))
                        .await?;
                }
                MessageKind::Notification => {
                    trace!(server = %self.server_id, "Notification: {}", line);
                }
            }
        }
    }

    /// Close stdin, give the child `grace` to exit, then kill it.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<()> {
        drop(self.stdin.take());

        let exited = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                debug!(server = %self.server_id, "Server exited: {:?}", status?);
                true
            }
            Err(_) => false,
        };

        if !exited {
            warn!(server = %self.server_id, "Server did not exit in time, killing it");
            self.child.kill().await?;
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}
