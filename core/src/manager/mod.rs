//! Dual-mode tool client manager.
//!
//! The backend is picked once at construction: either long-lived protocol
//! sessions (one child process per configured server) or the built-in
//! filesystem/git tools. Callers see the same listing and result shapes in
//! both modes, and every call is written to the interaction log as a
//! `tools/call` record followed by exactly one `tools/response` or
//! `tools/error` record.

pub mod scenario;

use crate::config::{ClientMode, Config, ServerConfig};
use crate::error::{ToolError, ToolResult};
use crate::logging::{InteractionLogger, LogEvent, LogRecord};
use crate::mcp::McpSession;
use crate::tools::{BuiltinServer, BuiltinTools};
use crate::traits::{ToolDescriptor, content_payload};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Backend actually in use after start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Protocol,
    Builtin,
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub mode: ClientMode,
    pub servers: Vec<ServerConfig>,
    pub workspace_dir: PathBuf,
    pub request_timeout: Duration,
}

impl ManagerOptions {
    pub fn from_config(config: &Config, servers: Vec<ServerConfig>) -> Self {
        Self {
            mode: config.client_mode,
            servers,
            workspace_dir: config.workspace_dir.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

struct RegisteredSession {
    id: String,
    /// `None` once the session has been closed.
    session: Mutex<Option<McpSession>>,
}

enum Backend {
    Protocol {
        /// In acquisition order; closed in reverse.
        sessions: RwLock<Vec<Arc<RegisteredSession>>>,
    },
    Builtin(BuiltinTools),
}

pub struct ToolClientManager {
    backend: Backend,
    logger: Arc<InteractionLogger>,
    workspace: PathBuf,
}

impl ToolClientManager {
    /// Select the backend and, in protocol mode, connect every configured server.
    ///
    /// Servers that fail to start are logged as `initialize_error` and left out;
    /// start-up itself never fails.
    pub async fn start(options: ManagerOptions, logger: Arc<InteractionLogger>) -> Self {
        let builtin_reason = match options.mode {
            ClientMode::Builtin => Some("builtin mode selected in configuration"),
            ClientMode::Auto if options.servers.is_empty() => Some("no tool servers configured"),
            ClientMode::Auto | ClientMode::Protocol => None,
        };

        if let Some(reason) = builtin_reason {
            logger.write(LogRecord::new(LogEvent::SdkUnavailable).field("reason", reason));
            info!(reason, "Using built-in tools");
            return Self {
                backend: Backend::Builtin(BuiltinTools::new(&options.workspace_dir)),
                logger,
                workspace: options.workspace_dir,
            };
        }

        let mut sessions: Vec<Arc<RegisteredSession>> = Vec::new();
        for server in &options.servers {
            if sessions.iter().any(|s| s.id == server.id) {
                logger.write(
                    LogRecord::new(LogEvent::InitializeError)
                        .field("server", server.id.as_str())
                        .field("error", "duplicate server id"),
                );
                continue;
            }

            match McpSession::connect(server, options.request_timeout).await {
                Ok(session) => {
                    logger.write(
                        LogRecord::new(LogEvent::Initialize)
                            .field("server", server.id.as_str())
                            .field("server_info", session.server_info().clone()),
                    );
                    sessions.push(Arc::new(RegisteredSession {
                        id: server.id.clone(),
                        session: Mutex::new(Some(session)),
                    }));
                }
                Err(e) => {
                    warn!(server = %server.id, "Tool server failed to start: {}", e);
                    logger.write(
                        LogRecord::new(LogEvent::InitializeError)
                            .field("server", server.id.as_str())
                            .field("error", e.to_string()),
                    );
                }
            }
        }

        info!(
            connected = sessions.len(),
            configured = options.servers.len(),
            "Tool servers started"
        );

        Self {
            backend: Backend::Protocol {
                sessions: RwLock::new(sessions),
            },
            logger,
            workspace: options.workspace_dir,
        }
    }

    pub fn mode(&self) -> BackendMode {
        match self.backend {
            Backend::Protocol { .. } => BackendMode::Protocol,
            Backend::Builtin(_) => BackendMode::Builtin,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn log_path(&self) -> &Path {
        self.logger.path()
    }

    /// Ids of the servers that can currently be called.
    pub async fn server_ids(&self) -> Vec<String> {
        match &self.backend {
            Backend::Protocol { sessions } => {
                sessions.read().await.iter().map(|s| s.id.clone()).collect()
            }
            Backend::Builtin(_) => BuiltinServer::ALL
                .iter()
                .map(|s| s.id().to_string())
                .collect(),
        }
    }

    pub async fn is_connected(&self, server_id: &str) -> bool {
        match &self.backend {
            Backend::Protocol { .. } => self.session(server_id).await.is_some(),
            Backend::Builtin(_) => BuiltinServer::resolve(server_id).is_some(),
        }
    }

    async fn session(&self, server_id: &str) -> Option<Arc<RegisteredSession>> {
        match &self.backend {
            Backend::Protocol { sessions } => sessions
                .read()
                .await
                .iter()
                .find(|s| s.id == server_id)
                .cloned(),
            Backend::Builtin(_) => None,
        }
    }

    fn log_tag(&self, server_id: &str) -> String {
        match self.backend {
            Backend::Protocol { .. } => server_id.to_string(),
            Backend::Builtin(_) => format!("fallback:{}", server_id),
        }
    }

    /// Tool descriptors per server, freshly queried. Unknown ids are skipped.
    pub async fn list_tools(
        &self,
        server_id: Option<&str>,
    ) -> BTreeMap<String, Vec<ToolDescriptor>> {
        let mut out = BTreeMap::new();

        match &self.backend {
            Backend::Protocol { sessions } => {
                let targets: Vec<Arc<RegisteredSession>> = {
                    let sessions = sessions.read().await;
                    sessions
                        .iter()
                        .filter(|s| server_id.is_none_or(|id| s.id == id))
                        .cloned()
                        .collect()
                };

                for target in targets {
                    let mut guard = target.session.lock().await;
                    let Some(session) = guard.as_mut() else {
                        continue;
                    };
                    match session.list_tools().await {
                        Ok(tools) => {
                            self.logger.write(
                                LogRecord::new(LogEvent::ToolsList)
                                    .field("server", target.id.as_str())
                                    .field("tools_count", tools.len()),
                            );
                            out.insert(target.id.clone(), tools);
                        }
                        Err(e) => {
                            warn!(server = %target.id, "tools/list failed: {}", e);
                            self.logger.write(
                                LogRecord::new(LogEvent::ToolsListError)
                                    .field("server", target.id.as_str())
                                    .field("error", e.to_string()),
                            );
                        }
                    }
                }
            }
            Backend::Builtin(builtin) => {
                let targets: Vec<(String, BuiltinServer)> = match server_id {
                    Some(id) => BuiltinServer::resolve(id)
                        .map(|server| (id.to_string(), server))
                        .into_iter()
                        .collect(),
                    None => BuiltinServer::ALL
                        .iter()
                        .map(|server| (server.id().to_string(), *server))
                        .collect(),
                };

                for (id, server) in targets {
                    let tools = builtin.descriptors(server);
                    self.logger.write(
                        LogRecord::new(LogEvent::ToolsList)
                            .field("server", self.log_tag(&id))
                            .field("tools_count", tools.len()),
                    );
                    out.insert(id, tools);
                }
            }
        }

        out
    }

    pub async fn get_schema(&self, server_id: &str, tool_name: &str) -> ToolResult<ToolDescriptor> {
        self.list_tools(Some(server_id))
            .await
            .remove(server_id)
            .unwrap_or_default()
            .into_iter()
            .find(|t| t.name == tool_name)
            .ok_or_else(|| ToolError::NotFound {
                server: server_id.to_string(),
                tool: tool_name.to_string(),
            })
    }

    /// Invoke one tool. `Null` arguments are treated as `{}`.
    pub async fn call_tool(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: Value,
    ) -> ToolResult<Value> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        let tag = self.log_tag(server_id);

        self.logger.write(
            LogRecord::new(LogEvent::ToolsCall)
                .field("server", tag.as_str())
                .field("tool", tool_name)
                .field("args", arguments.clone()),
        );

        let outcome = match &self.backend {
            Backend::Protocol { .. } => self.call_session(server_id, tool_name, &arguments).await,
            Backend::Builtin(builtin) => match BuiltinServer::resolve(server_id) {
                Some(server) => builtin
                    .call(server, tool_name, &arguments)
                    .await
                    .map(content_payload),
                None => Err(ToolError::NotConnected(server_id.to_string())),
            },
        };

        match &outcome {
            Ok(result) => self.logger.write(
                LogRecord::new(LogEvent::ToolsResponse)
                    .field("server", tag.as_str())
                    .field("tool", tool_name)
                    .field("result", result.clone()),
            ),
            Err(e) => self.logger.write(
                LogRecord::new(LogEvent::ToolsError)
                    .field("server", tag.as_str())
                    .field("tool", tool_name)
                    .field("error", e.to_string()),
            ),
        }

        outcome
    }

    async fn call_session(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: &Value,
    ) -> ToolResult<Value> {
        let entry = self
            .session(server_id)
            .await
            .ok_or_else(|| ToolError::NotConnected(server_id.to_string()))?;

        let mut guard = entry.session.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| ToolError::NotConnected(server_id.to_string()))?;

        let result = session.call_tool(tool_name, arguments).await?;
        if result.is_error {
            let text = result.text();
            return Err(ToolError::Execution(if text.is_empty() {
                format!("{} reported an error", tool_name)
            } else {
                text
            }));
        }
        Ok(result.into_payload())
    }

    /// Close every session in reverse acquisition order. Never fails; safe to
    /// call more than once.
    pub async fn close(&self) {
        let Backend::Protocol { sessions } = &self.backend else {
            return;
        };

        let drained: Vec<Arc<RegisteredSession>> = std::mem::take(&mut *sessions.write().await);
        for entry in drained.into_iter().rev() {
            let Some(session) = entry.session.lock().await.take() else {
                continue;
            };
            match session.close().await {
                Ok(()) => info!(server = %entry.id, "Tool server closed"),
                Err(e) => warn!(server = %entry.id, "Error while closing tool server: {}", e),
            }
        }
    }
}
