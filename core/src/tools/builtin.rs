//! The fixed tool set served when no protocol servers are in use.

use crate::error::{ToolError, ToolResult};
use crate::tools::{
    GitAddAllTool, GitCommitTool, GitInitTool, MkdirTool, ReadFileTool, ToolRegistry,
    WriteFileTool,
};
use crate::traits::{ToolContent, ToolDescriptor};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinServer {
    Filesystem,
    Git,
}

impl BuiltinServer {
    pub const ALL: [BuiltinServer; 2] = [BuiltinServer::Filesystem, BuiltinServer::Git];

    /// Map a server id (or one of its aliases) to a built-in server.
    pub fn resolve(server_id: &str) -> Option<Self> {
        match server_id {
            "fs" | "filesystem" => Some(Self::Filesystem),
            "git" | "github" | "gitlocal" => Some(Self::Git),
            _ => None,
        }
    }

    /// Canonical id used in listings.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Filesystem => "fs",
            Self::Git => "git",
        }
    }
}

pub struct BuiltinTools {
    filesystem: ToolRegistry,
    git: ToolRegistry,
}

impl BuiltinTools {
    /// Git tools operate on `workspace`; filesystem tools take absolute or
    /// cwd-relative paths.
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        let workspace = workspace.as_ref();
        let filesystem = ToolRegistry::new()
            .with(WriteFileTool)
            .with(ReadFileTool)
            .with(MkdirTool);
        let git = ToolRegistry::new()
            .with(GitInitTool::new(workspace))
            .with(GitAddAllTool::new(workspace))
            .with(GitCommitTool::new(workspace));

        Self { filesystem, git }
    }

    fn registry(&self, server: BuiltinServer) -> &ToolRegistry {
        match server {
            BuiltinServer::Filesystem => &self.filesystem,
            BuiltinServer::Git => &self.git,
        }
    }

    pub fn descriptors(&self, server: BuiltinServer) -> Vec<ToolDescriptor> {
        self.registry(server).descriptors()
    }

    pub async fn call(
        &self,
        server: BuiltinServer,
        tool_name: &str,
        args: &Value,
    ) -> ToolResult<Vec<ToolContent>> {
        let tool = self
            .registry(server)
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound {
                server: server.id().to_string(),
                tool: tool_name.to_string(),
            })?;
        tool.execute(args).await
    }
}
