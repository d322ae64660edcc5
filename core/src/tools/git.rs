use crate::error::{ToolError, ToolResult};
use crate::tools::extract_string_arg;
use crate::traits::{Tool, ToolContent};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

const DEFAULT_IDENTITY_NAME: &str = "mcphost";
const DEFAULT_IDENTITY_EMAIL: &str = "mcphost@localhost";

fn git_binary() -> ToolResult<PathBuf> {
    which::which("git").map_err(|_| ToolError::ToolUnavailable("git".to_string()))
}

/// Run git inside `workspace`, creating the directory first.
///
/// A non-zero exit becomes [`ToolError::CommandFailed`] carrying git's own output.
async fn run_git(workspace: &Path, args: &[&str]) -> ToolResult<String> {
    let git = git_binary()?;
    tokio::fs::create_dir_all(workspace).await?;

    let mut cmd = Command::new(git);
    cmd.args(args).current_dir(workspace);
    for (var, value) in [
        ("GIT_AUTHOR_NAME", DEFAULT_IDENTITY_NAME),
        ("GIT_COMMITTER_NAME", DEFAULT_IDENTITY_NAME),
        ("GIT_AUTHOR_EMAIL", DEFAULT_IDENTITY_EMAIL),
        ("GIT_COMMITTER_EMAIL", DEFAULT_IDENTITY_EMAIL),
    ] {
        if std::env::var_os(var).is_none() {
            cmd.env(var, value);
        }
    }

    debug!(workspace = %workspace.display(), ?args, "Running git");
    let output = cmd.output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if output.status.success() {
        Ok(if stdout.is_empty() { stderr } else { stdout })
    } else {
        let message = [stdout, stderr]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Err(ToolError::CommandFailed {
            command: format!("git {}", args.first().copied().unwrap_or_default()),
            message: if message.is_empty() {
                format!("exited with {}", output.status)
            } else {
                message
            },
        })
    }
}

fn summary(output: String, fallback: &str) -> Vec<ToolContent> {
    if output.is_empty() {
        vec![ToolContent::text(fallback)]
    } else {
        vec![ToolContent::text(output)]
    }
}

pub struct GitInitTool {
    workspace: PathBuf,
}

impl GitInitTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for GitInitTool {
    fn name(&self) -> &str {
        "git_init"
    }

    fn description(&self) -> &str {
        "Initialize a git repository in the workspace"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: &Value) -> ToolResult<Vec<ToolContent>> {
        let output = run_git(&self.workspace, &["init"]).await?;
        Ok(summary(output, "Initialized git repository"))
    }
}

pub struct GitAddAllTool {
    workspace: PathBuf,
}

impl GitAddAllTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for GitAddAllTool {
    fn name(&self) -> &str {
        "git_add_all"
    }

    fn description(&self) -> &str {
        "Stage every change in the workspace repository"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: &Value) -> ToolResult<Vec<ToolContent>> {
        let output = run_git(&self.workspace, &["add", "-A"]).await?;
        Ok(summary(output, "Staged all changes"))
    }
}

pub struct GitCommitTool {
    workspace: PathBuf,
}

impl GitCommitTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Commit staged changes in the workspace repository"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Commit message"}
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: &Value) -> ToolResult<Vec<ToolContent>> {
        let message = extract_string_arg(args, "message")?;
        let output = run_git(&self.workspace, &["commit", "-m", &message]).await?;
        Ok(summary(output, "Committed"))
    }
}
