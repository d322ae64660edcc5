//! Conditions surfaced by tool listing and tool dispatch.

use crate::mcp::ClientError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {server}:{tool}")]
    NotFound { server: String, tool: String },

    #[error("Server not connected: {0}")]
    NotConnected(String),

    #[error("Missing '{0}' parameter")]
    MissingArgument(String),

    #[error("Invalid '{name}' parameter: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Path is a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Path exists and is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{0} executable not found on PATH")]
    ToolUnavailable(String),

    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Tool reported an error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ClientError),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
