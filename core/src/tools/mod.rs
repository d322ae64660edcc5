use crate::error::{ToolError, ToolResult};
use serde_json::Value;
use std::path::PathBuf;

pub mod builtin;
pub mod fs;
pub mod git;
pub mod registry;

pub use builtin::{BuiltinServer, BuiltinTools};
pub use fs::{MkdirTool, ReadFileTool, WriteFileTool};
pub use git::{GitAddAllTool, GitCommitTool, GitInitTool};
pub use registry::ToolRegistry;

pub fn extract_string_arg(args: &Value, key: &str) -> ToolResult<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::MissingArgument(key.to_string()))
        .map(|s| s.to_string())
}

pub fn extract_bool_arg_opt(args: &Value, key: &str, default: bool) -> ToolResult<bool> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ToolError::InvalidArgument {
            name: key.to_string(),
            reason: format!("expected a boolean, got {}", other),
        }),
    }
}

/// A path argument resolved against the current directory.
pub fn extract_path_arg(args: &Value, key: &str) -> ToolResult<PathBuf> {
    let raw = extract_string_arg(args, key)?;
    if raw.trim().is_empty() {
        return Err(ToolError::InvalidArgument {
            name: key.to_string(),
            reason: "path is empty".to_string(),
        });
    }
    Ok(std::path::absolute(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_arg_defaults_and_validates() {
        assert!(extract_bool_arg_opt(&json!({}), "exist_ok", true).unwrap());
        assert!(extract_bool_arg_opt(&json!({"exist_ok": null}), "exist_ok", true).unwrap());
        assert!(!extract_bool_arg_opt(&json!({"exist_ok": false}), "exist_ok", true).unwrap());
        assert!(extract_bool_arg_opt(&json!({"exist_ok": "no"}), "exist_ok", true).is_err());
    }

    #[test]
    fn path_arg_is_absolute() {
        let path = extract_path_arg(&json!({"path": "relative/file.txt"}), "path").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("relative/file.txt"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = extract_path_arg(&json!({"path": "  "}), "path").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }
}
