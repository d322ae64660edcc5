use crate::error::{ToolError, ToolResult};
use crate::tools::{extract_bool_arg_opt, extract_path_arg, extract_string_arg};
use crate::traits::{Tool, ToolContent};
use async_trait::async_trait;
use serde_json::{Value, json};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write text content to a file, creating parent directories as needed"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path to write"},
                "content": {"type": "string", "description": "Text content to write"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: &Value) -> ToolResult<Vec<ToolContent>> {
        let path = extract_path_arg(args, "path")?;
        let content = extract_string_arg(args, "content")?;

        if path.is_dir() {
            return Err(ToolError::IsDirectory(path));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content.as_bytes()).await?;

        Ok(vec![ToolContent::text(format!(
            "Wrote {} bytes to {}",
            content.len(),
            path.display()
        ))])
    }
}

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path to read"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &Value) -> ToolResult<Vec<ToolContent>> {
        let path = extract_path_arg(args, "path")?;

        if path.is_dir() {
            return Err(ToolError::IsDirectory(path));
        }
        if !path.exists() {
            return Err(ToolError::FileNotFound(path));
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok(vec![ToolContent::from_bytes(bytes)])
    }
}

pub struct MkdirTool;

#[async_trait]
impl Tool for MkdirTool {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn description(&self) -> &str {
        "Create a directory and any missing parents"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Directory to create"},
                "exist_ok": {"type": "boolean", "description": "Succeed if it already exists", "default": true}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &Value) -> ToolResult<Vec<ToolContent>> {
        let path = extract_path_arg(args, "path")?;
        let exist_ok = extract_bool_arg_opt(args, "exist_ok", true)?;

        if path.exists() {
            if !path.is_dir() {
                return Err(ToolError::NotADirectory(path));
            }
            if !exist_ok {
                return Err(ToolError::AlreadyExists(path));
            }
            return Ok(vec![ToolContent::text(format!(
                "Directory already exists: {}",
                path.display()
            ))]);
        }

        tokio::fs::create_dir_all(&path).await?;
        Ok(vec![ToolContent::text(format!(
            "Created directory {}",
            path.display()
        ))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text_of(blocks: &[ToolContent]) -> &str {
        match &blocks[0] {
            ToolContent::Text { text } => text,
            other => panic!("expected text block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/notes.md");
        let path_str = path.to_str().unwrap();

        WriteFileTool
            .execute(&json!({"path": path_str, "content": "# Title\nbody"}))
            .await
            .unwrap();
        let blocks = ReadFileTool
            .execute(&json!({"path": path_str}))
            .await
            .unwrap();

        assert_eq!(text_of(&blocks), "# Title\nbody");
    }

    #[tokio::test]
    async fn write_refuses_directory_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("target");
        std::fs::create_dir(&dir).unwrap();

        let err = WriteFileTool
            .execute(&json!({"path": dir.to_str().unwrap(), "content": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::IsDirectory(_)));
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn read_missing_file_and_directory_fail() {
        let tmp = TempDir::new().unwrap();

        let missing = ReadFileTool
            .execute(&json!({"path": tmp.path().join("nope.txt").to_str().unwrap()}))
            .await
            .unwrap_err();
        assert!(matches!(missing, ToolError::FileNotFound(_)));

        let dir = ReadFileTool
            .execute(&json!({"path": tmp.path().to_str().unwrap()}))
            .await
            .unwrap_err();
        assert!(matches!(dir, ToolError::IsDirectory(_)));
    }

    #[tokio::test]
    async fn read_binary_file_is_hex_encoded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.bin");
        std::fs::write(&path, [0xde, 0xad, 0xbe, 0xef]).unwrap();

        let blocks = ReadFileTool
            .execute(&json!({"path": path.to_str().unwrap()}))
            .await
            .unwrap();

        assert_eq!(
            blocks[0],
            ToolContent::Bytes {
                encoding: "hex".into(),
                data: "deadbeef".into()
            }
        );
    }

    #[tokio::test]
    async fn mkdir_honors_exist_ok() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b");
        let dir_str = dir.to_str().unwrap();

        MkdirTool.execute(&json!({"path": dir_str})).await.unwrap();
        assert!(dir.is_dir());

        MkdirTool.execute(&json!({"path": dir_str})).await.unwrap();
        MkdirTool
            .execute(&json!({"path": dir_str, "exist_ok": true}))
            .await
            .unwrap();

        let err = MkdirTool
            .execute(&json!({"path": dir_str, "exist_ok": false}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn mkdir_over_file_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let err = MkdirTool
            .execute(&json!({"path": file.to_str().unwrap()}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn missing_arguments_are_reported() {
        let err = WriteFileTool
            .execute(&json!({"path": "/tmp/whatever"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref k) if k == "content"));
    }
}
