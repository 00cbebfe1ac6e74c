//! File tools - Read, write, and list files

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolContext, ToolDefinition, ToolResult};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::debug;

const DEFAULT_MAX_BYTES: u64 = 1_048_576;
const MAX_READ_BYTES: u64 = 16 * 1_048_576;
const DEFAULT_MAX_ENTRIES: usize = 1000;

fn required_str<'a>(input: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidInput(format!("Missing '{key}' parameter")))
}

// ============================================================================
// File Read Tool
// ============================================================================

/// Tool for reading file contents
pub struct FileReadTool {
    definition: ToolDefinition,
}

impl FileReadTool {
    /// Create a new file read tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("file_read", "Read the contents of a text file")
            .with_category(ToolCategory::File)
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file to read"
                    },
                    "max_bytes": {
                        "type": "integer",
                        "description": "Maximum bytes to read (default: 1MB, at most 16MB)",
                        "default": DEFAULT_MAX_BYTES
                    }
                },
                "required": ["path"]
            }));

        Self { definition }
    }
}

impl Default for FileReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FileReadTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let start = Instant::now();

        let path = required_str(&input, "path")?;
        let max_bytes = input
            .get("max_bytes")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_MAX_BYTES)
            .min(MAX_READ_BYTES);

        debug!(agent = %ctx.agent, path = %path, max_bytes, "Reading file");

        let file = tokio::fs::File::open(PathBuf::from(path)).await?;
        let mut contents = Vec::new();
        // One extra byte tells a file of exactly max_bytes apart from a longer one
        file.take(max_bytes.saturating_add(1)).read_to_end(&mut contents).await?;

        let truncated = contents.len() as u64 > max_bytes;
        contents.truncate(max_bytes as usize);
        let content = String::from_utf8_lossy(&contents).into_owned();

        Ok(ToolResult::success(
            serde_json::json!({
                "content": content,
                "path": path,
                "size": contents.len(),
                "truncated": truncated
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}

// ============================================================================
// File Write Tool
// ============================================================================

/// Tool for writing file contents
pub struct FileWriteTool {
    definition: ToolDefinition,
}

impl FileWriteTool {
    /// Create a new file write tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("file_write", "Write content to a file")
            .with_category(ToolCategory::File)
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file to write"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    },
                    "append": {
                        "type": "boolean",
                        "description": "Append to file instead of overwriting",
                        "default": false
                    }
                },
                "required": ["path", "content"]
            }));

        Self { definition }
    }
}

impl Default for FileWriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FileWriteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let start = Instant::now();

        let path = required_str(&input, "path")?;
        let content = required_str(&input, "content")?;
        let append = input
            .get("append")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        debug!(agent = %ctx.agent, path = %path, append, "Writing file");

        let file_path = PathBuf::from(path);
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if append {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)
                .await?;
            file.write_all(content.as_bytes()).await?;
        } else {
            tokio::fs::write(&file_path, content).await?;
        }

        Ok(ToolResult::success(
            serde_json::json!({
                "path": path,
                "bytes_written": content.len(),
                "append": append
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}

// ============================================================================
// File List Tool
// ============================================================================

/// Tool for listing directory contents
pub struct FileListTool {
    definition: ToolDefinition,
}

impl FileListTool {
    /// Create a new file list tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("file_list", "List contents of a directory")
            .with_category(ToolCategory::File)
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the directory to list"
                    },
                    "recursive": {
                        "type": "boolean",
                        "description": "List recursively",
                        "default": false
                    },
                    "max_entries": {
                        "type": "integer",
                        "description": "Maximum entries to return",
                        "default": DEFAULT_MAX_ENTRIES
                    }
                },
                "required": ["path"]
            }));

        Self { definition }
    }
}

impl Default for FileListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FileListTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let start = Instant::now();

        let path = required_str(&input, "path")?;
        let recursive = input
            .get("recursive")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let max_entries = input
            .get("max_entries")
            .and_then(|v| v.as_u64())
            .map_or(DEFAULT_MAX_ENTRIES, |n| n as usize);

        debug!(agent = %ctx.agent, path = %path, recursive, "Listing directory");

        let mut entries = Vec::new();
        let mut pending = vec![PathBuf::from(path)];
        let mut truncated = false;

        'walk: while let Some(dir_path) = pending.pop() {
            let mut dir = tokio::fs::read_dir(&dir_path).await?;
            while let Some(entry) = dir.next_entry().await? {
                if entries.len() >= max_entries {
                    truncated = true;
                    break 'walk;
                }

                let metadata = entry.metadata().await.ok();
                let is_dir = metadata.as_ref().is_some_and(|m| m.is_dir());
                let size = metadata.as_ref().map_or(0, |m| m.len());

                if is_dir && recursive {
                    pending.push(entry.path());
                }

                entries.push(serde_json::json!({
                    "name": entry.file_name().to_string_lossy(),
                    "path": entry.path().to_string_lossy(),
                    "is_dir": is_dir,
                    "size": size
                }));
            }
        }

        Ok(ToolResult::success(
            serde_json::json!({
                "path": path,
                "count": entries.len(),
                "entries": entries,
                "truncated": truncated
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_llm::SharedState;

    fn ctx() -> ToolContext {
        ToolContext::new("tester", SharedState::new())
    }

    #[test]
    fn test_file_read_definition() {
        let tool = FileReadTool::new();
        let def = tool.definition();

        assert_eq!(def.name, "file_read");
        assert_eq!(def.category, ToolCategory::File);
    }

    #[tokio::test]
    async fn test_file_read_missing_path() {
        let tool = FileReadTool::new();
        let result = tool.execute(serde_json::json!({}), &ctx()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_write_then_read_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        let path_str = path.to_string_lossy().to_string();

        FileWriteTool::new()
            .execute(
                serde_json::json!({"path": path_str, "content": "hello world"}),
                &ctx(),
            )
            .await
            .unwrap();

        let full = FileReadTool::new()
            .execute(serde_json::json!({"path": path_str}), &ctx())
            .await
            .unwrap();
        assert_eq!(full.output["content"], "hello world");
        assert_eq!(full.output["truncated"], false);

        let short = FileReadTool::new()
            .execute(serde_json::json!({"path": path_str, "max_bytes": 5}), &ctx())
            .await
            .unwrap();
        assert_eq!(short.output["content"], "hello");
        assert_eq!(short.output["truncated"], true);
    }

    #[tokio::test]
    async fn test_read_limit_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.txt");
        std::fs::write(&path, "hello").unwrap();

        let result = FileReadTool::new()
            .execute(
                serde_json::json!({"path": path.to_string_lossy(), "max_bytes": u64::MAX}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(result.output["content"], "hello");
        assert_eq!(result.output["truncated"], false);
    }

    #[tokio::test]
    async fn test_list_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "b").unwrap();
        let root = dir.path().to_string_lossy().to_string();

        let flat = FileListTool::new()
            .execute(serde_json::json!({"path": root}), &ctx())
            .await
            .unwrap();
        assert_eq!(flat.output["count"], 2);

        let deep = FileListTool::new()
            .execute(serde_json::json!({"path": root, "recursive": true}), &ctx())
            .await
            .unwrap();
        assert_eq!(deep.output["count"], 3);

        let capped = FileListTool::new()
            .execute(
                serde_json::json!({"path": root, "recursive": true, "max_entries": 1}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(capped.output["truncated"], true);
    }
}
