use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::mcp::tools::{
    ExecutionContext, MCPTool, PathParams, ToolAnnotations, ToolError, ToolOutput, parse_params,
    path_schema,
};

/// Delete a file, or a directory with everything below it.
///
/// Symlinks are removed themselves, never their targets.
pub async fn delete_file(context: &ExecutionContext, path: &str) -> Result<PathBuf, ToolError> {
    let real_path = context.resolve(path);

    let metadata = fs::symlink_metadata(&real_path)
        .await
        .map_err(|e| ToolError::io("delete", &real_path, e))?;

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&real_path).await
    } else {
        fs::remove_file(&real_path).await
    };
    removed.map_err(|e| ToolError::io("delete", &real_path, e))?;

    info!("Deleted {}", real_path.display());
    Ok(real_path)
}

/// Delete file tool
pub struct DeleteFileTool;

#[async_trait]
impl MCPTool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file or folder (folders are removed with all their contents). You can use shortcuts like 'desktop/old.txt'."
    }

    fn input_schema(&self) -> Value {
        path_schema("File or folder to delete")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only: false,
            destructive: true,
            idempotent: true,
        }
    }

    fn error_prefix(&self) -> &str {
        "Error deleting"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: PathParams = parse_params(params)?;
        let real_path = delete_file(context, &params.path).await?;

        Ok(ToolOutput::Text(format!("Deleted {} successfully", real_path.display())))
    }
}
