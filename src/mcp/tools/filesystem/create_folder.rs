use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::mcp::tools::{
    ExecutionContext, MCPTool, PathParams, ToolAnnotations, ToolError, ToolOutput, parse_params,
    path_schema,
};

/// Create a directory and any missing parents; succeeds if it already exists
pub async fn create_folder(context: &ExecutionContext, path: &str) -> Result<PathBuf, ToolError> {
    let real_path = context.resolve(path);

    fs::create_dir_all(&real_path)
        .await
        .map_err(|e| ToolError::io("create folder", &real_path, e))?;

    info!("Created folder: {}", real_path.display());
    Ok(real_path)
}

/// Create folder tool
pub struct CreateFolderTool;

#[async_trait]
impl MCPTool for CreateFolderTool {
    fn name(&self) -> &str {
        "create_folder"
    }

    fn description(&self) -> &str {
        "Create a new folder at the specified path. You can use shortcuts like 'desktop/newfolder'."
    }

    fn input_schema(&self) -> Value {
        path_schema("Folder to create, e.g. 'documents/projects/new'")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only: false,
            destructive: false,
            idempotent: true,
        }
    }

    fn error_prefix(&self) -> &str {
        "Error creating folder"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: PathParams = parse_params(params)?;
        let real_path = create_folder(context, &params.path).await?;

        Ok(ToolOutput::Text(format!(
            "Folder created successfully at {}",
            real_path.display()
        )))
    }
}
