use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::mcp::tools::filesystem::copy_file::{copy_tree, copy_with_metadata};
use crate::mcp::tools::filesystem::{is_directory, occupied, require_parent};
use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolError, ToolOutput, TransferParams, parse_params,
    transfer_schema,
};

/// Move or rename a file or directory.
///
/// Moving onto an existing directory places the source inside it. The final
/// target must not exist and its parent must; nothing is created on the way.
/// Moves across filesystems fall back to copy-then-delete.
pub async fn move_file(
    context: &ExecutionContext,
    source: &str,
    destination: &str,
) -> Result<(PathBuf, PathBuf), ToolError> {
    let real_source = context.resolve(source);
    let real_destination = context.resolve(destination);

    let metadata = fs::symlink_metadata(&real_source)
        .await
        .map_err(|e| ToolError::io("move", &real_source, e))?;

    let target = if is_directory(&real_destination).await {
        match real_source.file_name() {
            Some(name) => real_destination.join(name),
            None => {
                return Err(ToolError::InvalidParams(format!(
                    "Cannot move {} into a directory",
                    real_source.display()
                )));
            }
        }
    } else {
        real_destination
    };

    if occupied(&target).await {
        return Err(ToolError::AlreadyExists(target));
    }
    require_parent(&target).await?;

    match fs::rename(&real_source, &target).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!("Cross-device move, copying {} first", real_source.display());
            let (from, to, is_dir) = (real_source.clone(), target.clone(), metadata.is_dir());
            tokio::task::spawn_blocking(move || {
                if is_dir {
                    copy_tree(&from, &to)
                } else {
                    copy_with_metadata(&from, &to)
                }
            })
            .await
            .map_err(|e| ToolError::Internal(format!("Copy task failed: {}", e)))??;

            let removed = if metadata.is_dir() {
                fs::remove_dir_all(&real_source).await
            } else {
                fs::remove_file(&real_source).await
            };
            removed.map_err(|e| ToolError::io("remove moved source", &real_source, e))?;
        }
        Err(e) => return Err(ToolError::io("move", &real_source, e)),
    }

    info!("Moved {} to {}", real_source.display(), target.display());
    Ok((real_source, target))
}

/// Move file tool
pub struct MoveFileTool;

#[async_trait]
impl MCPTool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move a file or folder from source to destination. You can use shortcuts like 'desktop/file.txt' for paths."
    }

    fn input_schema(&self) -> Value {
        transfer_schema()
    }

    fn error_prefix(&self) -> &str {
        "Error moving file"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: TransferParams = parse_params(params)?;
        let (real_source, target) = move_file(context, &params.source, &params.destination).await?;

        Ok(ToolOutput::Text(format!(
            "Moved from {} to {} successfully",
            real_source.display(),
            target.display()
        )))
    }
}
