use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::mcp::tools::filesystem::require_directory;
use crate::mcp::tools::{
    ExecutionContext, MCPTool, PathParams, ToolAnnotations, ToolError, ToolOutput, parse_params,
    path_schema,
};

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryListing {
    pub path: PathBuf,
    pub entries: Vec<ListedEntry>,
}

impl DirectoryListing {
    /// Header line followed by `name (folder|file)` per entry
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push(format!("Contents of {}:", self.path.display()));
        lines.extend(self.entries.iter().map(|entry| {
            format!(
                "{} ({})",
                entry.name,
                if entry.is_dir { "folder" } else { "file" }
            )
        }));
        lines
    }
}

/// List the immediate children of a directory, sorted by name
pub async fn list_files(context: &ExecutionContext, path: &str) -> Result<DirectoryListing, ToolError> {
    let real_path = context.resolve(path);
    require_directory("list", &real_path).await?;

    let mut dir = fs::read_dir(&real_path)
        .await
        .map_err(|e| ToolError::io("list", &real_path, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| ToolError::io("list", &real_path, e))?
    {
        // Symlinked directories count as folders
        let is_dir = fs::metadata(entry.path())
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);

        entries.push(ListedEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    debug!("Listed {} ({} entries)", real_path.display(), entries.len());
    Ok(DirectoryListing {
        path: real_path,
        entries,
    })
}

/// List files tool
pub struct ListFilesTool;

#[async_trait]
impl MCPTool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List all files and folders in the specified directory. You can use shortcuts like 'desktop' to refer to system locations."
    }

    fn input_schema(&self) -> Value {
        path_schema("Directory to list, e.g. 'downloads'")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn error_prefix(&self) -> &str {
        "Error listing files"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: PathParams = parse_params(params)?;
        let listing = list_files(context, &params.path).await?;
        Ok(ToolOutput::Lines(listing.to_lines()))
    }
}
