use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::mcp::tools::filesystem::{occupied, require_directory};
use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolOutput, parse_params,
};

#[derive(Debug, Deserialize)]
struct OrganizeParams {
    directory: String,
}

/// Extension of a file name: text after the last dot, never the whole of a dotfile name
pub fn extension_of(file_name: &str) -> Option<&str> {
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(index) => {
            let extension = &file_name[index + 1..];
            (!extension.is_empty()).then_some(extension)
        }
    }
}

/// Move every top-level regular file of `directory` into a subfolder named
/// after its extension. Returns how many files ended up in each folder.
///
/// Files without an extension stay put. A file already present in its
/// extension folder is never overwritten; that stops the run with earlier
/// moves left in place.
pub async fn organize_by_extension(
    context: &ExecutionContext,
    directory: &str,
) -> Result<(PathBuf, BTreeMap<String, usize>), ToolError> {
    let real_path = context.resolve(directory);
    require_directory("organize", &real_path).await?;

    let mut files = Vec::new();
    let mut dir = fs::read_dir(&real_path)
        .await
        .map_err(|e| ToolError::io("list", &real_path, e))?;
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| ToolError::io("list", &real_path, e))?
    {
        let is_file = fs::metadata(entry.path())
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if is_file {
            files.push(entry.file_name());
        }
    }
    files.sort();

    let mut moved: BTreeMap<String, usize> = BTreeMap::new();
    for name in &files {
        let display_name = name.to_string_lossy();
        let Some(extension) = extension_of(&display_name) else {
            debug!("Leaving {} in place, no extension", display_name);
            continue;
        };
        move_into(&real_path, name, extension).await?;
        *moved.entry(extension.to_string()).or_default() += 1;
    }

    info!(
        "Organized {} files in {} into {} folders",
        moved.values().sum::<usize>(),
        real_path.display(),
        moved.len()
    );
    Ok((real_path, moved))
}

async fn move_into(directory: &Path, name: &OsStr, extension: &str) -> Result<(), ToolError> {
    let folder = directory.join(extension);
    fs::create_dir_all(&folder)
        .await
        .map_err(|e| ToolError::io("create folder", &folder, e))?;

    let target = folder.join(name);
    if occupied(&target).await {
        return Err(ToolError::AlreadyExists(target));
    }

    let source = directory.join(name);
    fs::rename(&source, &target)
        .await
        .map_err(|e| ToolError::io("move", &source, e))
}

/// Organize by extension tool
pub struct OrganizeByExtensionTool;

#[async_trait]
impl MCPTool for OrganizeByExtensionTool {
    fn name(&self) -> &str {
        "organize_files_by_extension"
    }

    fn description(&self) -> &str {
        "Organize the files of a directory into subfolders named after their extensions. You can use shortcuts like 'downloads'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory whose files should be organized, e.g. 'downloads'"
                }
            },
            "required": ["directory"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only: false,
            destructive: false,
            idempotent: true,
        }
    }

    fn error_prefix(&self) -> &str {
        "Error organizing files"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: OrganizeParams = parse_params(params)?;
        let (real_path, _) = organize_by_extension(context, &params.directory).await?;

        Ok(ToolOutput::Text(format!(
            "Organized files in {} by extension",
            real_path.display()
        )))
    }
}
