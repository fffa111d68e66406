/// File system tools for MCP
///
/// Each tool resolves its path arguments through the location registry
/// (`desktop/notes.txt`, `documents`, `../x`, absolute paths) and performs a
/// single filesystem action. The typed operation functions are public so the
/// same behaviour can be driven without the protocol layer.
pub mod copy_file;
pub mod create_folder;
pub mod current_directory;
pub mod delete_file;
pub mod file_info;
pub mod list_files;
pub mod locate_file;
pub mod locations;
pub mod move_file;
pub mod organize;

pub use self::{
    copy_file::CopyFileTool, create_folder::CreateFolderTool,
    current_directory::CurrentDirectoryTool, delete_file::DeleteFileTool,
    file_info::FileInfoTool, list_files::ListFilesTool, locate_file::LocateFileTool,
    locations::AvailableLocationsTool, move_file::MoveFileTool, organize::OrganizeByExtensionTool,
};

use std::path::Path;
use tokio::fs;

use crate::mcp::tools::{MCPTool, ToolError};

/// The full tool catalog, in no particular order
pub fn builtin_tools() -> Vec<Box<dyn MCPTool>> {
    vec![
        Box::new(CreateFolderTool),
        Box::new(ListFilesTool),
        Box::new(LocateFileTool),
        Box::new(MoveFileTool),
        Box::new(CopyFileTool),
        Box::new(DeleteFileTool),
        Box::new(CurrentDirectoryTool),
        Box::new(OrganizeByExtensionTool),
        Box::new(FileInfoTool),
        Box::new(AvailableLocationsTool),
    ]
}

/// Whether anything (including a dangling symlink) sits at `path`
pub(crate) async fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

pub(crate) async fn is_directory(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}

/// Fail unless `path` exists and is a directory
pub(crate) async fn require_directory(action: &'static str, path: &Path) -> Result<(), ToolError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| ToolError::io(action, path, e))?;
    if !metadata.is_dir() {
        return Err(ToolError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Destination parents are never created implicitly
pub(crate) async fn require_parent(path: &Path) -> Result<(), ToolError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => require_directory("access", parent).await,
        _ => Ok(()),
    }
}
