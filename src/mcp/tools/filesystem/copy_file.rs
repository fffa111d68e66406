use async_trait::async_trait;
use serde_json::Value;
use std::fs::FileTimes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::mcp::tools::filesystem::{is_directory, occupied, require_parent};
use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolOutput, TransferParams,
    parse_params, transfer_schema,
};

/// Copy a file, or a whole directory tree when `source` is a directory.
///
/// A file copied onto an existing directory lands inside it under its own
/// name; an existing destination file is overwritten unless it is the source
/// itself. A directory copy requires a destination that does not exist yet
/// and lies outside the source tree.
pub async fn copy_file(
    context: &ExecutionContext,
    source: &str,
    destination: &str,
) -> Result<(PathBuf, PathBuf), ToolError> {
    let real_source = context.resolve(source);
    let real_destination = context.resolve(destination);

    let metadata = fs::metadata(&real_source)
        .await
        .map_err(|e| ToolError::io("copy", &real_source, e))?;
    let copy_directory = metadata.is_dir();

    let target = if copy_directory {
        if occupied(&real_destination).await {
            return Err(ToolError::AlreadyExists(real_destination));
        }
        real_destination
    } else if is_directory(&real_destination).await {
        match real_source.file_name() {
            Some(name) => real_destination.join(name),
            None => return Err(ToolError::InvalidParams(format!(
                "Cannot copy {} into a directory",
                real_source.display()
            ))),
        }
    } else {
        real_destination
    };
    require_parent(&target).await?;

    if copy_directory {
        reject_nested_target(&real_source, &target).await?;
    } else if same_file(&real_source, &target).await {
        return Err(ToolError::SameFile(target));
    }

    let (from, to) = (real_source.clone(), target.clone());
    tokio::task::spawn_blocking(move || {
        if copy_directory {
            copy_tree(&from, &to)
        } else {
            copy_with_metadata(&from, &to)
        }
    })
    .await
    .map_err(|e| ToolError::Internal(format!("Copy task failed: {}", e)))??;

    info!("Copied {} to {}", real_source.display(), target.display());
    Ok((real_source, target))
}

/// Whether both paths name one existing file, through symlinks or hard links
async fn same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(a).await, fs::metadata(b).await) {
            (Ok(first), Ok(second)) => first.dev() == second.dev() && first.ino() == second.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
            (Ok(first), Ok(second)) => first == second,
            _ => false,
        }
    }
}

/// A directory may not be copied to a path inside its own tree
async fn reject_nested_target(source: &Path, target: &Path) -> Result<(), ToolError> {
    let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
        return Ok(());
    };
    let source = fs::canonicalize(source)
        .await
        .map_err(|e| ToolError::io("copy", source, e))?;
    let parent = fs::canonicalize(parent)
        .await
        .map_err(|e| ToolError::io("access", parent, e))?;

    if parent.join(name).starts_with(&source) {
        return Err(ToolError::IntoItself {
            directory: source,
            destination: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Copy contents and permissions, then carry over access and modification times
pub(crate) fn copy_with_metadata(source: &Path, target: &Path) -> Result<(), ToolError> {
    std::fs::copy(source, target).map_err(|e| ToolError::io("copy", source, e))?;

    let metadata = std::fs::metadata(source).map_err(|e| ToolError::io("read", source, e))?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    // Owners may set timestamps through a read-only handle on Unix
    #[cfg(unix)]
    let file = std::fs::File::open(target);
    #[cfg(not(unix))]
    let file = std::fs::File::options().write(true).open(target);

    if let Err(e) = file.and_then(|file| file.set_times(times)) {
        warn!("Could not preserve timestamps on {}: {}", target.display(), e);
    }
    Ok(())
}

/// Recursively copy `source` to `target`, following symlinks like a plain walk
pub(crate) fn copy_tree(source: &Path, target: &Path) -> Result<(), ToolError> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            match e.into_io_error() {
                Some(io_error) => ToolError::io("read", path, io_error),
                None => ToolError::Internal(format!("Filesystem loop at {}", path.display())),
            }
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ToolError::Internal(e.to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)
                .map_err(|e| ToolError::io("create folder", &destination, e))?;
        } else {
            copy_with_metadata(entry.path(), &destination)?;
        }
    }
    Ok(())
}

/// Copy file tool
pub struct CopyFileTool;

#[async_trait]
impl MCPTool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copy a file or folder from source to destination. You can use shortcuts like 'desktop/file.txt' for paths."
    }

    fn input_schema(&self) -> Value {
        transfer_schema()
    }

    fn error_prefix(&self) -> &str {
        "Error copying file"
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only: false,
            destructive: true,
            idempotent: false,
        }
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: TransferParams = parse_params(params)?;
        let (real_source, target) = copy_file(context, &params.source, &params.destination).await?;

        Ok(ToolOutput::Text(format!(
            "Copied from {} to {} successfully",
            real_source.display(),
            target.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::filesystem::delete_file::delete_file;
    use crate::mcp::tools::test_support::Sandbox;
    use std::time::{Duration, SystemTime};

    #[tokio::test]
    async fn test_copies_file_and_preserves_mtime() {
        let sandbox = Sandbox::new();
        let original = sandbox.home().join("Desktop").join("report.txt");
        sandbox.write(&original, "quarterly");

        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        std::fs::File::options()
            .write(true)
            .open(&original)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let (_, target) = copy_file(&sandbox.context, "desktop/report.txt", "documents/copy.txt")
            .await
            .unwrap();

        assert_eq!(target, sandbox.home().join("Documents").join("copy.txt"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "quarterly");
        assert_eq!(std::fs::metadata(&target).unwrap().modified().unwrap(), old);
    }

    #[tokio::test]
    async fn test_copy_into_existing_directory() {
        let sandbox = Sandbox::new();
        sandbox.write(&sandbox.work().join("a.txt"), "a");

        let (_, target) = copy_file(&sandbox.context, "a.txt", "documents").await.unwrap();

        assert_eq!(target, sandbox.home().join("Documents").join("a.txt"));
        assert!(sandbox.work().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_copies_directory_tree() {
        let sandbox = Sandbox::new();
        let project = sandbox.work().join("project");
        sandbox.write(&project.join("README.md"), "readme");
        sandbox.write(&project.join("src").join("lib.rs"), "lib");
        std::fs::create_dir_all(project.join("empty")).unwrap();

        copy_file(&sandbox.context, "project", "home/backup").await.unwrap();

        let backup = sandbox.home().join("backup");
        assert_eq!(std::fs::read_to_string(backup.join("README.md")).unwrap(), "readme");
        assert_eq!(std::fs::read_to_string(backup.join("src").join("lib.rs")).unwrap(), "lib");
        assert!(backup.join("empty").is_dir());
    }

    #[tokio::test]
    async fn test_directory_copy_refuses_existing_destination() {
        let sandbox = Sandbox::new();
        std::fs::create_dir_all(sandbox.work().join("project")).unwrap();

        let error = copy_file(&sandbox.context, "project", "desktop").await.unwrap_err();
        assert!(matches!(error, ToolError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let sandbox = Sandbox::new();

        let error = copy_file(&sandbox.context, "ghost.txt", "desktop").await.unwrap_err();
        assert!(matches!(error, ToolError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_onto_itself_keeps_contents() {
        let sandbox = Sandbox::new();
        let original = sandbox.work().join("a.txt");
        sandbox.write(&original, "precious");

        let error = copy_file(&sandbox.context, "a.txt", ".").await.unwrap_err();
        assert!(matches!(error, ToolError::SameFile(_)));

        let error = copy_file(&sandbox.context, "a.txt", "a.txt").await.unwrap_err();
        assert!(matches!(error, ToolError::SameFile(_)));

        assert_eq!(std::fs::read_to_string(&original).unwrap(), "precious");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_onto_hard_link_is_rejected() {
        let sandbox = Sandbox::new();
        let original = sandbox.work().join("a.txt");
        sandbox.write(&original, "precious");
        std::fs::hard_link(&original, sandbox.work().join("b.txt")).unwrap();

        let error = copy_file(&sandbox.context, "a.txt", "b.txt").await.unwrap_err();

        assert!(matches!(error, ToolError::SameFile(_)));
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "precious");
    }

    #[tokio::test]
    async fn test_directory_copy_into_own_subtree_is_rejected() {
        let sandbox = Sandbox::new();
        let project = sandbox.work().join("project");
        sandbox.write(&project.join("src").join("lib.rs"), "lib");

        let error = copy_file(&sandbox.context, "project", "project/backup")
            .await
            .unwrap_err();
        assert!(matches!(error, ToolError::IntoItself { .. }));

        let error = copy_file(&sandbox.context, "project", "project/src/nested")
            .await
            .unwrap_err();
        assert!(matches!(error, ToolError::IntoItself { .. }));

        assert!(!project.join("backup").exists());
        assert!(!project.join("src").join("nested").exists());
    }

    #[tokio::test]
    async fn test_directory_copy_to_sibling_with_shared_prefix() {
        let sandbox = Sandbox::new();
        sandbox.write(&sandbox.work().join("project").join("a.txt"), "a");

        copy_file(&sandbox.context, "project", "project-copy").await.unwrap();

        assert!(sandbox.work().join("project-copy").join("a.txt").is_file());
    }

    #[tokio::test]
    async fn test_deleting_copy_leaves_original() {
        let sandbox = Sandbox::new();
        let original = sandbox.work().join("keep.txt");
        sandbox.write(&original, "precious");
        let before = std::fs::metadata(&original).unwrap();

        copy_file(&sandbox.context, "keep.txt", "copy.txt").await.unwrap();
        delete_file(&sandbox.context, "copy.txt").await.unwrap();

        let after = std::fs::metadata(&original).unwrap();
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "precious");
        assert_eq!(before.len(), after.len());
        assert_eq!(before.modified().unwrap(), after.modified().unwrap());
        assert_eq!(before.permissions(), after.permissions());
        assert!(!sandbox.work().join("copy.txt").exists());
    }
}
