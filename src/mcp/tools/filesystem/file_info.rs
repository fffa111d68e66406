use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

use crate::mcp::tools::{
    ExecutionContext, MCPTool, PathParams, ToolAnnotations, ToolError, ToolOutput, parse_params,
    path_schema,
};

/// Metadata snapshot returned by the `file_info` tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub exists: bool,
    pub is_file: bool,
    pub is_dir: bool,
    pub size_bytes: u64,
    pub modified_time: f64,
    pub created_time: f64,
}

impl FileInfo {
    fn from_metadata(path: String, metadata: &Metadata) -> Self {
        let modified_time = metadata.modified().map(epoch_seconds).unwrap_or(0.0);
        Self {
            path,
            exists: true,
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            size_bytes: metadata.len(),
            modified_time,
            created_time: created_seconds(metadata).unwrap_or(modified_time),
        }
    }
}

fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

fn created_seconds(metadata: &Metadata) -> Option<f64> {
    if let Ok(created) = metadata.created() {
        return Some(epoch_seconds(created));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Some(metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1e9)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Stat `path` (following symlinks)
pub async fn file_info(context: &ExecutionContext, path: &str) -> Result<FileInfo, ToolError> {
    let real_path = context.resolve(path);
    let metadata = fs::metadata(&real_path)
        .await
        .map_err(|e| ToolError::io("stat", &real_path, e))?;

    Ok(FileInfo::from_metadata(
        real_path.display().to_string(),
        &metadata,
    ))
}

/// File info tool
pub struct FileInfoTool;

#[async_trait]
impl MCPTool for FileInfoTool {
    fn name(&self) -> &str {
        "file_info"
    }

    fn description(&self) -> &str {
        "Get information about a file or folder: type, size and timestamps. You can use shortcuts like 'documents/report.pdf'."
    }

    fn input_schema(&self) -> Value {
        path_schema("File or folder to inspect")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn error_prefix(&self) -> &str {
        "Error getting file info"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: PathParams = parse_params(params)?;
        let info = file_info(context, &params.path).await?;

        let record = serde_json::to_value(&info)
            .map_err(|e| ToolError::Internal(format!("Failed to encode file info: {}", e)))?;
        Ok(ToolOutput::Record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::test_support::Sandbox;
    use serde_json::json;

    #[tokio::test]
    async fn test_reports_file_metadata() {
        let sandbox = Sandbox::new();
        let report = sandbox.home().join("Documents").join("report.txt");
        sandbox.write(&report, "12345");

        let info = file_info(&sandbox.context, "documents/report.txt").await.unwrap();

        assert_eq!(info.path, report.display().to_string());
        assert!(info.exists);
        assert!(info.is_file);
        assert!(!info.is_dir);
        assert_eq!(info.size_bytes, 5);
        assert!(info.modified_time > 0.0);
        assert!(info.created_time > 0.0);
    }

    #[tokio::test]
    async fn test_reports_directory() {
        let sandbox = Sandbox::new();

        let info = file_info(&sandbox.context, "desktop").await.unwrap();

        assert!(info.is_dir);
        assert!(!info.is_file);
    }

    #[tokio::test]
    async fn test_record_field_names() {
        let sandbox = Sandbox::new();
        sandbox.write(&sandbox.work().join("a.bin"), "ab");

        let output = FileInfoTool
            .execute(json!({"path": "a.bin"}), &sandbox.context)
            .await
            .unwrap();

        let ToolOutput::Record(record) = output else {
            panic!("expected a record");
        };
        for field in [
            "path",
            "exists",
            "is_file",
            "is_dir",
            "size_bytes",
            "modified_time",
            "created_time",
        ] {
            assert!(record.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(record["size_bytes"], json!(2));
    }

    #[tokio::test]
    async fn test_missing_path_fails() {
        let sandbox = Sandbox::new();

        let error = file_info(&sandbox.context, "nothing/here").await.unwrap_err();
        assert!(matches!(error, ToolError::PathNotFound(_)));
    }
}
