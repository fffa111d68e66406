use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::mcp::tools::filesystem::require_directory;
use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolOutput, parse_params,
};

#[derive(Debug, Deserialize)]
struct LocateParams {
    pattern: String,
    #[serde(default = "default_search_dir")]
    search_dir: String,
}

fn default_search_dir() -> String {
    ".".to_string()
}

/// Result of a recursive search; an empty `paths` is still a success
#[derive(Debug, Clone)]
pub struct LocateMatches {
    pub pattern: String,
    pub directory: PathBuf,
    pub paths: Vec<PathBuf>,
}

impl LocateMatches {
    pub fn to_lines(&self) -> Vec<String> {
        if self.paths.is_empty() {
            return vec![format!(
                "No files found matching pattern '{}' in '{}'",
                self.pattern,
                self.directory.display()
            )];
        }
        self.paths
            .iter()
            .map(|path| path.display().to_string())
            .collect()
    }
}

/// Find every path under `search_dir` (at any depth) whose name matches `pattern`
pub async fn locate_file(
    context: &ExecutionContext,
    pattern: &str,
    search_dir: &str,
) -> Result<LocateMatches, ToolError> {
    let directory = context.resolve(search_dir);
    require_directory("search", &directory).await?;

    let full_pattern = format!(
        "{}/**/{}",
        Pattern::escape(&directory.to_string_lossy()),
        pattern
    );
    debug!("Searching with pattern {}", full_pattern);

    let user_pattern = pattern.to_string();
    let paths = tokio::task::spawn_blocking(move || collect_matches(&full_pattern, &user_pattern))
        .await
        .map_err(|e| ToolError::Internal(format!("Search task failed: {}", e)))??;

    Ok(LocateMatches {
        pattern: pattern.to_string(),
        directory,
        paths,
    })
}

fn collect_matches(full_pattern: &str, user_pattern: &str) -> Result<Vec<PathBuf>, ToolError> {
    let options = MatchOptions {
        case_sensitive: !cfg!(windows),
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = glob::glob_with(full_pattern, options).map_err(|e| ToolError::InvalidPattern {
        pattern: user_pattern.to_string(),
        reason: e.msg.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e.error()),
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Locate file tool
pub struct LocateFileTool;

#[async_trait]
impl MCPTool for LocateFileTool {
    fn name(&self) -> &str {
        "locate_file"
    }

    fn description(&self) -> &str {
        "Locate files matching the pattern in the search directory and all of its subdirectories. You can use shortcuts like 'desktop' for the search_dir."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match file names against, e.g. '*.pdf'"
                },
                "search_dir": {
                    "type": "string",
                    "description": "Directory to search in",
                    "default": "."
                }
            },
            "required": ["pattern"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn error_prefix(&self) -> &str {
        "Error locating files"
    }

    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let params: LocateParams = parse_params(params)?;
        let matches = locate_file(context, &params.pattern, &params.search_dir).await?;
        Ok(ToolOutput::Lines(matches.to_lines()))
    }
}
