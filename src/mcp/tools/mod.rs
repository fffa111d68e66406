/// MCP Tools module - tool trait, execution context and result shapes
///
/// Every tool resolves its own path arguments through the execution context
/// and reports failure through `ToolError`. The registry is the single place
/// where errors become `isError` results.
pub mod filesystem;
pub mod registry;

// Re-export core tool types
pub use self::registry::{ToolInfo, ToolRegistry};
pub use crate::mcp::errors::ToolError;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::locations::{LocationRegistry, PathResolver};

/// Core trait that all MCP tools must implement
#[async_trait]
pub trait MCPTool: Send + Sync {
    /// Get the tool name (unique identifier)
    fn name(&self) -> &str;

    /// Get the tool description shown to clients
    fn description(&self) -> &str;

    /// Get the JSON schema for input parameters
    fn input_schema(&self) -> Value;

    /// Behavioural hints advertised in `tools/list`
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::default()
    }

    /// Prefix for the message of a failed call, e.g. "Error creating folder"
    fn error_prefix(&self) -> &str {
        "Error"
    }

    /// Execute the tool with already-validated parameters
    async fn execute(&self, params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError>;
}

/// Per-call view of the host: the shared location registry and the process
/// working directory captured when the call arrived
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub working_directory: PathBuf,
    pub locations: Arc<LocationRegistry>,
}

impl ExecutionContext {
    pub fn new(working_directory: impl Into<PathBuf>, locations: Arc<LocationRegistry>) -> Self {
        Self {
            working_directory: working_directory.into(),
            locations,
        }
    }

    /// Capture the current process working directory
    pub fn capture(locations: Arc<LocationRegistry>) -> Self {
        let working_directory = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from(std::path::MAIN_SEPARATOR_STR));
        Self::new(working_directory, locations)
    }

    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.locations, &self.working_directory)
    }

    /// Resolve a caller path expression to an absolute path
    pub fn resolve(&self, expression: &str) -> PathBuf {
        self.resolver().resolve(expression)
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}

/// Successful payload of a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A single message
    Text(String),
    /// A list of strings
    Lines(Vec<String>),
    /// A JSON object
    Record(Value),
}

/// Tool hints as defined by MCP; clients use them to decide on confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    #[serde(rename = "readOnlyHint")]
    pub read_only: bool,
    #[serde(rename = "destructiveHint")]
    pub destructive: bool,
    #[serde(rename = "idempotentHint")]
    pub idempotent: bool,
}

impl Default for ToolAnnotations {
    fn default() -> Self {
        Self {
            read_only: false,
            destructive: true,
            idempotent: false,
        }
    }
}

impl ToolAnnotations {
    pub const READ_ONLY: Self = Self {
        read_only: true,
        destructive: false,
        idempotent: true,
    };
}

/// Content types that tools can return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text content
    #[serde(rename = "text")]
    Text { text: String },
}

/// Tool execution result as sent in a `tools/call` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,

    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Text(text) => Self {
                content: vec![Content::Text { text }],
                structured_content: None,
                is_error: false,
            },
            ToolOutput::Lines(lines) => Self {
                content: lines
                    .iter()
                    .map(|line| Content::Text { text: line.clone() })
                    .collect(),
                structured_content: Some(json!({ "result": lines })),
                is_error: false,
            },
            ToolOutput::Record(record) => Self {
                content: vec![Content::Text {
                    text: serde_json::to_string_pretty(&record).unwrap_or_else(|_| record.to_string()),
                }],
                structured_content: Some(record),
                is_error: false,
            },
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: error.into() }],
            structured_content: None,
            is_error: true,
        }
    }

    /// Text of all content items joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|Content::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Deserialize tool arguments into their typed form
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Arguments of tools that take a single path expression
#[derive(Debug, Clone, Deserialize)]
pub struct PathParams {
    pub path: String,
}

/// Arguments of tools that take a source and a destination
#[derive(Debug, Clone, Deserialize)]
pub struct TransferParams {
    pub source: String,
    pub destination: String,
}

/// Schema for a single required path argument
pub fn path_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": description
            }
        },
        "required": ["path"]
    })
}

/// Schema for a source/destination pair
pub fn transfer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "source": {
                "type": "string",
                "description": "Path to move or copy from, e.g. 'desktop/report.pdf'"
            },
            "destination": {
                "type": "string",
                "description": "Target path, e.g. 'documents/archive/report.pdf'"
            }
        },
        "required": ["source", "destination"]
    })
}

/// Schema for tools without arguments
pub fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}
