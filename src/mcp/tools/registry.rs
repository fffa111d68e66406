use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::mcp::errors::{ServerError, MCPResult};
use crate::mcp::tools::{ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolResult};

/// Tool information for MCP client discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

struct RegisteredTool {
    tool: Box<dyn MCPTool>,
    schema: JSONSchema,
}

/// Fixed catalog of named tools.
///
/// Built once at startup, then only read. `execute_tool` is the dispatch
/// boundary: apart from an unknown name, every outcome of a call is returned
/// as a `ToolResult`.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, compiling its input schema
    pub fn register_tool(&mut self, tool: Box<dyn MCPTool>) -> MCPResult<()> {
        let name = tool.name().to_string();

        if name.is_empty() {
            return Err(ServerError::InvalidParams("Tool name cannot be empty".to_string()).into());
        }
        if self.tools.contains_key(&name) {
            return Err(ServerError::InvalidParams(format!(
                "Tool '{}' is already registered",
                name
            ))
            .into());
        }

        let input_schema = tool.input_schema();
        let schema = JSONSchema::compile(&input_schema).map_err(|e| {
            ToolError::Internal(format!("Invalid input schema for '{}': {}", name, e))
        })?;

        debug!("Registered tool: {}", name);
        self.tools.insert(name, RegisteredTool { tool, schema });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all available tools, sorted by name
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|registered| ToolInfo {
                name: registered.tool.name().to_string(),
                description: registered.tool.description().to_string(),
                input_schema: registered.tool.input_schema(),
                annotations: registered.tool.annotations(),
            })
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// Only an unknown tool name is an `Err`; invalid arguments and filesystem
    /// failures come back as a `ToolResult` with `is_error` set.
    pub async fn execute_tool(
        &self,
        name: &str,
        params: Option<Value>,
        context: &ExecutionContext,
    ) -> Result<ToolResult, ToolError> {
        let registered = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let tool = registered.tool.as_ref();

        let params = match params {
            Some(Value::Null) | None => json!({}),
            Some(params) => params,
        };

        if let Err(error) = validate_params(&registered.schema, &params) {
            warn!("Rejected arguments for {}: {}", name, error);
            return Ok(ToolResult::failure(format!("{}: {}", tool.error_prefix(), error)));
        }

        let start_time = Instant::now();
        let outcome = tool.execute(params, context).await;
        let elapsed = start_time.elapsed();

        Ok(match outcome {
            Ok(output) => {
                info!("Tool {} succeeded in {:?}", name, elapsed);
                ToolResult::success(output)
            }
            Err(error) => {
                warn!("Tool {} failed in {:?}: {}", name, elapsed, error);
                ToolResult::failure(format!("{}: {}", tool.error_prefix(), error))
            }
        })
    }
}

fn validate_params(schema: &JSONSchema, params: &Value) -> Result<(), ToolError> {
    if let Err(errors) = schema.validate(params) {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(ToolError::InvalidParams(messages.join("; ")));
    }
    Ok(())
}
