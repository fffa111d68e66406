use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolOutput, empty_schema,
};

/// Advertise the symbolic locations that currently exist on disk
pub struct AvailableLocationsTool;

#[async_trait]
impl MCPTool for AvailableLocationsTool {
    fn name(&self) -> &str {
        "get_available_locations"
    }

    fn description(&self) -> &str {
        "Get the list of location shortcuts (like 'desktop' or 'downloads') and the folders they point to."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn error_prefix(&self) -> &str {
        "Error getting locations"
    }

    async fn execute(&self, _params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        let record: Map<String, Value> = context
            .locations
            .existing()
            .into_iter()
            .map(|(name, path)| (name, Value::String(path.display().to_string())))
            .collect();
        Ok(ToolOutput::Record(Value::Object(record)))
    }
}
