use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::tools::{
    ExecutionContext, MCPTool, ToolAnnotations, ToolError, ToolOutput, empty_schema,
};

/// Report the working directory relative paths are resolved against
pub struct CurrentDirectoryTool;

#[async_trait]
impl MCPTool for CurrentDirectoryTool {
    fn name(&self) -> &str {
        "get_current_directory"
    }

    fn description(&self) -> &str {
        "Get the current working directory that relative paths are resolved against."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::READ_ONLY
    }

    fn error_prefix(&self) -> &str {
        "Error getting current directory"
    }

    async fn execute(&self, _params: Value, context: &ExecutionContext) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::Text(context.working_directory().display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::test_support::Sandbox;
    use serde_json::json;

    #[tokio::test]
    async fn test_reports_context_directory() {
        let sandbox = Sandbox::new();

        let output = CurrentDirectoryTool
            .execute(json!({}), &sandbox.context)
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::Text(sandbox.work().display().to_string()));
    }

    #[tokio::test]
    async fn test_dot_resolves_to_reported_directory() {
        let sandbox = Sandbox::new();

        let output = CurrentDirectoryTool
            .execute(json!({}), &sandbox.context)
            .await
            .unwrap();

        assert_eq!(
            output,
            ToolOutput::Text(sandbox.context.resolve(".").display().to_string())
        );
    }
}
