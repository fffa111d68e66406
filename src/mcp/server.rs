/// MCP Server - dispatches JSON-RPC requests to the tool registry
///
/// One connection is served at a time and requests are handled strictly in
/// arrival order. The working directory is captured per tool call, so a
/// process-level `chdir` made before serving is honoured.
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::locations::LocationRegistry;
use crate::mcp::{
    MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION,
    errors::{JsonRpcError, MCPError, MCPResult, ProtocolError, ServerError, TransportError},
    protocol::{
        CallToolParams, InitializeParams, InitializeResult, MCPMessage, MCPNotification,
        MCPRequest, ServerCapabilities, ServerInfo, ToolsCapability,
    },
    tools::{ExecutionContext, ToolError, ToolRegistry, filesystem::builtin_tools},
    transport::MCPTransport,
};

/// MCP Server implementation
pub struct MCPServer {
    /// Tool registry, fixed after construction
    tools: ToolRegistry,

    /// Symbolic locations shared with every tool call
    locations: Arc<LocationRegistry>,
}

impl MCPServer {
    /// Create a server with the built-in filesystem tools registered
    pub fn new(locations: LocationRegistry) -> MCPResult<Self> {
        let mut tools = ToolRegistry::new();
        for tool in builtin_tools() {
            tools.register_tool(tool)?;
        }
        info!("Registered {} built-in tools", tools.len());

        Ok(Self {
            tools,
            locations: Arc::new(locations),
        })
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Serve one connection until the peer closes its end
    pub async fn handle_connection<T: MCPTransport + ?Sized>(&self, transport: &mut T) -> MCPResult<()> {
        info!("{} v{} serving connection", SERVER_NAME, SERVER_VERSION);
        let start_time = Instant::now();
        let mut handled: u64 = 0;

        loop {
            match transport.receive().await {
                Ok(message) => {
                    handled += 1;
                    if let Some(reply) = self.handle_message(message).await {
                        transport.send(reply).await?;
                    }
                }
                Err(MCPError::Transport(TransportError::Closed)) => {
                    debug!("Peer closed the connection");
                    break;
                }
                Err(MCPError::Protocol(e)) => {
                    // The id of an unreadable message is unknown
                    warn!("Rejected incoming message: {}", e);
                    let reply = MCPMessage::error_response(Value::Null, JsonRpcError::from(e));
                    transport.send(reply).await?;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    return Err(e);
                }
            }

            if !transport.is_connected() {
                break;
            }
        }

        info!(
            "Connection finished after {} messages ({:?})",
            handled,
            start_time.elapsed()
        );
        Ok(())
    }

    /// Handle a single message, returning the reply to send if any
    pub async fn handle_message(&self, message: MCPMessage) -> Option<MCPMessage> {
        if message.is_request() {
            match message.as_request() {
                Ok(request) => Some(self.handle_request(request).await),
                Err(e) => Some(MCPMessage::error_response(
                    message.id.clone().unwrap_or(Value::Null),
                    JsonRpcError::from(e),
                )),
            }
        } else if message.is_notification() {
            if let Ok(notification) = message.as_notification() {
                self.handle_notification(notification);
            }
            None
        } else {
            warn!("Ignoring unexpected response message");
            None
        }
    }

    /// Handle a request message
    async fn handle_request(&self, request: MCPRequest) -> MCPMessage {
        debug!("Request {}: {}", request.id, request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_tool_call(request.params).await,
            _ => Err(MCPError::Server(ServerError::MethodNotFound(request.method.clone()))),
        };

        match response {
            Ok(result) => MCPMessage::response(request.id, result),
            Err(error) => {
                warn!("Request {} failed: {}", request.method, error);
                MCPMessage::error_response(request.id, JsonRpcError::from(error))
            }
        }
    }

    fn handle_notification(&self, notification: MCPNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => info!("Client finished initialization"),
            other => debug!("Ignoring notification {}", other),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> MCPResult<Value> {
        if let Some(params) = params {
            let init_params: InitializeParams = serde_json::from_value(params)
                .map_err(|e| MCPError::Server(ServerError::InvalidParams(e.to_string())))?;
            if let Some(client) = &init_params.client_info {
                info!("Client connected: {} {}", client.name, client.version);
            }
            if let Some(version) = &init_params.protocol_version {
                if version != MCP_PROTOCOL_VERSION {
                    debug!("Client asked for protocol {}, offering {}", version, MCP_PROTOCOL_VERSION);
                }
            }
        }

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            instructions: Some(
                "File tools accept location shortcuts such as 'desktop/notes.txt' or 'downloads'. \
                 Call get_available_locations to see them."
                    .to_string(),
            ),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> MCPResult<Value> {
        Ok(json!({ "tools": self.tools.list_tools() }))
    }

    /// Handle tool call request
    async fn handle_tool_call(&self, params: Option<Value>) -> MCPResult<Value> {
        let params = params.ok_or_else(|| {
            MCPError::Protocol(ProtocolError::InvalidParams("Missing parameters".to_string()))
        })?;
        let call: CallToolParams = serde_json::from_value(params)
            .map_err(|e| MCPError::Server(ServerError::InvalidParams(e.to_string())))?;

        let context = ExecutionContext::capture(self.locations.clone());
        let result = self
            .tools
            .execute_tool(&call.name, call.arguments, &context)
            .await
            .map_err(|e| match e {
                ToolError::NotFound(name) => MCPError::Server(ServerError::UnknownTool(name)),
                other => MCPError::ToolExecution(other),
            })?;

        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::transport::LineTransport;
    use tempfile::TempDir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server_for(dir: &TempDir) -> MCPServer {
        let locations = LocationRegistry::default()
            .with_location("home", dir.path())
            .with_location("desktop", dir.path().join("Desktop"));
        MCPServer::new(locations).unwrap()
    }

    async fn call(server: &MCPServer, id: i64, method: &str, params: Value) -> Value {
        let request = MCPMessage::request_with_id(json!(id), method, Some(params));
        let reply = server.handle_message(request).await.unwrap();
        serde_json::to_value(reply).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = call(&server, 1, "initialize", json!({"protocolVersion": "2024-11-05"})).await;

        assert_eq!(reply["id"], json!(1));
        assert_eq!(reply["result"]["protocolVersion"], json!(MCP_PROTOCOL_VERSION));
        assert_eq!(reply["result"]["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = call(&server, 2, "tools/list", json!({})).await;
        let names: Vec<&str> = reply["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();

        assert_eq!(names.len(), 10);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(
            reply["result"]["tools"][0]["inputSchema"]["type"],
            json!("object")
        );
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result_not_an_error() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);
        let missing = dir.path().join("missing");

        let reply = call(
            &server,
            3,
            "tools/call",
            json!({"name": "list_files", "arguments": {"path": missing.display().to_string()}}),
        )
        .await;

        assert!(reply.get("error").is_none());
        assert_eq!(reply["result"]["isError"], json!(true));
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error listing files: "), "{}", text);
    }

    #[tokio::test]
    async fn test_schema_violation_is_reported_in_result() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = call(
            &server,
            4,
            "tools/call",
            json!({"name": "move_file", "arguments": {"source": "a"}}),
        )
        .await;

        assert_eq!(reply["result"]["isError"], json!(true));
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error moving file: Invalid parameters"), "{}", text);
    }

    #[tokio::test]
    async fn test_tool_call_resolves_locations() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = call(
            &server,
            5,
            "tools/call",
            json!({"name": "create_folder", "arguments": {"path": "desktop/projects"}}),
        )
        .await;

        assert_eq!(reply["result"]["isError"], json!(false));
        assert!(dir.path().join("Desktop").join("projects").is_dir());
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method_codes() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = call(&server, 6, "tools/call", json!({"name": "format_disk"})).await;
        assert_eq!(reply["error"]["code"], json!(-32602));

        let reply = call(&server, 7, "resources/list", json!({})).await;
        assert_eq!(reply["error"]["code"], json!(-32601));
        assert_eq!(reply["id"], json!(7));
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let reply = server
            .handle_message(MCPMessage::notification("notifications/initialized", None))
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_connection_answers_in_order_and_survives_garbage() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, mut client_write) = tokio::io::split(client);

        client_write
            .write_all(
                concat!(
                    "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
                    "this is not json\n",
                    "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
                    "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut transport = LineTransport::new(server_read, server_write);
        server.handle_connection(&mut transport).await.unwrap();
        drop(transport);

        let mut lines = BufReader::new(client_read).lines();
        let mut replies = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            replies.push(serde_json::from_str::<Value>(&line).unwrap());
        }

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], json!(1));
        assert_eq!(replies[0]["result"], json!({}));
        assert_eq!(replies[1]["id"], Value::Null);
        assert_eq!(replies[1]["error"]["code"], json!(-32700));
        assert_eq!(replies[2]["id"], json!(2));
        assert!(replies[2]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_connection_survives_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let server = server_for(&dir);

        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, mut client_write) = tokio::io::split(client);

        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        client_write.write_all(b"\xff\xfe\n").await.unwrap();
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut transport = LineTransport::new(server_read, server_write);
        server.handle_connection(&mut transport).await.unwrap();
        drop(transport);

        let mut lines = BufReader::new(client_read).lines();
        let mut replies = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            replies.push(serde_json::from_str::<Value>(&line).unwrap());
        }

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], json!(1));
        assert_eq!(replies[1]["error"]["code"], json!(-32700));
        assert_eq!(replies[2]["id"], json!(2));
        assert_eq!(replies[2]["result"], json!({}));
    }
}
