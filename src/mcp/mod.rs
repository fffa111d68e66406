pub mod errors;
pub mod protocol;
pub mod server;
pub mod tools;
/// Model Context Protocol (MCP) implementation for fs-waypoints
///
/// This module exposes the filesystem tools to MCP clients as JSON-RPC 2.0
/// over newline-delimited stdio.
pub mod transport;

// Re-export core types for easier access
pub use self::{
    errors::{MCPError, MCPResult, ToolError},
    server::MCPServer,
    tools::{MCPTool, ToolRegistry, ToolResult},
    transport::{MCPTransport, StdioTransport},
};

/// MCP Protocol version implemented by this server
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information
pub const SERVER_NAME: &str = "fs-waypoints";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
