use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace};

use crate::mcp::{
    errors::{MCPError, MCPResult, TransportError},
    protocol::{MCPMessage, MessageParser},
};

/// Abstract transport trait for MCP communication
#[async_trait]
pub trait MCPTransport: Send {
    /// Send a message through the transport
    async fn send(&mut self, message: MCPMessage) -> MCPResult<()>;

    /// Receive the next message.
    ///
    /// Returns `TransportError::Closed` at end of input and a protocol
    /// `ParseError` for a line that is not a valid message; the transport stays
    /// usable after a parse error.
    async fn receive(&mut self) -> MCPResult<MCPMessage>;

    /// Close the transport connection
    async fn close(&mut self) -> MCPResult<()>;

    fn is_connected(&self) -> bool;
}

/// Newline-delimited JSON-RPC over any async byte stream pair
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    connected: bool,
}

/// The stdio transport MCP clients spawn servers with
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            connected: true,
        }
    }
}

#[async_trait]
impl<R, W> MCPTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: MCPMessage) -> MCPResult<()> {
        if !self.connected {
            return Err(TransportError::Closed.into());
        }

        let mut data = MessageParser::serialize_message(&message)?;
        data.push(b'\n');
        trace!("-> {}", String::from_utf8_lossy(&data).trim_end());

        let written = match self.writer.write_all(&data).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            self.connected = false;
            return Err(MCPError::Transport(TransportError::Io(e)));
        }
        Ok(())
    }

    async fn receive(&mut self) -> MCPResult<MCPMessage> {
        loop {
            if !self.connected {
                return Err(TransportError::Closed.into());
            }

            // Raw bytes: invalid UTF-8 is a parse error, not a broken stream
            let mut buffer = Vec::new();
            match self.reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => {
                    debug!("Input stream ended");
                    self.connected = false;
                    return Err(TransportError::Closed.into());
                }
                Ok(_) => {}
                Err(e) => {
                    self.connected = false;
                    return Err(MCPError::Transport(TransportError::Io(e)));
                }
            }

            let line = buffer.trim_ascii();
            if line.is_empty() {
                continue;
            }

            trace!("<- {}", String::from_utf8_lossy(line));
            return MessageParser::parse_message(line);
        }
    }

    async fn close(&mut self) -> MCPResult<()> {
        self.connected = false;
        self.writer
            .shutdown()
            .await
            .map_err(|e| MCPError::Transport(TransportError::Io(e)))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
