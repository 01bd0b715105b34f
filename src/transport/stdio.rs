//! Stdio transport: newline-framed JSON-RPC over stdin/stdout.
//!
//! Stdout carries only protocol frames. All logging goes to stderr (see the
//! tracing setup in the binary), so the framed stream is never corrupted.

use crate::error::{GatewayError, ProtocolError, Result};
use crate::protocol::{Dispatcher, Handler, JsonRpcError, JsonRpcResponse, Message};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

/// Stdio-based transport for local MCP clients.
pub struct StdioTransport {
    reader: Mutex<BufReader<Stdin>>,
    writer: Mutex<Stdout>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
            writer: Mutex::new(tokio::io::stdout()),
        }
    }

    /// Run the transport loop until stdin closes.
    ///
    /// Parse failures get a -32700 response and the loop continues;
    /// notifications are dispatched but never answered.
    pub async fn serve<H: Handler>(&self, dispatcher: &Dispatcher<H>) -> Result<()> {
        info!("Stdio transport started");

        loop {
            let message = match self.read_message().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("EOF on stdin, shutting down");
                    break;
                }
                Err(GatewayError::Protocol(ProtocolError::ParseError)) => {
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    self.write_response(&response).await?;
                    continue;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break;
                }
            };

            match message {
                Message::Request(request) => {
                    let is_notification = request.is_notification();
                    let response = dispatcher.dispatch(request).await;

                    if !is_notification {
                        self.write_response(&response).await?;
                    }
                }
                Message::Response(response) => {
                    // A server never expects responses; log and move on.
                    warn!("Unexpected response received: {:?}", response.id);
                }
            }
        }

        Ok(())
    }

    /// Read the next framed message. `None` means EOF.
    async fn read_message(&self) -> Result<Option<Message>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Message>(&line) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                error!("Failed to parse message: {}", e);
                Err(ProtocolError::ParseError.into())
            }
        }
    }

    /// Read a single non-empty line from stdin. `None` means EOF.
    async fn read_line(&self) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    trace!("Received line: {}", line);
                    return Ok(Some(line.to_string()));
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    return Err(GatewayError::Io(e));
                }
            }
        }
    }

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        debug!("Sending response: id={:?}", response.id);

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{Message, RequestId};

    #[test]
    fn test_request_frame_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        match message {
            Message::Request(request) => {
                assert_eq!(request.method, "initialize");
                assert_eq!(request.id, Some(RequestId::Number(1)));
            }
            Message::Response(_) => panic!("parsed as response"),
        }
    }

    #[test]
    fn test_response_frame_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"test":true}}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(matches!(message, Message::Response(_)));
    }

    #[test]
    fn test_garbage_frame_rejected() {
        let result = serde_json::from_str::<Message>("not json at all");
        assert!(result.is_err());
    }
}
