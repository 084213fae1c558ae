//! Connections to tool servers over the Model Context Protocol.

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, Content, RawContent};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures talking to a tool server.
#[derive(Debug, Error)]
pub enum ToolServerError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("connection already closed")]
    Closed,
}

/// One tool advertised by a server: name, description, input schema.
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<serde_json::Map<String, Value>>,
}

/// A connected tool server the registry can drive.
///
/// Implemented for live protocol connections; tests substitute in-process
/// fakes for failure injection.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Fetch the advertised catalog.
    async fn discover(&self) -> Result<Vec<RemoteTool>, ToolServerError>;

    /// Invoke a tool. `Ok` carries the tool's payload; tool-level failures
    /// reported by the server come back as `Err(Request)`.
    async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolServerError>;

    /// Tear the connection down. Idempotent.
    async fn close(&mut self) -> Result<(), ToolServerError>;
}

/// A live client session with one tool server.
pub struct McpConnection {
    service: Option<RunningService<RoleClient, ()>>,
}

impl McpConnection {
    /// Connect to a streamable-HTTP endpoint, bounded by `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, ToolServerError> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let service = match tokio::time::timeout(timeout, ().serve(transport)).await {
            Ok(Ok(service)) => service,
            Ok(Err(e)) => return Err(ToolServerError::Connect(e.to_string())),
            Err(_) => return Err(ToolServerError::Timeout(timeout)),
        };
        debug!("connected to tool server at {}", url);
        Ok(Self {
            service: Some(service),
        })
    }

    /// Adopt an already-running client service, e.g. one connected over an
    /// in-process transport.
    pub fn from_service(service: RunningService<RoleClient, ()>) -> Self {
        Self {
            service: Some(service),
        }
    }

    fn service(&self) -> Result<&RunningService<RoleClient, ()>, ToolServerError> {
        self.service.as_ref().ok_or(ToolServerError::Closed)
    }
}

#[async_trait]
impl ToolServer for McpConnection {
    async fn discover(&self) -> Result<Vec<RemoteTool>, ToolServerError> {
        let service = self.service()?;
        let result = service
            .list_tools(None)
            .await
            .map_err(|e| ToolServerError::Request(e.to_string()))?;

        Ok(result
            .tools
            .into_iter()
            .map(|tool| RemoteTool {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .as_ref()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                input_schema: tool.input_schema.clone(),
            })
            .collect())
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolServerError> {
        let service = self.service()?;
        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: arguments.as_object().cloned(),
        };

        let result = service
            .call_tool(params)
            .await
            .map_err(|e| ToolServerError::Request(e.to_string()))?;

        if result.is_error.unwrap_or(false) {
            return Err(ToolServerError::Request(text_content(&result.content)));
        }

        Ok(result_payload(result))
    }

    async fn close(&mut self) -> Result<(), ToolServerError> {
        if let Some(service) = self.service.take() {
            service
                .cancel()
                .await
                .map_err(|e| ToolServerError::Request(e.to_string()))?;
        }
        Ok(())
    }
}

/// Extract the payload of a call result: structured content if the server
/// sent it, otherwise text content parsed as JSON, otherwise the raw text
/// wrapped in a response envelope.
fn result_payload(result: rmcp::model::CallToolResult) -> Value {
    if let Some(structured) = result.structured_content {
        return structured;
    }

    let mut parsed_text: Option<Value> = None;
    let mut raw_text: Vec<String> = Vec::new();
    for content in result.content {
        if let RawContent::Text(text_content) = content.raw {
            if let Ok(parsed) = serde_json::from_str::<Value>(&text_content.text) {
                parsed_text = Some(parsed);
            } else {
                raw_text.push(text_content.text);
            }
        }
    }

    if let Some(parsed) = parsed_text {
        parsed
    } else if !raw_text.is_empty() {
        json!({ "response": raw_text.join("\n") })
    } else {
        json!({})
    }
}

fn text_content(content: &[Content]) -> String {
    let mut pieces = Vec::new();
    for item in content {
        if let RawContent::Text(text_content) = &item.raw {
            pieces.push(text_content.text.clone());
        }
    }
    if pieces.is_empty() {
        "tool reported an error".to_string()
    } else {
        pieces.join("\n")
    }
}
