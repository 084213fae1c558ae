//! Built-in helper tool server: local file reads and URL fetches over MCP.
//!
//! Runs as its own server process (see the `helper-tools` binary) or
//! in-process over a duplex transport, and is discovered like any other
//! tool server; nothing in the orchestrator special-cases it.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
    ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFileArgs {
    #[schemars(description = "Path of the file to read")]
    pub file_path: String,
    #[schemars(description = "Text encoding of the file, defaults to utf-8")]
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FetchUrlArgs {
    #[schemars(description = "The URL to fetch")]
    pub url: String,
}

/// Utility tools every session can use without standing up a bespoke
/// server. Exposed as the MCP tools `read_file_content` and
/// `fetch_url_content_async`.
#[derive(Debug, Clone)]
pub struct HelperTools {
    http: reqwest::Client,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl HelperTools {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Read the contents of a local text file")]
    async fn read_file_content(
        &self,
        Parameters(args): Parameters<ReadFileArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(encoding) = &args.encoding {
            if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
                return Err(McpError::invalid_params(
                    format!("unsupported encoding '{}', only utf-8 is available", encoding),
                    None,
                ));
            }
        }
        info!("reading file {}", args.file_path);
        let content = tokio::fs::read_to_string(&args.file_path)
            .await
            .map_err(|e| {
                McpError::invalid_params(format!("cannot read '{}': {}", args.file_path, e), None)
            })?;
        Ok(CallToolResult::success(vec![Content::text(content)]))
    }

    #[tool(description = "Fetch the contents of a URL over HTTP")]
    async fn fetch_url_content_async(
        &self,
        Parameters(args): Parameters<FetchUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("fetching {}", args.url);
        let response = self
            .http
            .get(&args.url)
            .send()
            .await
            .map_err(|e| {
                McpError::internal_error(format!("request to {} failed: {}", args.url, e), None)
            })?
            .error_for_status()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let body = response.text().await.map_err(|e| {
            McpError::internal_error(format!("reading body from {} failed: {}", args.url, e), None)
        })?;
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }
}

impl Default for HelperTools {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for HelperTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "wield-helper-tools".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Utility tools for reading local files and fetching URL contents".to_string(),
            ),
            ..Default::default()
        }
    }
}
