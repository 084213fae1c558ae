//! Model client seam and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ToolCall, Turn};
use crate::registry::ToolDescriptor;

/// Errors from the model backend.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One model completion: user-facing text plus any tool calls to run.
///
/// An empty `calls` list is the terminal state for a turn.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: String,
    pub calls: Vec<ToolCall>,
}

/// The underlying language-model capability.
///
/// Implementations get the full transcript and the session's merged tool
/// catalog on every invocation; all context lives in the transcript, none
/// in the client.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, ClientError>;
}
