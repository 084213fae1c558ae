//! Conversation data model shared by the history store, the model client
//! and the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Token pairing a tool call request with its eventual result within one turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl CallId {
    /// Mint a fresh id for replies whose backend did not supply one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: CallId,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Why a tool invocation failed.
///
/// All of these are recoverable: they travel inside a [`ToolResult`] so the
/// model can react (retry with corrected arguments, pick another tool, or
/// explain to the user). None of them ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The model asked for a name absent from the session catalog.
    UnknownTool,
    /// Arguments rejected locally against the tool's declared schema,
    /// before any network call.
    InvalidArguments,
    /// The remote call was sent and the server reported or caused a failure.
    ExecutionFailed,
    /// No response within the configured per-call timeout.
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidArguments => "invalid_arguments",
            FailureKind::ExecutionFailed => "execution_failed",
            FailureKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// A failed tool invocation, carried as data inside a [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one tool invocation: a payload or a structured failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(serde_json::Value),
    Failure(ToolFailure),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// Render for the model: the payload itself, or an error envelope it
    /// can read and act on.
    pub fn as_model_payload(&self) -> serde_json::Value {
        match self {
            ToolOutcome::Success(value) => value.clone(),
            ToolOutcome::Failure(failure) => serde_json::json!({
                "error": { "kind": failure.kind, "message": failure.message }
            }),
        }
    }
}

/// The result of one tool invocation, paired to its request by [`CallId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub id: CallId,
    pub name: String,
    pub outcome: ToolOutcome,
}

/// One entry in the session transcript.
///
/// Insertion order is meaningful: the sequence is the literal context the
/// model sees on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum Turn {
    /// Operator input.
    User { content: String },
    /// Model output: user-facing text plus any tool calls it wants run.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        calls: Vec<ToolCall>,
    },
    /// A call the orchestrator is dispatching.
    ToolCall(ToolCall),
    /// The paired outcome, success or failure.
    ToolResult(ToolResult),
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            content: content.into(),
            calls: Vec::new(),
        }
    }
}

/// What one completed turn produced: the final answer, the full updated
/// transcript, and how many model rounds it took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub output: String,
    pub history: Vec<Turn>,
    pub rounds: usize,
}
