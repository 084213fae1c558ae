//! # wield - Tool-Wielding Chat Agent over MCP
//!
//! A library for building chat agents that call tools over the Model
//! Context Protocol. One session connects a set of MCP tool servers,
//! merges their catalogs into a single namespace, and drives an LLM
//! through a bounded request/dispatch loop until it produces an answer.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Fail-fast session start over any number of MCP tool servers
//! - Local argument validation against each tool's declared schema
//! - Concurrent tool dispatch with per-call timeouts
//! - Tool failures fed back to the model as data, never as panics
//! - OpenAI and Azure OpenAI Chat Completions backends
//!
//! ## Architecture
//!
//! 1. **`ToolRegistry`** owns the session: server connections, the merged
//!    catalog and invocation routing.
//! 2. **`ModelClient`** is the backend seam; `ChatClient` implements it
//!    for the Chat Completions protocol.
//! 3. **`Agent`** wraps both and runs the tool-execution loop, recording
//!    every step in an append-only [`History`].
//!
//! ## Example
//! ```no_run
//! use wield::{Agent, ChatClient, ModelOptions, ServerConfig, SessionConfig, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new(vec![ServerConfig::new(
//!         "helper-tools",
//!         "http://127.0.0.1:3456/mcp",
//!     )]);
//!     let registry = ToolRegistry::start_session(config).await?;
//!
//!     let client = ChatClient::openai("your-api-key", ModelOptions::new("gpt-4o-mini"));
//!     let mut agent = Agent::new(client, registry);
//!
//!     let result = agent.submit("What tools do you have?").await?;
//!     println!("{}", result.output);
//!
//!     agent.end_session().await;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod client;
pub mod helpers;
pub mod history;
pub mod http;
pub mod mcp;
pub mod model;
pub mod openai;
pub mod options;
pub mod registry;

pub use agent::{Agent, AgentError};
pub use client::{ClientError, ModelClient, ModelReply};
pub use helpers::HelperTools;
pub use history::History;
pub use model::{CallId, FailureKind, RunResult, ToolCall, ToolFailure, ToolOutcome, ToolResult, Turn};
pub use openai::ChatClient;
pub use options::{ModelOptions, ServerConfig, SessionConfig, SessionLimits, TransportOptions};
pub use registry::{SessionError, ToolDescriptor, ToolRegistry};

// Re-export rmcp for convenience
pub use rmcp;
