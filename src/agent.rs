//! Orchestrator that drives the model/tool loop for one conversation turn.

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ClientError, ModelClient};
use crate::history::History;
use crate::model::{RunResult, ToolOutcome, ToolResult, Turn};
use crate::registry::ToolRegistry;

/// Errors that end one [`Agent::submit`] turn. The session itself stays
/// usable after either variant; only the current turn is abandoned.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model kept requesting tool calls past the configured round
    /// limit without producing a final answer.
    #[error("tool loop exceeded {rounds} rounds without a final answer")]
    ToolLoopExceeded { rounds: usize },

    /// The model backend failed (transport, auth, malformed response).
    #[error("model client error: {0}")]
    Client(#[from] ClientError),
}

/// Agent that runs the tool-execution loop around a [`ModelClient`].
///
/// One call to [`submit`](Self::submit) performs a full turn:
/// 1. Appends the user input to the conversation history
/// 2. Sends the history plus the session's tool catalog to the model
/// 3. Dispatches any requested tool calls concurrently, waits for all
/// 4. Records the round, every result paired to its call id, and goes to 2
/// 5. Stops when the model answers without tool calls
///
/// # Example
/// ```ignore
/// let registry = ToolRegistry::start_session(config).await?;
/// let client = ChatClient::openai(api_key, ModelOptions::new("gpt-4o-mini"));
/// let mut agent = Agent::new(client, registry);
///
/// let result = agent.submit("What tools do you have?").await?;
/// println!("{}", result.output);
/// ```
pub struct Agent<C: ModelClient> {
    client: C,
    registry: ToolRegistry,
    history: History,
    max_rounds: usize,
}

impl<C: ModelClient> Agent<C> {
    /// Create an agent for an established session. The round limit is
    /// taken from the registry's session limits.
    pub fn new(client: C, registry: ToolRegistry) -> Self {
        let max_rounds = registry.limits().max_rounds;
        Self {
            client,
            registry,
            history: History::new(),
            max_rounds,
        }
    }

    /// Override the maximum number of model rounds per turn.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    /// Seed the agent with an existing transcript.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Close every tool server connection. Safe to call more than once.
    pub async fn end_session(&mut self) {
        self.registry.end_session().await;
    }

    /// Run one conversation turn from `user_text` to a final answer.
    ///
    /// Tool calls within a round are dispatched concurrently; the round
    /// only advances once every call has its result appended, in request
    /// order. Tool failures do not end the turn: they travel back to the
    /// model as data inside the paired result.
    ///
    /// The returned future may be dropped (timeout, operator abort)
    /// without corrupting the session: a round's calls and results enter
    /// the history together, so an abandoned turn never leaves a call
    /// without its paired result.
    pub async fn submit(&mut self, user_text: impl Into<String>) -> Result<RunResult, AgentError> {
        self.history.append(Turn::user(user_text));

        for round in 1..=self.max_rounds {
            debug!("model round {}/{}", round, self.max_rounds);

            let reply = self
                .client
                .complete(self.history.turns(), self.registry.catalog())
                .await?;

            let calls = reply.calls;
            if calls.is_empty() {
                self.history.append(Turn::assistant(reply.content.clone()));
                debug!("final answer after {} round(s)", round);
                return Ok(RunResult {
                    output: reply.content,
                    history: self.history.snapshot(),
                    rounds: round,
                });
            }

            for call in &calls {
                info!("tool call requested: {} [{}]", call.name, call.id);
            }

            let pending: Vec<_> = calls
                .iter()
                .map(|call| self.registry.invoke(&call.name, &call.arguments))
                .collect();
            let outcomes = join_all(pending).await;

            // The round reaches the history only once every call has its
            // outcome; a submit dropped mid-dispatch strands no call.
            self.history.append(Turn::Assistant {
                content: reply.content,
                calls: calls.clone(),
            });
            for call in &calls {
                self.history.append(Turn::ToolCall(call.clone()));
            }
            for (call, outcome) in calls.into_iter().zip(outcomes) {
                match &outcome {
                    ToolOutcome::Success(_) => info!("tool {} completed", call.name),
                    ToolOutcome::Failure(failure) => {
                        warn!("tool {} failed: {}", call.name, failure)
                    }
                }
                self.history.append(Turn::ToolResult(ToolResult {
                    id: call.id,
                    name: call.name,
                    outcome,
                }));
            }
        }

        warn!(
            "no final answer within {} rounds, abandoning turn",
            self.max_rounds
        );
        Err(AgentError::ToolLoopExceeded {
            rounds: self.max_rounds,
        })
    }
}
