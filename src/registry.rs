//! Tool registry and session lifecycle.
//!
//! The registry owns every tool server connection for the duration of one
//! chat session. It is built once, exposes an immutable merged catalog,
//! routes invocations to the owning server, and tears all connections
//! down at session end.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mcp::{McpConnection, ToolServer};
use crate::model::{FailureKind, ToolFailure, ToolOutcome};
use crate::options::{SessionConfig, SessionLimits};

/// Session-start failures. Per-call failures never land here; they fold
/// into the transcript as [`ToolOutcome::Failure`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// A configured server could not be reached or did not produce a
    /// catalog in time. The whole start aborts; partial availability is
    /// not tolerated because the model would be told about tools it
    /// cannot call.
    #[error("tool server '{server}' unavailable: {reason}")]
    ServerUnavailable { server: String, reason: String },

    /// Two servers advertised the same tool name. Rejected at start
    /// rather than silently shadowed.
    #[error("tool name '{name}' advertised by both '{first}' and '{second}'")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// One entry in the merged session catalog.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<serde_json::Map<String, Value>>,
    /// Name of the server that owns this tool.
    pub server: String,
}

/// Owns the session's server connections and their merged tool catalog.
pub struct ToolRegistry {
    servers: Vec<(String, Box<dyn ToolServer>)>,
    catalog: Vec<ToolDescriptor>,
    /// Tool name to (server index, catalog index).
    routes: HashMap<String, (usize, usize)>,
    limits: SessionLimits,
    closed: bool,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "servers",
                &self.servers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("catalog", &self.catalog)
            .field("limits", &self.limits)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ToolRegistry {
    /// Connect every configured server and merge their catalogs.
    ///
    /// Fail-fast: the first unreachable server or duplicate tool name
    /// aborts the whole start, and every connection opened so far is
    /// closed before the error is returned.
    pub async fn start_session(config: SessionConfig) -> Result<Self, SessionError> {
        let limits = config.limits;
        let mut servers: Vec<(String, Box<dyn ToolServer>)> = Vec::new();

        for server in config.servers {
            match McpConnection::connect(&server.url, limits.connect_timeout).await {
                Ok(connection) => {
                    info!("connected to tool server '{}' at {}", server.name, server.url);
                    servers.push((server.name, Box::new(connection)));
                }
                Err(e) => {
                    warn!("tool server '{}' unreachable: {}", server.name, e);
                    close_all(&mut servers).await;
                    return Err(SessionError::ServerUnavailable {
                        server: server.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self::from_servers(servers, limits).await
    }

    /// Build a registry from already-connected servers.
    ///
    /// Discovery, timeout and collision rules match
    /// [`start_session`](Self::start_session); on any failure every given
    /// server is closed before the error is returned.
    pub async fn from_servers(
        mut servers: Vec<(String, Box<dyn ToolServer>)>,
        limits: SessionLimits,
    ) -> Result<Self, SessionError> {
        let mut catalog: Vec<ToolDescriptor> = Vec::new();
        let mut routes: HashMap<String, (usize, usize)> = HashMap::new();

        for index in 0..servers.len() {
            let server_name = servers[index].0.clone();
            let discovered = {
                let (_, server) = &servers[index];
                tokio::time::timeout(limits.connect_timeout, server.discover()).await
            };
            let tools = match discovered {
                Ok(Ok(tools)) => tools,
                Ok(Err(e)) => {
                    warn!("catalog discovery failed for '{}': {}", server_name, e);
                    let reason = e.to_string();
                    close_all(&mut servers).await;
                    return Err(SessionError::ServerUnavailable {
                        server: server_name,
                        reason,
                    });
                }
                Err(_) => {
                    let reason = format!("no catalog within {:?}", limits.connect_timeout);
                    warn!("catalog discovery timed out for '{}'", server_name);
                    close_all(&mut servers).await;
                    return Err(SessionError::ServerUnavailable {
                        server: server_name,
                        reason,
                    });
                }
            };

            for tool in tools {
                if let Some(&(owner, _)) = routes.get(tool.name.as_str()) {
                    let first = servers[owner].0.clone();
                    warn!(
                        "tool name '{}' advertised by both '{}' and '{}'",
                        tool.name, first, server_name
                    );
                    close_all(&mut servers).await;
                    return Err(SessionError::NameCollision {
                        name: tool.name,
                        first,
                        second: server_name,
                    });
                }
                debug!("tool '{}' registered from '{}'", tool.name, server_name);
                routes.insert(tool.name.clone(), (index, catalog.len()));
                catalog.push(ToolDescriptor {
                    name: tool.name,
                    description: tool.description,
                    input_schema: tool.input_schema,
                    server: server_name.clone(),
                });
            }
        }

        info!(
            "session started: {} servers, {} tools",
            servers.len(),
            catalog.len()
        );

        Ok(Self {
            servers,
            catalog,
            routes,
            limits,
            closed: false,
        })
    }

    /// The merged catalog, in server order then advertised order.
    /// Immutable for the lifetime of the session.
    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// Invoke a tool by its merged-namespace name.
    ///
    /// Arguments are checked locally against the tool's declared schema
    /// before any network call. Every failure comes back folded as a
    /// [`ToolOutcome::Failure`]; only session start returns hard errors.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        let (server_index, catalog_index) = match self.routes.get(name) {
            Some(&indices) => indices,
            None => {
                warn!("model requested unknown tool '{}'", name);
                return ToolOutcome::Failure(ToolFailure::new(
                    FailureKind::UnknownTool,
                    format!("no tool named '{}' in this session", name),
                ));
            }
        };

        let descriptor = &self.catalog[catalog_index];
        if let Err(message) = check_arguments(descriptor, arguments) {
            warn!("rejected arguments for '{}': {}", name, message);
            return ToolOutcome::Failure(ToolFailure::new(FailureKind::InvalidArguments, message));
        }

        let (_, server) = &self.servers[server_index];
        debug!("invoking '{}' on '{}'", name, descriptor.server);
        match tokio::time::timeout(self.limits.call_timeout, server.call(name, arguments.clone()))
            .await
        {
            Ok(Ok(payload)) => {
                debug!("tool '{}' returned: {}", name, payload);
                ToolOutcome::Success(payload)
            }
            Ok(Err(e)) => {
                warn!("tool '{}' failed: {}", name, e);
                ToolOutcome::Failure(ToolFailure::new(FailureKind::ExecutionFailed, e.to_string()))
            }
            Err(_) => {
                warn!(
                    "tool '{}' timed out after {:?}",
                    name, self.limits.call_timeout
                );
                ToolOutcome::Failure(ToolFailure::new(
                    FailureKind::Timeout,
                    format!("no response within {:?}", self.limits.call_timeout),
                ))
            }
        }
    }

    /// Close every server connection. Safe to call more than once.
    pub async fn end_session(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        close_all(&mut self.servers).await;
        info!("session ended");
    }
}

async fn close_all(servers: &mut Vec<(String, Box<dyn ToolServer>)>) {
    for (name, server) in servers.iter_mut() {
        if let Err(e) = server.close().await {
            warn!("closing tool server '{}' failed: {}", name, e);
        }
    }
}

/// Structural check of `arguments` against a tool's declared schema.
///
/// Verifies the value is an object, every `required` property is present,
/// and any provided property with a declared primitive `type` matches.
/// Anything deeper is the server's to enforce.
fn check_arguments(descriptor: &ToolDescriptor, arguments: &Value) -> Result<(), String> {
    let empty = serde_json::Map::new();
    let object = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err("arguments must be a JSON object".to_string()),
    };

    let schema = descriptor.input_schema.as_ref();

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for entry in required {
            if let Some(key) = entry.as_str() {
                if !object.contains_key(key) {
                    return Err(format!("missing required argument '{}'", key));
                }
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (key, value) in object {
            let declared = match properties
                .get(key)
                .and_then(|property| property.get("type"))
                .and_then(Value::as_str)
            {
                Some(declared) => declared,
                None => continue,
            };
            if !type_matches(declared, value) {
                return Err(format!("argument '{}' should be of type {}", key, declared));
            }
        }
    }

    Ok(())
}

fn type_matches(declared: &str, value: &Value) -> bool {
    match declared {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}
