//! Session, model and transport configuration.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;

/// Model behavior parameters.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Model identifier (e.g., "gpt-4o-mini"). For Azure deployments this
    /// still names the underlying model; the deployment is part of the
    /// client configuration.
    pub model: String,

    /// System instructions, sent as a leading system message.
    pub system: Option<String>,

    /// Temperature for sampling (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Top-p (nucleus) sampling parameter.
    pub top_p: Option<f32>,

    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl ModelOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    /// Set the system instructions.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top-p sampling parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Transport configuration options.
///
/// Controls how requests are sent over the network.
#[derive(Debug, Clone)]
pub enum TransportOptions {
    /// HTTP transport configuration
    Http {
        /// Request timeout. If None, default client timeout is used.
        timeout: Option<Duration>,
        /// HTTP proxy URL.
        proxy: Option<String>,
        /// Additional HTTP headers to send with every request.
        headers: Option<HashMap<String, String>>,
    },
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions::Http {
            timeout: None,
            proxy: None,
            headers: None,
        }
    }
}

impl TransportOptions {
    /// Create new default HTTP transport options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        match &mut self {
            TransportOptions::Http { timeout, .. } => *timeout = Some(duration),
        }
        self
    }

    /// Set the proxy.
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        match &mut self {
            TransportOptions::Http { proxy, .. } => *proxy = Some(proxy_url),
        }
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        match &mut self {
            TransportOptions::Http { headers, .. } => {
                headers.get_or_insert_with(HashMap::new).insert(key, value);
            }
        }
        self
    }
}

/// One configured tool server endpoint (streamable HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Label used in logs and collision reports.
    pub name: String,
    /// Base URL of the server's endpoint, e.g. `http://127.0.0.1:3456/mcp`.
    pub url: String,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Bounds applied to session setup and every tool invocation.
///
/// Nothing in the session may wait unboundedly: catalog discovery is held
/// to `connect_timeout`, each tool call to `call_timeout`, and each user
/// turn to `max_rounds` model invocations.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Per-server bound on connecting and fetching the catalog.
    pub connect_timeout: Duration,
    /// Bound on each tool invocation.
    pub call_timeout: Duration,
    /// Model rounds allowed per user turn.
    pub max_rounds: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(30),
            max_rounds: 10,
        }
    }
}

impl SessionLimits {
    /// Set the per-server connect/discovery timeout.
    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, duration: Duration) -> Self {
        self.call_timeout = duration;
        self
    }

    /// Set the per-turn round limit.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }
}

/// Everything a session needs at start: the tool servers to connect and
/// the bounds to run under. Passed explicitly rather than read from
/// process-wide state, so sessions stay isolated from one another.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub servers: Vec<ServerConfig>,
    pub limits: SessionLimits,
}

impl SessionConfig {
    pub fn new(servers: Vec<ServerConfig>) -> Self {
        Self {
            servers,
            limits: SessionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }
}
