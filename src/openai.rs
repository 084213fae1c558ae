//! Chat Completions backend: OpenAI and Azure OpenAI.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ClientError, ModelClient, ModelReply};
use crate::http::{apply_extra_headers, build_http_client, json_body, read_json, read_text};
use crate::model::{CallId, ToolCall, Turn};
use crate::options::{ModelOptions, TransportOptions};
use crate::registry::ToolDescriptor;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

/// Which endpoint shape and auth header the client speaks.
#[derive(Debug, Clone)]
enum Backend {
    /// `{base}/v1/chat/completions` with a bearer token.
    OpenAi { base_url: String },
    /// Azure deployment endpoint with an `api-key` header and an
    /// `api-version` query parameter.
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Client for OpenAI-compatible Chat Completions APIs.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: String,
    backend: Backend,
    model_options: ModelOptions,
    transport_options: TransportOptions,
}

impl ChatClient {
    /// Client for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model_options: ModelOptions) -> Self {
        Self::openai_compatible(api_key, DEFAULT_OPENAI_BASE_URL, model_options)
    }

    /// Client for any server speaking the Chat Completions protocol,
    /// e.g. a local proxy or a hosted compatible API.
    pub fn openai_compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model_options: ModelOptions,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            backend: Backend::OpenAi {
                base_url: base_url.into(),
            },
            model_options,
            transport_options: TransportOptions::default(),
        }
    }

    /// Client for an Azure OpenAI deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        model_options: ModelOptions,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            backend: Backend::Azure {
                endpoint: endpoint.into(),
                deployment: deployment.into(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
            model_options,
            transport_options: TransportOptions::default(),
        }
    }

    /// Override the Azure `api-version`. No effect on other backends.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        if let Backend::Azure { api_version, .. } = &mut self.backend {
            *api_version = version.into();
        }
        self
    }

    /// Set the transport options.
    pub fn with_transport(mut self, transport_options: TransportOptions) -> Self {
        self.transport_options = transport_options;
        self
    }

    pub fn model_options(&self) -> &ModelOptions {
        &self.model_options
    }

    /// Handle error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<ChatErrorResponse>(body) {
            let kind = error_resp
                .error
                .error_type
                .or(error_resp.error.code)
                .unwrap_or_else(|| "unknown".to_string());
            ClientError::Api(format!("API error ({}): {}", kind, error_resp.error.message))
        } else {
            ClientError::Api(format!("HTTP {}: {}", status, body))
        }
    }
}

#[async_trait]
impl ModelClient for ChatClient {
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, ClientError> {
        let request_body = ChatRequest::new(turns, tools, &self.model_options);
        let http_client = build_http_client(&self.transport_options)?;

        let mut req = match &self.backend {
            Backend::OpenAi { base_url } => http_client
                .post(format!("{}/v1/chat/completions", base_url))
                .header(AUTHORIZATION, format!("Bearer {}", self.api_key)),
            Backend::Azure {
                endpoint,
                deployment,
                api_version,
            } => http_client
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions",
                    endpoint, deployment
                ))
                .query(&[("api-version", api_version.as_str())])
                .header("api-key", self.api_key.as_str()),
        };
        req = req.header(CONTENT_TYPE, "application/json");
        req = apply_extra_headers(req, &self.transport_options);

        let response = json_body(req, &request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = read_text(response).await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        let chat_response: ChatResponse = read_json(response).await?;
        chat_response.into_reply()
    }
}

impl ChatRequest {
    fn new(turns: &[Turn], tools: &[ToolDescriptor], options: &ModelOptions) -> Self {
        let mut messages = Vec::new();

        if let Some(system) = &options.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for turn in turns {
            match turn {
                Turn::User { content } => messages.push(ChatMessage {
                    role: "user".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                Turn::Assistant { content, calls } => {
                    let tool_calls = if calls.is_empty() {
                        None
                    } else {
                        Some(
                            calls
                                .iter()
                                .map(|call| ChatToolCall {
                                    id: call.id.to_string(),
                                    tool_type: "function".to_string(),
                                    function: ChatFunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.to_string(),
                                    },
                                })
                                .collect(),
                        )
                    };
                    messages.push(ChatMessage {
                        role: "assistant".to_string(),
                        content: if content.is_empty() {
                            None
                        } else {
                            Some(content.clone())
                        },
                        tool_calls,
                        tool_call_id: None,
                    });
                }
                // Dispatch bookkeeping; the assistant message above already
                // carries the calls on the wire.
                Turn::ToolCall(_) => {}
                Turn::ToolResult(result) => messages.push(ChatMessage {
                    role: "tool".to_string(),
                    content: Some(result.outcome.as_model_payload().to_string()),
                    tool_calls: None,
                    tool_call_id: Some(result.id.to_string()),
                }),
            }
        }

        let tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|descriptor| ChatTool {
                        tool_type: "function".to_string(),
                        function: ChatFunction {
                            name: descriptor.name.clone(),
                            description: if descriptor.description.is_empty() {
                                None
                            } else {
                                Some(descriptor.description.clone())
                            },
                            parameters: Value::Object((*descriptor.input_schema).clone()),
                        },
                    })
                    .collect(),
            )
        };

        ChatRequest {
            model: options.model.clone(),
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            tools,
        }
    }
}

impl ChatResponse {
    fn into_reply(self) -> Result<ModelReply, ClientError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Api("response contained no choices".to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        let mut calls = Vec::new();
        for tool_call in choice.message.tool_calls.unwrap_or_default() {
            // Unparseable argument text becomes Null here and is rejected by
            // the registry's local validation, which the model can recover from.
            let arguments =
                serde_json::from_str(&tool_call.function.arguments).unwrap_or(Value::Null);
            let id = if tool_call.id.is_empty() {
                CallId::generate()
            } else {
                CallId::from(tool_call.id)
            };
            calls.push(ToolCall {
                id,
                name: tool_call.function.name,
                arguments,
            });
        }

        Ok(ModelReply { content, calls })
    }
}

// --- Chat Completions API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    tools: Option<Vec<ChatTool>>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatFunction {
    name: String,
    description: Option<String>,
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ToolOutcome, ToolResult};
    use serde_json::json;
    use std::sync::Arc;

    fn descriptor(name: &str) -> ToolDescriptor {
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), json!({ "key": { "type": "string" } }));
        schema.insert("required".to_string(), json!(["key"]));
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{} things", name),
            input_schema: Arc::new(schema),
            server: "stub".to_string(),
        }
    }

    #[test]
    fn test_request_renders_chat_completions_roles() {
        let call = ToolCall {
            id: CallId::from("c1"),
            name: "lookup".to_string(),
            arguments: json!({ "key": "x" }),
        };
        let turns = vec![
            Turn::user("hi"),
            Turn::Assistant {
                content: "checking".to_string(),
                calls: vec![call.clone()],
            },
            Turn::ToolCall(call),
            Turn::ToolResult(ToolResult {
                id: CallId::from("c1"),
                name: "lookup".to_string(),
                outcome: ToolOutcome::Success(json!({ "v": 1 })),
            }),
        ];
        let options = ModelOptions::new("gpt-4o-mini").with_system("be terse");

        let request = ChatRequest::new(&turns, &[descriptor("lookup")], &options);
        let value = serde_json::to_value(&request).unwrap();

        let messages = value["messages"].as_array().unwrap();
        // System, user, assistant, tool. The standalone dispatch entry
        // contributes no message of its own.
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be terse");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["tool_calls"][0]["id"], "c1");
        assert_eq!(messages[2]["tool_calls"][0]["type"], "function");
        assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "lookup");
        assert_eq!(
            messages[2]["tool_calls"][0]["function"]["arguments"],
            "{\"key\":\"x\"}"
        );
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "c1");
        assert_eq!(messages[3]["content"], "{\"v\":1}");

        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "lookup");
        assert_eq!(value["tools"][0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_reply_parses_tool_calls_and_fills_missing_ids() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call-9",
                            "type": "function",
                            "function": { "name": "lookup", "arguments": "{\"key\": \"x\"}" }
                        },
                        {
                            "id": "",
                            "type": "function",
                            "function": { "name": "lookup", "arguments": "not json" }
                        }
                    ]
                }
            }]
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        let reply = response.into_reply().unwrap();

        assert_eq!(reply.content, "");
        assert_eq!(reply.calls.len(), 2);
        assert_eq!(reply.calls[0].id, CallId::from("call-9"));
        assert_eq!(reply.calls[0].arguments, json!({ "key": "x" }));
        // Minted when the API omits one.
        assert!(!reply.calls[1].id.0.is_empty());
        // Unparseable arguments degrade to Null for the registry to reject.
        assert_eq!(reply.calls[1].arguments, Value::Null);
    }

    #[test]
    fn test_reply_with_no_choices_is_an_api_error() {
        let response: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(response.into_reply().is_err());
    }

    #[test]
    fn test_error_body_parsing() {
        let err = ChatClient::handle_error_response(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": {"type": "invalid_request_error", "message": "bad key"}}"#,
        );
        match err {
            ClientError::Api(message) => {
                assert!(message.contains("invalid_request_error"));
                assert!(message.contains("bad key"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }

        let err = ChatClient::handle_error_response(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "upstream exploded",
        );
        match err {
            ClientError::Api(message) => assert!(message.contains("500")),
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
