//! Completion client - the seam between the agent loop and the LLM provider

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::agent::types::*;
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::tools::ToolCall;

/// One model turn: either final text or a batch of tool calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Text produced by the model (the answer when there are no tool calls)
    pub content: String,
    /// Tool calls requested by the model, in emission order
    pub tool_calls: Vec<ToolCall>,
    /// Provider finish reason, if reported
    pub finish_reason: Option<String>,
    /// Token usage, if reported
    pub usage: Option<Usage>,
}

impl Completion {
    /// A final-answer completion
    pub fn text(content: impl Into<String>) -> Self {
        Completion {
            content: content.into(),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        }
    }

    /// A completion requesting tools
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Completion {
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
            ..Default::default()
        }
    }

    /// True when the model is done and `content` is the answer
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Anything that can turn a conversation into the model's next turn.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask the model for the next turn. `tools` may be empty, in which case
    /// no tool catalog is offered.
    async fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Completion>;
}

/// Client for OpenAI-compatible chat completion APIs
#[derive(Clone)]
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_key.expose_secret()
            ))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(OpenAiClient { client, config })
    }

    /// Get the configured model
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, messages: &[Message], tools: &[ToolDefinition]) -> ChatCompletionRequest {
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (Some(tools.to_vec()), Some(ToolChoice::Auto))
        };

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            temperature: Some(self.config.temperature),
            tools,
            tool_choice,
        }
    }

    /// Send a request to the chat completions endpoint
    async fn send_request(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(
            "Sending completion request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            let body: ChatCompletionResponse = serde_json::from_str(&text)
                .map_err(|e| Error::Provider(format!("Malformed completion response: {}", e)))?;

            if let Some(ref usage) = body.usage {
                info!(
                    "Completion response: model={}, tokens={}",
                    body.model, usage.total_tokens
                );
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limit exceeded: {}", error_text);
                Err(Error::RateLimit(error_text))
            } else if status.as_u16() == 401 {
                Err(Error::Unauthorized("Invalid API key".to_string()))
            } else {
                Err(Error::Provider(format!(
                    "API error ({}): {}",
                    status, error_text
                )))
            }
        }
    }
}

/// Convert the provider's first choice into a `Completion`
pub(crate) fn into_completion(response: ChatCompletionResponse) -> Result<Completion> {
    let usage = response.usage;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("Completion response contained no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let arguments = if tc.function.arguments.trim().is_empty() {
                serde_json::json!({})
            } else {
                match serde_json::from_str(&tc.function.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(
                            "Failed to parse tool arguments for {}: {}",
                            tc.function.name, e
                        );
                        serde_json::json!({})
                    }
                }
            };
            ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    Ok(Completion {
        content: choice.message.content,
        tool_calls,
        finish_reason: choice.finish_reason,
        usage,
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Completion> {
        let request = self.build_request(messages, tools);
        let response = self.send_request(request).await?;
        into_completion(response)
    }
}
