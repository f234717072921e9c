//! OpenAI-compatible chat-completions client
//!
//! Talks to any service exposing `POST {endpoint}/v1/chat/completions` with the
//! OpenAI request/response shape (Groq, OpenAI, LM Studio, Ollama's compat
//! layer). Only the first choice of the response is read.
//!
//! # Example
//!
//! ```no_run
//! use screencraft::llm::{ChatMessage, LLMClient, LLMRequest, OpenAICompatibleClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAICompatibleClient::with_timeout(
//!     "https://api.groq.com/openai".to_string(),
//!     "mixtral-8x7b-32768".to_string(),
//!     Some("gsk_...".to_string()),
//!     Duration::from_secs(60),
//! )?;
//!
//! let response = client
//!     .chat(LLMRequest::new(vec![ChatMessage::user("Hello")]))
//!     .await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Default request timeout for API calls
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat-completions client for OpenAI-shaped HTTP APIs
///
/// The underlying `reqwest::Client` pools connections, so one instance is
/// meant to be shared across requests behind an `Arc`.
pub struct OpenAICompatibleClient {
    /// API base URL, without the `/v1/...` suffix
    endpoint: String,

    /// Model name to use for inference
    model: String,

    /// Bearer credential, if the service requires one
    api_key: Option<String>,

    /// Shared HTTP client with connection pooling
    http_client: Client,

    /// Request timeout duration
    timeout: Duration,
}

impl OpenAICompatibleClient {
    /// Creates a client with the default timeout
    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
    ) -> Result<Self, BackendError> {
        Self::with_timeout(
            endpoint,
            model,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Creates a client whose every request is bounded by `timeout`
    pub fn with_timeout(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = Client::builder().timeout(timeout).build().map_err(|e| {
            BackendError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            http_client,
            timeout,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint)
    }

    fn build_body(&self, request: &LLMRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream: request.stream,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            error!("Completion request timed out after {:?}", self.timeout);
            BackendError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            error!("Cannot connect to completion service at {}", self.endpoint);
            BackendError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            error!("Completion request error: {}", e);
            BackendError::NetworkError {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

/// Maps a non-success HTTP status onto the backend error taxonomy
fn error_for_status(status: StatusCode, retry_after: Option<u64>, body: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::AuthenticationError {
            message: format!("HTTP {}: {}", status, body),
        },
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimitError { retry_after },
        _ => BackendError::ApiError {
            message: format!("HTTP {}: {}", status, body),
            status_code: Some(status.as_u16()),
        },
    }
}

/// Pulls the first choice's message text out of a raw response body
fn first_choice_content(body: &str) -> Result<String, BackendError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
            message: format!("JSON parse error: {}", e),
            raw_response: Some(body.chars().take(200).collect()),
        })?;

    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Completion token usage"
        );
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .map(|message| message.content.unwrap_or_default())
        .ok_or_else(|| BackendError::InvalidResponse {
            message: "No choices in completion response".to_string(),
            raw_response: None,
        })
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let url = self.completions_url();
        let body = self.build_body(&request);

        debug!(
            url = %url,
            model = %self.model,
            messages = body.messages.len(),
            "Sending completion request"
        );

        let start = Instant::now();

        let mut builder = self.http_client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();

            error!("Completion service returned error status {}: {}", status, body);
            return Err(error_for_status(status, retry_after, body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                message: format!("Failed to read response body: {}", e),
                raw_response: None,
            })?;
        let content = first_choice_content(&text)?;

        let elapsed = start.elapsed();
        info!(
            "Completion finished in {:.2}s ({} chars)",
            elapsed.as_secs_f64(),
            content.len()
        );

        Ok(LLMResponse::text(content, elapsed))
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model_info(&self) -> Option<String> {
        Some(format!("{} @ {}", self.model, self.endpoint))
    }
}

impl fmt::Debug for OpenAICompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompatibleClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    /// Role: "system", "user", or "assistant"
    role: String,
    /// Message content
    content: String,
}

/// Request structure for the chat completions API
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
