//! Completion step: prompt construction, one upstream call, code extraction
//!
//! [`CompletionClient::complete`] never returns an error. Transport, auth,
//! rate-limit and malformed-response failures, as well as an empty answer,
//! all come back as [`CompletionResult::UpstreamFailure`].

use super::describe::LayoutDescription;
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use std::sync::Arc;
use tracing::{debug, error, warn};

const SYSTEM_PERSONA: &str = "You are an expert React developer specializing in converting UI designs into clean, maintainable React components.";

const REQUIREMENTS: &str = "Requirements:
1. Use Tailwind CSS for styling
2. Make it responsive
3. Include proper aria labels
4. Handle interactive states
5. Return only the component code";

const FENCE: &str = "```";

/// Language markers stripped when they lead the code on the same line
const INLINE_TAGS: [&str; 6] = ["javascript", "typescript", "react", "jsx", "tsx", "js"];

/// Sampling parameters for the single completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 4096,
            top_p: 1.0,
        }
    }
}

/// Why the upstream step produced no usable code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service reported rate limiting
    RateLimited,
    /// Any other transport, auth, or response failure
    Unavailable,
    /// The call succeeded but extraction left nothing
    EmptyGeneration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Generated { code: String },
    UpstreamFailure { reason: String, kind: FailureKind },
}

pub struct CompletionClient {
    llm: Arc<dyn LLMClient>,
    params: GenerationParams,
}

impl CompletionClient {
    pub fn new(llm: Arc<dyn LLMClient>, params: GenerationParams) -> Self {
        Self { llm, params }
    }

    pub fn params(&self) -> GenerationParams {
        self.params
    }

    pub fn backend_name(&self) -> &str {
        self.llm.name()
    }

    /// System persona plus the task message; streaming is always off
    pub fn build_request(&self, description: &LayoutDescription) -> LLMRequest {
        let task = format!(
            "Create a React component based on this UI layout description: {}\n\n{}",
            description.as_str(),
            REQUIREMENTS
        );

        LLMRequest::new(vec![ChatMessage::system(SYSTEM_PERSONA), ChatMessage::user(task)])
            .with_temperature(self.params.temperature)
            .with_max_tokens(self.params.max_tokens)
            .with_top_p(self.params.top_p)
    }

    /// Makes exactly one upstream call and classifies its outcome
    pub async fn complete(&self, description: &LayoutDescription) -> CompletionResult {
        let request = self.build_request(description);

        match self.llm.chat(request).await {
            Ok(response) => {
                debug!(
                    backend = %self.llm.name(),
                    elapsed_ms = response.response_time.as_millis(),
                    raw_len = response.content.len(),
                    "Completion received"
                );

                let code = extract_code(&response.content);
                if code.is_empty() {
                    warn!(backend = %self.llm.name(), "Completion contained no component code");
                    CompletionResult::UpstreamFailure {
                        reason: "No component code generated".to_string(),
                        kind: FailureKind::EmptyGeneration,
                    }
                } else {
                    CompletionResult::Generated { code }
                }
            }
            Err(e) => {
                error!(backend = %self.llm.name(), error = %e, "Completion request failed");
                let kind = if e.is_rate_limit() {
                    FailureKind::RateLimited
                } else {
                    FailureKind::Unavailable
                };
                CompletionResult::UpstreamFailure {
                    reason: e.to_string(),
                    kind,
                }
            }
        }
    }
}

/// Pulls component source out of a raw model answer
///
/// Without a fence the trimmed text is returned as-is. With one, only the body
/// of the first fenced block is kept (an unterminated fence runs to the end).
/// An info-string line such as `jsx` or `tsx react` is dropped, as is a known
/// language tag sitting in front of the code on the same line.
pub fn extract_code(raw: &str) -> String {
    let trimmed = raw.trim();

    let Some(open) = trimmed.find(FENCE) else {
        return trimmed.to_string();
    };

    let after_open = &trimmed[open + FENCE.len()..];
    let body = match after_open.find(FENCE) {
        Some(close) => &after_open[..close],
        None => after_open,
    };

    strip_info_string(body).trim().to_string()
}

fn strip_info_string(body: &str) -> &str {
    match body.split_once('\n') {
        Some((first, rest)) if is_info_string(first) => rest,
        _ => strip_inline_tag(body),
    }
}

fn strip_inline_tag(body: &str) -> &str {
    let trimmed = body.trim_start();
    INLINE_TAGS
        .iter()
        .filter_map(|tag| trimmed.strip_prefix(tag))
        .find(|rest| rest.starts_with(char::is_whitespace))
        .unwrap_or(body)
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.split_whitespace().all(|token| {
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.' | '#'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MessageRole, MockLLMClient, MockResponse};
    use crate::pipeline::describe::{LayoutDescriber, TemplateDescriber};

    fn description() -> LayoutDescription {
        TemplateDescriber.describe(b"png")
    }

    fn client_with(response: MockResponse) -> (Arc<MockLLMClient>, CompletionClient) {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_response(response);
        let client = CompletionClient::new(mock.clone(), GenerationParams::default());
        (mock, client)
    }

    #[test]
    fn test_extract_plain_text() {
        assert_eq!(extract_code("  const A = () => null;\n"), "const A = () => null;");
    }

    #[test]
    fn test_extract_fenced_with_language_tag() {
        let raw = "Here you go:\n```jsx\nconst X = () => <div />;\n```\nEnjoy!";
        assert_eq!(extract_code(raw), "const X = () => <div />;");
    }

    #[test]
    fn test_extract_fenced_tag_on_code_line() {
        assert_eq!(
            extract_code("```jsx const X = () => <div />;```"),
            "const X = () => <div />;"
        );
        assert_eq!(
            extract_code("```react export default App;\nconst y = 1;\n```"),
            "export default App;\nconst y = 1;"
        );
    }

    #[test]
    fn test_extract_inline_keeps_code_starting_like_a_tag() {
        assert_eq!(extract_code("```jsxElement();```"), "jsxElement();");
        assert_eq!(extract_code("```const js = 1;```"), "const js = 1;");
    }

    #[test]
    fn test_extract_fenced_react_tag() {
        assert_eq!(extract_code("```react\nexport default App;\n```"), "export default App;");
    }

    #[test]
    fn test_extract_fenced_multiple_tags() {
        assert_eq!(extract_code("```tsx react\nlet a = 1;\n```"), "let a = 1;");
    }

    #[test]
    fn test_extract_fenced_without_tag() {
        assert_eq!(extract_code("```\nlet a = 1;\n```"), "let a = 1;");
    }

    #[test]
    fn test_extract_keeps_code_on_first_line() {
        assert_eq!(
            extract_code("```const a = 1;\nconst b = 2;```"),
            "const a = 1;\nconst b = 2;"
        );
    }

    #[test]
    fn test_extract_only_first_block() {
        let raw = "```jsx\nfirst();\n```\ntext\n```css\n.x{}\n```";
        assert_eq!(extract_code(raw), "first();");
    }

    #[test]
    fn test_extract_unterminated_fence() {
        assert_eq!(extract_code("```jsx\nconst X = 1;"), "const X = 1;");
    }

    #[test]
    fn test_extract_does_not_touch_jsx_inside_code() {
        let raw = "```jsx\nimport React from 'react';\n// renders jsx\n```";
        assert_eq!(
            extract_code(raw),
            "import React from 'react';\n// renders jsx"
        );
    }

    #[test]
    fn test_extract_empty_fence_is_empty() {
        assert_eq!(extract_code("```jsx\n   \n```"), "");
        assert_eq!(extract_code("   \n\t"), "");
    }

    #[test]
    fn test_build_request_shape() {
        let client = CompletionClient::new(Arc::new(MockLLMClient::new()), GenerationParams::default());
        let request = client.build_request(&description());

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.contains("expert React developer"));
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert!(request.messages[1].content.contains(description().as_str()));
        assert!(request.messages[1].content.contains("5. Return only the component code"));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(4096));
        assert_eq!(request.top_p, Some(1.0));
        assert!(!request.stream);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let (mock, client) = client_with(MockResponse::text("```jsx\nconst X=()=>null;\n```"));

        let result = client.complete(&description()).await;
        assert_eq!(
            result,
            CompletionResult::Generated {
                code: "const X=()=>null;".to_string()
            }
        );
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_whitespace_is_empty_generation() {
        let (_, client) = client_with(MockResponse::text("  \n  "));

        match client.complete(&description()).await {
            CompletionResult::UpstreamFailure { reason, kind } => {
                assert_eq!(kind, FailureKind::EmptyGeneration);
                assert_eq!(reason, "No component code generated");
            }
            other => panic!("Expected UpstreamFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_network_error() {
        let (mock, client) = client_with(MockResponse::error(BackendError::Other {
            message: "connect ECONNREFUSED 127.0.0.1:443".to_string(),
        }));

        let result = client.complete(&description()).await;
        assert_eq!(
            result,
            CompletionResult::UpstreamFailure {
                reason: "connect ECONNREFUSED 127.0.0.1:443".to_string(),
                kind: FailureKind::Unavailable,
            }
        );
        // exactly one attempt, no retries
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let (_, client) = client_with(MockResponse::error(BackendError::RateLimitError {
            retry_after: Some(20),
        }));

        match client.complete(&description()).await {
            CompletionResult::UpstreamFailure { kind, .. } => {
                assert_eq!(kind, FailureKind::RateLimited)
            }
            other => panic!("Expected UpstreamFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_auth_error_is_unavailable() {
        let (_, client) = client_with(MockResponse::error(BackendError::AuthenticationError {
            message: "invalid api key".to_string(),
        }));

        match client.complete(&description()).await {
            CompletionResult::UpstreamFailure { reason, kind } => {
                assert_eq!(kind, FailureKind::Unavailable);
                assert_eq!(reason, "Authentication failed: invalid api key");
            }
            other => panic!("Expected UpstreamFailure, got {:?}", other),
        }
    }
}
