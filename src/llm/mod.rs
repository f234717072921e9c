//! Completion service abstraction layer
//!
//! This module provides a trait-based abstraction over chat-completion
//! backends, allowing the HTTP client, the genai adapters, and the test mock
//! to be used interchangeably by the analysis pipeline.

mod client;
mod error;
mod genai_client;
mod mock;
mod openai_compatible;
mod selector;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai_client::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use openai_compatible::OpenAICompatibleClient;
pub use selector::{select_llm_client, SelectedClient};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
