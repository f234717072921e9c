//! screencraft - screenshot to React component service
//!
//! Accepts an uploaded UI screenshot over HTTP, asks a chat-completion
//! backend for a matching React component, and falls back to a placeholder
//! component when the backend cannot deliver one. The uploaded file never
//! outlives its request.
//!
//! # Example Usage
//!
//! ```ignore
//! use screencraft::llm::MockLLMClient;
//! use screencraft::pipeline::{AnalysisPipeline, GenerationParams, UploadedArtifact};
//! use std::sync::Arc;
//!
//! async fn analyze(upload: UploadedArtifact) {
//!     let llm = Arc::new(MockLLMClient::new());
//!     let pipeline = AnalysisPipeline::new(llm, GenerationParams::default());
//!
//!     let run = pipeline.run(Some(upload)).await;
//!     println!("{} {:?}", run.envelope.status_code(), run.envelope.component());
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: intake, description, completion, fallback and cleanup
//! - [`llm`]: completion backends behind the [`LLMClient`] trait
//! - [`server`]: axum routes, multipart intake and CORS
//! - [`config`]: environment-driven [`ServerConfig`]

pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod util;

pub use config::{ConfigError, Provider, ServerConfig};
pub use llm::{BackendError, LLMClient};
pub use pipeline::{AnalysisPipeline, ResponseEnvelope};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
