//! Screenshot analysis pipeline
//!
//! Intake validation, layout description, one completion call, and a
//! deterministic fallback, with the uploaded file removed on every path.

pub mod artifact;
pub mod completion;
pub mod describe;
pub mod envelope;
pub mod fallback;
pub mod intake;
pub mod orchestrator;

pub use artifact::UploadedArtifact;
pub use completion::{extract_code, CompletionClient, CompletionResult, FailureKind, GenerationParams};
pub use describe::{LayoutDescriber, LayoutDescription, TemplateDescriber};
pub use envelope::{ResponseEnvelope, DEGRADED_STATUS};
pub use fallback::fallback_component;
pub use intake::IntakeError;
pub use orchestrator::{AnalysisPipeline, Generation, PipelineRun, PipelineState};
