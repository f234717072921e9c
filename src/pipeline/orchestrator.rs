//! Request state machine: validate, describe, generate or fall back, clean up

use super::artifact::UploadedArtifact;
use super::completion::{CompletionClient, CompletionResult, FailureKind, GenerationParams};
use super::describe::{LayoutDescriber, LayoutDescription, TemplateDescriber};
use super::envelope::ResponseEnvelope;
use super::fallback::fallback_component;
use super::intake;
use crate::llm::LLMClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Steps a request moves through; every run ends in `Responded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Validated,
    Described,
    Completed,
    FallenBack,
    Cleaned,
    Responded,
}

/// Component produced for a description, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Generated {
        code: String,
    },
    Fallback {
        component: String,
        reason: String,
        kind: FailureKind,
    },
}

/// Outcome of one request plus the states it visited
#[derive(Debug)]
pub struct PipelineRun {
    pub envelope: ResponseEnvelope,
    pub trail: Vec<PipelineState>,
}

struct StateTrail(Vec<PipelineState>);

impl StateTrail {
    fn new() -> Self {
        Self(vec![PipelineState::Received])
    }

    fn advance(&mut self, next: PipelineState) {
        if let Some(current) = self.0.last() {
            debug!(from = ?current, to = ?next, "Pipeline transition");
        }
        self.0.push(next);
    }
}

pub struct AnalysisPipeline {
    describer: Arc<dyn LayoutDescriber>,
    completion: CompletionClient,
}

impl AnalysisPipeline {
    /// Pipeline using the fixed layout template
    pub fn new(llm: Arc<dyn LLMClient>, params: GenerationParams) -> Self {
        Self {
            describer: Arc::new(TemplateDescriber),
            completion: CompletionClient::new(llm, params),
        }
    }

    pub fn with_describer(mut self, describer: Arc<dyn LayoutDescriber>) -> Self {
        self.describer = describer;
        self
    }

    pub fn describe(&self, image: &[u8]) -> LayoutDescription {
        self.describer.describe(image)
    }

    /// Completion with the fallback folded in; never fails
    pub async fn generate(&self, description: &LayoutDescription) -> Generation {
        match self.completion.complete(description).await {
            CompletionResult::Generated { code } => Generation::Generated { code },
            CompletionResult::UpstreamFailure { reason, kind } => Generation::Fallback {
                component: fallback_component(description),
                reason,
                kind,
            },
        }
    }

    /// Runs one request end to end
    ///
    /// Any upload that passes validation is deleted before this returns,
    /// whatever the outcome.
    pub async fn run(&self, upload: Option<UploadedArtifact>) -> PipelineRun {
        let start = Instant::now();
        let mut trail = StateTrail::new();

        let mut artifact = match intake::validate(upload).await {
            Ok(artifact) => artifact,
            Err(e) => {
                info!(reason = %e, "Rejected upload");
                trail.advance(PipelineState::Responded);
                return PipelineRun {
                    envelope: ResponseEnvelope::client_error(e.to_string()),
                    trail: trail.0,
                };
            }
        };
        trail.advance(PipelineState::Validated);

        let outcome = self.process(&artifact, &mut trail).await;

        let cleanup = artifact
            .cleanup()
            .await
            .with_context(|| format!("Failed to remove uploaded artifact {}", artifact.path().display()));
        trail.advance(PipelineState::Cleaned);

        let envelope = match (outcome, cleanup) {
            (Err(e), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    error!(error = ?cleanup_err, "Cleanup failed after pipeline error");
                }
                error!(error = ?e, "Pipeline failed");
                ResponseEnvelope::server_error(&e)
            }
            (Ok(_), Err(cleanup_err)) => {
                error!(error = ?cleanup_err, "Cleanup failed");
                ResponseEnvelope::server_error(&cleanup_err)
            }
            (Ok(Generation::Generated { code }), Ok(_)) => ResponseEnvelope::success(code),
            (
                Ok(Generation::Fallback {
                    component,
                    reason,
                    kind,
                }),
                Ok(_),
            ) => {
                warn!(reason = %reason, kind = ?kind, "Serving fallback component");
                ResponseEnvelope::degraded(component, reason, kind)
            }
        };
        trail.advance(PipelineState::Responded);

        info!(
            status = envelope.status_code(),
            total_time_ms = start.elapsed().as_millis(),
            "Analysis complete"
        );

        PipelineRun {
            envelope,
            trail: trail.0,
        }
    }

    async fn process(&self, artifact: &UploadedArtifact, trail: &mut StateTrail) -> Result<Generation> {
        let image = artifact
            .read()
            .await
            .with_context(|| format!("Failed to read uploaded artifact {}", artifact.path().display()))?;

        let description = self.describe(&image);
        debug!(
            describer = self.describer.name(),
            excerpt = %description.excerpt(),
            "Layout described"
        );
        trail.advance(PipelineState::Described);

        let generation = self.generate(&description).await;
        trail.advance(match generation {
            Generation::Generated { .. } => PipelineState::Completed,
            Generation::Fallback { .. } => PipelineState::FallenBack,
        });

        Ok(generation)
    }
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("describer", &self.describer.name())
            .field("backend", &self.completion.backend_name())
            .field("params", &self.completion.params())
            .finish()
    }
}
