//! Response envelopes returned by the analysis pipeline

use super::completion::FailureKind;
use serde::Serialize;

/// Status for a fallback component, whatever the upstream failure was
pub const DEGRADED_STATUS: u16 = 429;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        component: String,
    },
    DegradedSuccess {
        component: String,
        message: String,
        error: String,
    },
    ClientError {
        error: String,
    },
    ServerError {
        error: String,
        details: String,
    },
}

impl ResponseEnvelope {
    pub fn success(component: impl Into<String>) -> Self {
        Self::Success {
            component: component.into(),
        }
    }

    /// Fallback response; `message` says which kind of failure was absorbed
    pub fn degraded(component: impl Into<String>, reason: impl Into<String>, kind: FailureKind) -> Self {
        Self::DegradedSuccess {
            component: component.into(),
            message: degraded_message(kind).to_string(),
            error: reason.into(),
        }
    }

    pub fn client_error(error: impl Into<String>) -> Self {
        Self::ClientError {
            error: error.into(),
        }
    }

    pub fn server_error(error: &anyhow::Error) -> Self {
        Self::ServerError {
            error: format!("Failed to process the screenshot: {}", error),
            details: format!("{:?}", error),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::DegradedSuccess { .. } => DEGRADED_STATUS,
            Self::ClientError { .. } => 400,
            Self::ServerError { .. } => 500,
        }
    }

    /// The component source, present on success and degraded success
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Success { component } | Self::DegradedSuccess { component, .. } => {
                Some(component)
            }
            Self::ClientError { .. } | Self::ServerError { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::DegradedSuccess { .. })
    }
}

fn degraded_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RateLimited => {
            "API rate limit exceeded. Generated a basic fallback component."
        }
        FailureKind::Unavailable => {
            "Completion service unavailable. Generated a basic fallback component."
        }
        FailureKind::EmptyGeneration => {
            "Completion service returned no code. Generated a basic fallback component."
        }
    }
}
