//! Route handlers and the response conversions they rely on

use super::upload::UploadError;
use super::AppState;
use crate::pipeline::ResponseEnvelope;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::load_shed::error::Overloaded;
use tower::BoxError;
use tracing::{debug, error, warn};

const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            UploadError::Storage(ref e) => {
                error!(error = %e, "Failed to store upload");
                let envelope = ResponseEnvelope::ServerError {
                    error: format!("Failed to process the screenshot: {}", self),
                    details: format!("{:?}", e),
                };
                (status, Json(envelope)).into_response()
            }
            _ => {
                warn!(error = %self, "Upload rejected by transport");
                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
        }
    }
}

/// `POST /api/analyze`
///
/// A request that is not multipart at all is treated as carrying no file.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match multipart {
        Ok(mut multipart) => match state.uploads.receive(&mut multipart).await {
            Ok(upload) => upload,
            Err(e) => return e.into_response(),
        },
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Request body is not multipart");
            None
        }
    };

    state.pipeline.run(upload).await.envelope.into_response()
}

/// Turns rate-limiter failures into responses
///
/// `Overloaded` means the current window is spent.
pub async fn rate_limit_error(err: BoxError) -> Response {
    if err.is::<Overloaded>() {
        warn!("Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": RATE_LIMIT_MESSAGE })),
        )
            .into_response();
    }

    error!(error = %err, "Rate limiter failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Failed to process the screenshot: {}", err) })),
    )
        .into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
