//! HTTP transport for the analysis pipeline
//!
//! Routes, multipart intake, rate limiting, CORS and request logging.
//! Everything here is built from a [`ServerConfig`] handed in by the caller.

pub mod handlers;
pub mod upload;

use crate::config::ServerConfig;
use crate::llm::LLMClient;
use crate::pipeline::{AnalysisPipeline, GenerationParams};
use anyhow::{Context, Result};
use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower::load_shed::LoadShedLayer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

pub use handlers::HealthResponse;
pub use upload::{UploadError, UploadStore, UPLOAD_FIELD};

/// Headroom above the file limit for multipart boundaries and part headers
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Requests allowed to queue in front of the limiter
const RATE_LIMIT_BUFFER: usize = 1024;

/// Fixed-window request budget shared by all callers of `/api/analyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u64,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub uploads: Arc<UploadStore>,
    pub rate_limit: RateLimitSettings,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, uploads: UploadStore) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            uploads: Arc::new(uploads),
            rate_limit: RateLimitSettings::default(),
        }
    }

    pub fn with_rate_limit(mut self, max_requests: u64, window: Duration) -> Self {
        self.rate_limit = RateLimitSettings {
            max_requests,
            window,
        };
        self
    }

    /// Wires the pipeline and upload store described by `config`
    pub fn from_config(config: &ServerConfig, llm: Arc<dyn LLMClient>) -> Self {
        let params = GenerationParams {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            ..GenerationParams::default()
        };
        Self::new(
            AnalysisPipeline::new(llm, params),
            UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes),
        )
        .with_rate_limit(config.rate_limit_max, config.rate_limit_window())
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis(),
        "HTTP request"
    );
    response
}

/// Builds the application router
///
/// Must be called inside a Tokio runtime: the rate limiter spawns its buffer
/// worker here. Over-budget requests are shed with 429 instead of queued.
pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let body_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD_BYTES;
    let RateLimitSettings {
        max_requests,
        window,
    } = state.rate_limit;

    let limiter = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handlers::rate_limit_error))
        .layer(BufferLayer::new(RATE_LIMIT_BUFFER))
        .layer(LoadShedLayer::new())
        .layer(RateLimitLayer::new(max_requests, window));

    Ok(Router::new()
        .route("/api/analyze", post(handlers::analyze).layer(limiter))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_requests))
                .layer(cors_layer(allowed_origins)?),
        )
        .with_state(state))
}

/// Binds, serves until Ctrl-C, then drains in-flight requests
pub async fn serve(config: &ServerConfig, llm: Arc<dyn LLMClient>) -> Result<()> {
    let state = AppState::from_config(config, llm);
    state
        .uploads
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;

    let app = router(state, &config.allowed_origins)?;

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Server running on http://{}", address);
    info!("Using {} with key: {}", config.provider, config.masked_api_key());
    info!(
        "Rate limit: {} requests per {}s",
        config.rate_limit_max, config.rate_limit_window_secs
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
