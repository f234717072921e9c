use super::commands::{HealthArgs, ServeArgs};
use crate::config::ServerConfig;
use crate::llm::select_llm_client;
use crate::server::{self, HealthResponse};
use std::time::Duration;
use tracing::{debug, error, info};

/// Runs the service; returns the process exit code
pub async fn handle_serve(args: &ServeArgs, log_level: Option<&str>) -> i32 {
    let mut config = ServerConfig::from_env();
    args.apply(&mut config);
    if let Some(level) = log_level {
        config.log_level = level.to_lowercase();
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return 2;
    }
    debug!("{}", config);

    if config.api_key.is_none() {
        info!("No API key configured; set SCREENCRAFT_API_KEY or GROQ_API_KEY");
    }

    let selected = match select_llm_client(&config) {
        Ok(selected) => selected,
        Err(e) => {
            error!("Failed to initialize completion backend: {}", e);
            return 1;
        }
    };

    match server::serve(&config, selected.client).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

/// Probes `GET <url>/health`; exit code 0 only for a healthy answer
pub async fn handle_health(args: &HealthArgs) -> i32 {
    let url = format!("{}/health", args.url.trim_end_matches('/'));

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return 1;
        }
    };

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("✗ {} unreachable: {}", url, e);
            return 1;
        }
    };

    if !response.status().is_success() {
        eprintln!("✗ {} returned {}", url, response.status());
        return 1;
    }

    match response.json::<HealthResponse>().await {
        Ok(body) if body.status == "healthy" => {
            println!("✓ healthy ({})", body.timestamp);
            0
        }
        Ok(body) => {
            eprintln!("✗ service reports status '{}'", body.status);
            1
        }
        Err(e) => {
            eprintln!("✗ unexpected health payload: {}", e);
            1
        }
    }
}
