use crate::config::{parse_provider, Provider, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turns UI screenshots into React components through an LLM completion API
#[derive(Parser, Debug)]
#[command(
    name = "screencraft",
    about = "Turns UI screenshots into React components through an LLM completion API",
    version,
    long_about = "screencraft runs an HTTP service that accepts a screenshot upload, asks a \
                  chat-completion backend (Groq by default) for a matching React component, \
                  and falls back to a placeholder component when the backend is unavailable."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the HTTP service",
        long_about = "Starts the screenshot analysis service. Settings come from SCREENCRAFT_* \
                      environment variables; flags override them.\n\n\
                      Examples:\n  \
                      screencraft serve\n  \
                      screencraft serve --port 8080 --upload-dir /tmp/shots\n  \
                      screencraft serve --provider groq --model llama-3.1-70b-versatile"
    )]
    Serve(ServeArgs),

    #[command(
        about = "Check a running service",
        long_about = "Calls GET /health on a running instance and exits non-zero unless it \
                      reports healthy.\n\n\
                      Examples:\n  \
                      screencraft health\n  \
                      screencraft health --url http://10.0.0.5:3001"
    )]
    Health(HealthArgs),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, value_name = "HOST", help = "Address to bind")]
    pub host: Option<String>,

    #[arg(short = 'p', long, value_name = "PORT", help = "Port to bind")]
    pub port: Option<u16>,

    #[arg(long, value_name = "DIR", help = "Directory for temporary uploads")]
    pub upload_dir: Option<PathBuf>,

    #[arg(
        short = 'b',
        long,
        value_parser = parse_provider_arg,
        help = "Completion backend (openai-compatible, groq, openai, claude, gemini, grok, ollama)"
    )]
    pub provider: Option<Provider>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Model name")]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Upstream request timeout in seconds")]
    pub timeout: Option<u64>,
}

impl ServeArgs {
    /// Overlays the flags that were given onto `config`
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.upload_dir {
            config.upload_dir = dir.clone();
        }
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        long,
        value_name = "URL",
        default_value = "http://localhost:3001",
        help = "Base URL of the running service"
    )]
    pub url: String,

    #[arg(long, value_name = "SECONDS", default_value = "5", help = "Request timeout")]
    pub timeout: u64,
}

fn parse_provider_arg(s: &str) -> Result<Provider, String> {
    parse_provider(s).map_err(|e| e.to_string())
}
