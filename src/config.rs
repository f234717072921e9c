//! Configuration management for screencraft
//!
//! Settings are loaded once at startup and passed down as a plain value; the
//! analysis pipeline never reads the environment itself.
//!
//! # Environment Variables
//!
//! - `SCREENCRAFT_HOST`: Bind address - default: "0.0.0.0"
//! - `SCREENCRAFT_PORT`: Bind port - default: "3001"
//! - `SCREENCRAFT_UPLOAD_DIR`: Temporary upload directory - default: "uploads"
//! - `SCREENCRAFT_MAX_UPLOAD_BYTES`: Per-file upload limit - default: 10 MiB
//! - `SCREENCRAFT_ALLOWED_ORIGINS`: Comma-separated CORS origins - default: local dev origins
//! - `SCREENCRAFT_PROVIDER`: `openai-compatible` or a genai adapter
//!   (groq|openai|claude|gemini|grok|ollama) - default: "openai-compatible"
//! - `SCREENCRAFT_API_BASE_URL`: Completion API base URL - default: Groq's OpenAI endpoint
//! - `SCREENCRAFT_API_KEY` (or `GROQ_API_KEY`): Completion API credential
//! - `SCREENCRAFT_MODEL`: Model name - default: "mixtral-8x7b-32768"
//! - `SCREENCRAFT_REQUEST_TIMEOUT`: Upstream timeout in seconds - default: "60"
//! - `SCREENCRAFT_TEMPERATURE`: Sampling temperature - default: "0.3"
//! - `SCREENCRAFT_MAX_TOKENS`: Output token bound - default: "4096"
//! - `SCREENCRAFT_RATE_LIMIT_MAX`: Requests accepted per window on `/api/analyze` - default: "100"
//! - `SCREENCRAFT_RATE_LIMIT_WINDOW_SECS`: Rate-limit window in seconds - default: "900"
//! - `SCREENCRAFT_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use screencraft::ServerConfig;
//!
//! let config = ServerConfig::from_env();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];
const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RATE_LIMIT_MAX: u64 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Which completion backend serves the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Plain HTTP client against an OpenAI-shaped chat-completions API
    OpenAICompatible,
    /// One of the genai crate's native adapters
    GenAI(AdapterKind),
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAICompatible => "openai-compatible",
            Provider::GenAI(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a provider name as accepted by `SCREENCRAFT_PROVIDER` and `--provider`
pub fn parse_provider(s: &str) -> Result<Provider, ConfigError> {
    match s.to_lowercase().as_str() {
        "openai-compatible" | "openai_compatible" | "http" => Ok(Provider::OpenAICompatible),
        "groq" => Ok(Provider::GenAI(AdapterKind::Groq)),
        "openai" => Ok(Provider::GenAI(AdapterKind::OpenAI)),
        "claude" | "anthropic" => Ok(Provider::GenAI(AdapterKind::Anthropic)),
        "gemini" => Ok(Provider::GenAI(AdapterKind::Gemini)),
        "grok" | "xai" => Ok(Provider::GenAI(AdapterKind::Xai)),
        "ollama" => Ok(Provider::GenAI(AdapterKind::Ollama)),
        _ => Err(ConfigError::InvalidProvider(s.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: openai-compatible, groq, openai, claude, gemini, grok, ollama")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub provider: Provider,
    /// Base URL override; `None` means the backend's default endpoint
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Requests accepted per window on the analyze route
    pub rate_limit_max: u64,
    pub rate_limit_window_secs: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            provider: Provider::OpenAICompatible,
            api_base_url: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl ServerConfig {
    /// Defaults overlaid with any `SCREENCRAFT_*` variables present
    ///
    /// Unparseable values fall back to the default; `validate` catches the rest.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider = env::var("SCREENCRAFT_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(defaults.provider);

        let allowed_origins = env::var("SCREENCRAFT_ALLOWED_ORIGINS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.allowed_origins);

        let api_key = env::var("SCREENCRAFT_API_KEY")
            .or_else(|_| env::var("GROQ_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());

        Self {
            host: env::var("SCREENCRAFT_HOST").unwrap_or(defaults.host),
            port: env_parse("SCREENCRAFT_PORT").unwrap_or(defaults.port),
            upload_dir: env::var("SCREENCRAFT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_parse("SCREENCRAFT_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            allowed_origins,
            provider,
            api_base_url: env::var("SCREENCRAFT_API_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty()),
            api_key,
            model: env::var("SCREENCRAFT_MODEL").unwrap_or(defaults.model),
            request_timeout_secs: env_parse("SCREENCRAFT_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout_secs),
            temperature: env_parse("SCREENCRAFT_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: env_parse("SCREENCRAFT_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            rate_limit_max: env_parse("SCREENCRAFT_RATE_LIMIT_MAX")
                .unwrap_or(defaults.rate_limit_max),
            rate_limit_window_secs: env_parse("SCREENCRAFT_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or(defaults.rate_limit_window_secs),
            log_level: env::var("SCREENCRAFT_LOG_LEVEL")
                .unwrap_or(defaults.log_level)
                .to_lowercase(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Port must be non-zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max upload size must be positive".to_string(),
            ));
        }
        if self.max_upload_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::ValidationFailed(
                "Max upload size cannot exceed 100MB".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 || self.max_tokens > 32_768 {
            return Err(ConfigError::ValidationFailed(
                "Max tokens must be between 1 and 32768".to_string(),
            ));
        }

        if self.rate_limit_max == 0 {
            return Err(ConfigError::ValidationFailed(
                "Rate limit must allow at least 1 request per window".to_string(),
            ));
        }
        if self.rate_limit_window_secs == 0 || self.rate_limit_window_secs > 24 * 60 * 60 {
            return Err(ConfigError::ValidationFailed(
                "Rate limit window must be between 1 second and 24 hours".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one allowed origin is required".to_string(),
            ));
        }
        for origin in &self.allowed_origins {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(ConfigError::ParseError {
                    field: "allowed_origins".to_string(),
                    error: format!("'{}' is not an http(s) origin", origin),
                });
            }
        }

        Ok(())
    }

    /// Base URL the OpenAI-compatible client talks to
    pub fn effective_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credential with everything past the first 10 characters hidden
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(10).collect::<String>()),
            None => "<not set>".to_string(),
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Screencraft Configuration:")?;
        writeln!(f, "  Bind: {}", self.bind_address())?;
        writeln!(f, "  Upload Dir: {}", self.upload_dir.display())?;
        writeln!(f, "  Max Upload: {} bytes", self.max_upload_bytes)?;
        writeln!(f, "  Allowed Origins: {}", self.allowed_origins.join(", "))?;
        writeln!(f, "  Provider: {}", self.provider)?;
        if let Some(ref url) = self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  API Key: {}", self.masked_api_key())?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Temperature: {}", self.temperature)?;
        writeln!(f, "  Max Tokens: {}", self.max_tokens)?;
        writeln!(
            f,
            "  Rate Limit: {} requests / {}s",
            self.rate_limit_max, self.rate_limit_window_secs
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_default_configuration() {
        let config = ServerConfig::default();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.provider, Provider::OpenAICompatible);
        assert_eq!(config.effective_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("SCREENCRAFT_PORT", "8080"),
            EnvGuard::set("SCREENCRAFT_PROVIDER", "groq"),
            EnvGuard::set("SCREENCRAFT_MODEL", "llama-3.1-8b-instant"),
            EnvGuard::set("SCREENCRAFT_API_KEY", "gsk_abcdefghijklmnop"),
            EnvGuard::set("SCREENCRAFT_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            EnvGuard::set("SCREENCRAFT_REQUEST_TIMEOUT", "15"),
            EnvGuard::set("SCREENCRAFT_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("SCREENCRAFT_RATE_LIMIT_MAX", "20"),
            EnvGuard::set("SCREENCRAFT_RATE_LIMIT_WINDOW_SECS", "60"),
        ];

        let config = ServerConfig::from_env();

        assert_eq!(config.port, 8080);
        assert_eq!(config.provider, Provider::GenAI(AdapterKind::Groq));
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.api_key.as_deref(), Some("gsk_abcdefghijklmnop"));
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.rate_limit_max, 20);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn test_groq_key_fallback() {
        let _guards = vec![
            EnvGuard::set("SCREENCRAFT_API_KEY", ""),
            EnvGuard::set("GROQ_API_KEY", "gsk_from_groq_env"),
        ];
        env::remove_var("SCREENCRAFT_API_KEY");

        let config = ServerConfig::from_env();
        assert_eq!(config.api_key.as_deref(), Some("gsk_from_groq_env"));
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back() {
        let _guards = vec![
            EnvGuard::set("SCREENCRAFT_PORT", "not-a-port"),
            EnvGuard::set("SCREENCRAFT_PROVIDER", "skynet"),
        ];

        let config = ServerConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.provider, Provider::OpenAICompatible);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(
            parse_provider("openai-compatible").unwrap(),
            Provider::OpenAICompatible
        );
        assert_eq!(
            parse_provider("Claude").unwrap(),
            Provider::GenAI(AdapterKind::Anthropic)
        );
        assert!(matches!(
            parse_provider("nope"),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    fn test_configuration_validation_invalid_timeout() {
        let config = ServerConfig {
            request_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_log_level() {
        let config = ServerConfig {
            log_level: "invalid".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_bad_origin() {
        let config = ServerConfig {
            allowed_origins: vec!["localhost:3000".to_string()],
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ParseError { .. })
        ));

        let empty = ServerConfig {
            allowed_origins: vec![],
            ..ServerConfig::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_temperature() {
        let config = ServerConfig {
            temperature: 3.5,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_defaults_and_validation() {
        let config = ServerConfig::default();
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));

        let zero_max = ServerConfig {
            rate_limit_max: 0,
            ..ServerConfig::default()
        };
        assert!(zero_max.validate().is_err());

        let zero_window = ServerConfig {
            rate_limit_window_secs: 0,
            ..ServerConfig::default()
        };
        assert!(zero_window.validate().is_err());
    }

    #[test]
    fn test_masked_api_key() {
        let config = ServerConfig {
            api_key: Some("gsk_nbwXbfr72fzLf9yiSZQ".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(config.masked_api_key(), "gsk_nbwXbf...");
        assert_eq!(ServerConfig::default().masked_api_key(), "<not set>");
    }

    #[test]
    fn test_config_display_hides_key() {
        let config = ServerConfig {
            api_key: Some("gsk_secret_value_123".to_string()),
            ..ServerConfig::default()
        };
        let display = format!("{}", config);
        assert!(display.contains("Screencraft Configuration:"));
        assert!(display.contains("Provider: openai-compatible"));
        assert!(display.contains("Rate Limit: 100 requests / 900s"));
        assert!(!display.contains("gsk_secret_value_123"));
    }
}
