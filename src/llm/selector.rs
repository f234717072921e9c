use crate::config::{Provider, ServerConfig};
use crate::llm::{BackendError, GenAIClient, LLMClient, OpenAICompatibleClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct SelectedClient {
    pub client: Arc<dyn LLMClient>,
    pub description: String,
}

impl std::fmt::Debug for SelectedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedClient")
            .field("name", &self.client.name())
            .field("description", &self.description)
            .finish()
    }
}

/// Builds the completion backend named by the configuration
pub fn select_llm_client(config: &ServerConfig) -> Result<SelectedClient, BackendError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let selected = match config.provider {
        Provider::OpenAICompatible => {
            let endpoint = config.effective_base_url().to_string();
            let client = OpenAICompatibleClient::with_timeout(
                endpoint.clone(),
                config.model.clone(),
                config.api_key.clone(),
                timeout,
            )?;
            SelectedClient {
                client: Arc::new(client),
                description: format!("openai-compatible {} ({})", endpoint, config.model),
            }
        }
        Provider::GenAI(kind) => {
            let client = GenAIClient::new(
                kind,
                config.model.clone(),
                config.api_key.clone(),
                config.api_base_url.clone(),
                timeout,
            )?;
            SelectedClient {
                client: Arc::new(client),
                description: format!("{} ({})", kind.as_str(), config.model),
            }
        }
    };

    info!("Using completion backend: {}", selected.description);
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai::adapter::AdapterKind;

    #[test]
    fn test_selects_openai_compatible_by_default() {
        let config = ServerConfig::default();
        let selected = select_llm_client(&config).unwrap();
        assert_eq!(selected.client.name(), "openai-compatible");
        assert!(selected.description.contains("mixtral-8x7b-32768"));
    }

    #[test]
    fn test_selects_genai_adapter() {
        let config = ServerConfig {
            provider: Provider::GenAI(AdapterKind::Groq),
            api_key: Some("gsk_test".to_string()),
            ..ServerConfig::default()
        };
        let selected = select_llm_client(&config).unwrap();
        assert_eq!(selected.client.name(), "Groq");
    }
}
