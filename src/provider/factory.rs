//! Provider construction and fail-fast validation (spec §4.9 "Validation
//! order"). Grounded on the teacher's single-path Gemini client construction
//! in `oracle::mod.rs`, generalized into a factory selecting between the two
//! concrete `LLMProvider` implementations by preset `sdk_type`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::config::{HandoverConfig, ProviderName};
use crate::core::errors::{HandoverError, Result};
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::openai_compat::OpenAiCompatProvider;
use crate::provider::presets::{self, SdkType};
use crate::provider::types::{LLMProvider, PROVIDER_AZURE_NO_BASE_URL, PROVIDER_CUSTOM_NO_BASE_URL, PROVIDER_NO_API_KEY, PROVIDER_OLLAMA_NO_MODEL, PROVIDER_UNKNOWN};

/// Builds the concrete provider for `config`, running the four-step
/// validation order: (1) preset exists, (2) provider-specific structural
/// check, (3) API key present for non-local providers, (4) known-model
/// warning (non-fatal).
pub fn build_provider(config: &HandoverConfig, api_key: Option<&str>) -> Result<Arc<dyn LLMProvider>> {
    let key = config.provider.preset_key();
    let preset = presets::preset(key).ok_or_else(|| HandoverError::provider(PROVIDER_UNKNOWN, format!("no preset registered for provider '{key}'")))?;

    match config.provider {
        ProviderName::Ollama if config.model.is_none() => {
            return Err(HandoverError::provider(PROVIDER_OLLAMA_NO_MODEL, "ollama requires an explicit model"));
        }
        ProviderName::AzureOpenAI if config.base_url.is_none() => {
            return Err(HandoverError::provider(PROVIDER_AZURE_NO_BASE_URL, "azure-openai requires baseUrl"));
        }
        ProviderName::Custom if config.base_url.is_none() => {
            return Err(HandoverError::provider(PROVIDER_CUSTOM_NO_BASE_URL, "custom provider requires baseUrl"));
        }
        _ => {}
    }

    if !preset.is_local && api_key.is_none() {
        return Err(HandoverError::provider(
            PROVIDER_NO_API_KEY,
            format!("no API key resolved for provider '{key}' (expected env var {})", preset.api_key_env),
        ));
    }

    let model = config
        .model
        .clone()
        .or_else(|| preset.default_model.map(str::to_string))
        .ok_or_else(|| HandoverError::provider(PROVIDER_UNKNOWN, "no model configured and preset has no default"))?;

    if !preset.supported_models.is_empty() && !preset.is_known_model(&model) {
        warn!(provider = key, model = %model, "model is not in the known-good list for this preset; proceeding anyway");
    }

    let base_url = config.base_url.clone().unwrap_or_else(|| preset.base_url.to_string());
    let timeout = Duration::from_millis(preset.timeout_ms);
    let api_key = api_key.unwrap_or("").to_string();

    info!(provider = key, model = %model, sdk_type = ?preset.sdk_type, "provider constructed");

    let provider: Arc<dyn LLMProvider> = match (preset.sdk_type, config.provider) {
        (SdkType::AnthropicNative, _) => Arc::new(AnthropicProvider::new(base_url, api_key, model, preset.context_window, timeout)),
        (SdkType::OpenAiCompatible, ProviderName::AzureOpenAI) => {
            Arc::new(OpenAiCompatProvider::azure(base_url, api_key, model, preset.context_window, timeout))
        }
        (SdkType::OpenAiCompatible, _) => Arc::new(OpenAiCompatProvider::new(base_url, api_key, model, preset.context_window, timeout)),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::PROVIDER_NO_API_KEY;

    #[test]
    fn ollama_without_model_is_rejected() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::Ollama;
        config.model = None;

        let err = build_provider(&config, None).unwrap_err();
        assert_eq!(err.code(), Some(PROVIDER_OLLAMA_NO_MODEL));
    }

    #[test]
    fn azure_without_base_url_is_rejected() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::AzureOpenAI;
        config.base_url = None;

        let err = build_provider(&config, Some("key")).unwrap_err();
        assert_eq!(err.code(), Some(PROVIDER_AZURE_NO_BASE_URL));
    }

    #[test]
    fn non_local_provider_without_api_key_is_rejected() {
        let config = HandoverConfig::default();
        let err = build_provider(&config, None).unwrap_err();
        assert_eq!(err.code(), Some(PROVIDER_NO_API_KEY));
    }

    #[test]
    fn anthropic_with_key_builds_successfully() {
        let config = HandoverConfig::default();
        let provider = build_provider(&config, Some("sk-test")).unwrap();
        assert!(provider.max_context_tokens() > 0);
    }

    #[test]
    fn ollama_with_model_requires_no_api_key() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::Ollama;
        config.model = Some("llama3".to_string());

        let provider = build_provider(&config, None).unwrap();
        assert!(provider.max_context_tokens() > 0);
    }
}
