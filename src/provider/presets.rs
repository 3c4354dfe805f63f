//! Static provider preset registry (spec §4.9). Grounded on the provider
//! constants scattered through `oracle::mod.rs` (base URL, API key env var,
//! default model), collected here into one table keyed by provider name.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::provider::types::ModelPricing;

/// SDK wire-protocol family a preset speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkType {
    AnthropicNative,
    OpenAiCompatible,
}

#[derive(Debug, Clone)]
pub struct ProviderPreset {
    pub display_name: &'static str,
    pub base_url: &'static str,
    /// Empty for local providers (no key required).
    pub api_key_env: &'static str,
    pub default_model: Option<&'static str>,
    pub context_window: usize,
    pub default_concurrency: usize,
    pub is_local: bool,
    pub sdk_type: SdkType,
    pub pricing: &'static [(&'static str, ModelPricing)],
    pub supported_models: &'static [&'static str],
    pub timeout_ms: u64,
}

impl ProviderPreset {
    pub fn pricing_for(&self, model: &str) -> Option<ModelPricing> {
        self.pricing.iter().find(|(name, _)| *name == model).map(|(_, p)| *p)
    }

    pub fn is_known_model(&self, model: &str) -> bool {
        self.supported_models.contains(&model)
    }
}

macro_rules! pricing {
    ($($model:expr => ($in:expr, $out:expr)),* $(,)?) => {
        &[$(($model, ModelPricing { input_per_million: $in, output_per_million: $out })),*]
    };
}

static ANTHROPIC_PRICING: &[(&str, ModelPricing)] = pricing![
    "claude-3-opus-20240229" => (15.0, 75.0),
    "claude-3-5-sonnet-20241022" => (3.0, 15.0),
];
static OPENAI_PRICING: &[(&str, ModelPricing)] = pricing![
    "gpt-4o" => (2.5, 10.0),
    "gpt-4o-mini" => (0.15, 0.6),
];
static GROQ_PRICING: &[(&str, ModelPricing)] = pricing![
    "llama-3.3-70b-versatile" => (0.59, 0.79),
];
static TOGETHER_PRICING: &[(&str, ModelPricing)] = pricing![
    "meta-llama/Llama-3.3-70B-Instruct-Turbo" => (0.88, 0.88),
];
static DEEPSEEK_PRICING: &[(&str, ModelPricing)] = pricing![
    "deepseek-chat" => (0.27, 1.1),
];
static EMPTY_PRICING: &[(&str, ModelPricing)] = &[];

pub static PRESETS: Lazy<HashMap<&'static str, ProviderPreset>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert("anthropic", ProviderPreset {
        display_name: "Anthropic",
        base_url: "https://api.anthropic.com",
        api_key_env: "ANTHROPIC_API_KEY",
        default_model: Some("claude-3-5-sonnet-20241022"),
        context_window: 200_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::AnthropicNative,
        pricing: ANTHROPIC_PRICING,
        supported_models: &["claude-3-opus-20240229", "claude-3-5-sonnet-20241022"],
        timeout_ms: 120_000,
    });

    map.insert("openai", ProviderPreset {
        display_name: "OpenAI",
        base_url: "https://api.openai.com/v1",
        api_key_env: "OPENAI_API_KEY",
        default_model: Some("gpt-4o"),
        context_window: 128_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: OPENAI_PRICING,
        supported_models: &["gpt-4o", "gpt-4o-mini"],
        timeout_ms: 120_000,
    });

    map.insert("groq", ProviderPreset {
        display_name: "Groq",
        base_url: "https://api.groq.com/openai/v1",
        api_key_env: "GROQ_API_KEY",
        default_model: Some("llama-3.3-70b-versatile"),
        context_window: 128_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: GROQ_PRICING,
        supported_models: &["llama-3.3-70b-versatile"],
        timeout_ms: 120_000,
    });

    map.insert("together", ProviderPreset {
        display_name: "Together AI",
        base_url: "https://api.together.xyz/v1",
        api_key_env: "TOGETHER_API_KEY",
        default_model: Some("meta-llama/Llama-3.3-70B-Instruct-Turbo"),
        context_window: 128_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: TOGETHER_PRICING,
        supported_models: &["meta-llama/Llama-3.3-70B-Instruct-Turbo"],
        timeout_ms: 120_000,
    });

    map.insert("deepseek", ProviderPreset {
        display_name: "DeepSeek",
        base_url: "https://api.deepseek.com/v1",
        api_key_env: "DEEPSEEK_API_KEY",
        default_model: Some("deepseek-chat"),
        context_window: 64_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: DEEPSEEK_PRICING,
        supported_models: &["deepseek-chat"],
        timeout_ms: 120_000,
    });

    map.insert("azure-openai", ProviderPreset {
        display_name: "Azure OpenAI",
        base_url: "",
        api_key_env: "AZURE_OPENAI_API_KEY",
        default_model: None,
        context_window: 128_000,
        default_concurrency: 4,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: EMPTY_PRICING,
        supported_models: &[],
        timeout_ms: 120_000,
    });

    map.insert("ollama", ProviderPreset {
        display_name: "Ollama",
        base_url: "http://localhost:11434/v1",
        api_key_env: "",
        default_model: None,
        context_window: 32_000,
        default_concurrency: 1,
        is_local: true,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: EMPTY_PRICING,
        supported_models: &[],
        timeout_ms: 300_000,
    });

    map.insert("custom", ProviderPreset {
        display_name: "Custom",
        base_url: "",
        api_key_env: "LLM_API_KEY",
        default_model: None,
        context_window: 32_000,
        default_concurrency: 2,
        is_local: false,
        sdk_type: SdkType::OpenAiCompatible,
        pricing: EMPTY_PRICING,
        supported_models: &[],
        timeout_ms: 180_000,
    });

    map
});

pub fn preset(key: &str) -> Option<&'static ProviderPreset> {
    PRESETS.get(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_presets_have_no_api_key_env_and_clamp_concurrency() {
        let ollama = preset("ollama").unwrap();
        assert!(ollama.is_local);
        assert_eq!(ollama.api_key_env, "");
        assert_eq!(ollama.default_concurrency, 1);
        assert!(ollama.timeout_ms >= 300_000);
    }

    #[test]
    fn anthropic_preset_is_native_sdk() {
        let anthropic = preset("anthropic").unwrap();
        assert_eq!(anthropic.sdk_type, SdkType::AnthropicNative);
        assert!(anthropic.pricing_for("claude-3-5-sonnet-20241022").is_some());
    }
}
