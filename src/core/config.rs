//! Configuration types and loading for handover-core.
//!
//! Mirrors the recognized `<root>/<config>.yaml` shape from the spec: a
//! single immutable configuration record with defaulted fields and explicit
//! cross-field validation, rather than scattered runtime checks.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{HandoverError, Result};

/// Top-level configuration loaded from `<root>/handover.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverConfig {
    /// Which preset selects the provider implementation.
    pub provider: ProviderName,

    /// Credential resolution strategy.
    pub auth_method: AuthMethod,

    /// Explicit model override; required for local providers.
    pub model: Option<String>,

    /// Required for `azure-openai` and `custom` providers.
    pub base_url: Option<String>,

    /// Overrides the preset's default API key environment variable name.
    pub api_key_env: Option<String>,

    /// Output directory for rendered documents.
    pub output: PathBuf,

    /// Narrative vs. machine-readable rendering mode.
    pub audience: Audience,

    /// Additional include globs layered over the default ignore set.
    pub include: Vec<String>,

    /// Additional exclude globs layered over the default ignore set.
    pub exclude: Vec<String>,

    /// Analysis-stage settings.
    pub analysis: AnalysisSettings,

    /// Context window overrides.
    pub context_window: ContextWindowSettings,

    /// Dollar threshold above which a cost warning is surfaced.
    pub cost_warning_threshold: Option<f64>,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            provider: ProviderName::Anthropic,
            auth_method: AuthMethod::ApiKey,
            model: None,
            base_url: None,
            api_key_env: None,
            output: PathBuf::from("./handover"),
            audience: Audience::Human,
            include: Vec::new(),
            exclude: Vec::new(),
            analysis: AnalysisSettings::default(),
            context_window: ContextWindowSettings::default(),
            cost_warning_threshold: None,
        }
    }
}

impl HandoverConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| HandoverError::io(format!("Failed to read config file: {}", path.display()), e))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)
            .map_err(|e| HandoverError::io(format!("Failed to write config file: {}", path.display()), e))
    }

    /// Cross-field validation. The one `superRefine`-style rule from the
    /// spec: Anthropic cannot select subscription auth.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.provider, ProviderName::Anthropic)
            && matches!(self.auth_method, AuthMethod::Subscription)
        {
            return Err(HandoverError::config_field(
                "Anthropic provider does not support subscription auth; use authMethod: api-key",
                "authMethod",
            ));
        }

        if matches!(self.provider, ProviderName::AzureOpenAI | ProviderName::Custom)
            && self.base_url.is_none()
        {
            return Err(HandoverError::config_field(
                "baseUrl is required for azure-openai and custom providers",
                "baseUrl",
            ));
        }

        self.analysis.validate()?;
        Ok(())
    }

    /// Effective analysis concurrency, clamped to 1 under subscription auth
    /// regardless of the configured value (§4.10).
    pub fn effective_concurrency(&self, preset_default: usize) -> usize {
        if matches!(self.auth_method, AuthMethod::Subscription) {
            return 1;
        }
        self.analysis.concurrency.unwrap_or(preset_default)
    }
}

/// Provider selection, one preset per variant (§4.9/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderName {
    Anthropic,
    OpenAI,
    Ollama,
    Groq,
    Together,
    Deepseek,
    AzureOpenAI,
    Custom,
}

impl ProviderName {
    /// Stable preset key used to look up the static preset table.
    pub fn preset_key(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
            Self::Groq => "groq",
            Self::Together => "together",
            Self::Deepseek => "deepseek",
            Self::AzureOpenAI => "azure-openai",
            Self::Custom => "custom",
        }
    }
}

/// Credential resolution strategy (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    ApiKey,
    Subscription,
}

impl Default for AuthMethod {
    fn default() -> Self {
        Self::ApiKey
    }
}

/// Rendering audience mode (§4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Human,
    Ai,
}

impl Default for Audience {
    fn default() -> Self {
        Self::Human
    }
}

/// `analysis.*` settings (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Concurrent provider calls; subscription auth overrides this to 1.
    pub concurrency: Option<usize>,

    /// When true, skip all LLM rounds and emit only static-data documents.
    pub static_only: bool,

    /// How far back to scan git history (`default` windows to 6 months).
    pub git_depth: GitDepth,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            concurrency: None,
            static_only: false,
            git_depth: GitDepth::Default,
        }
    }
}

impl AnalysisSettings {
    fn validate(&self) -> Result<()> {
        if let Some(c) = self.concurrency {
            if c == 0 {
                return Err(HandoverError::config_field(
                    "analysis.concurrency must be at least 1",
                    "analysis.concurrency",
                ));
            }
        }
        Ok(())
    }
}

/// How far back `GitHistory` inspects commit log (§4.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitDepth {
    Default,
    Full,
}

impl Default for GitDepth {
    fn default() -> Self {
        Self::Default
    }
}

/// `contextWindow.*` overrides (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWindowSettings {
    /// Overrides the provider preset's context window size.
    pub max_tokens: Option<usize>,

    /// Paths that are always packed at the `full` tier.
    pub pin: Vec<String>,

    /// Paths whose priority score is boosted by +20.
    pub boost: Vec<String>,
}

impl Default for ContextWindowSettings {
    fn default() -> Self {
        Self {
            max_tokens: None,
            pin: Vec::new(),
            boost: Vec::new(),
        }
    }
}

/// Per-language settings retained for downstream analyzer capability plugins
/// (the AST capability interface consumes this; the extractors themselves
/// are out of scope per spec.md §1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Whether this language's AST extractor is enabled.
    pub enabled: bool,
    /// File extensions routed to this language (including the leading dot).
    pub file_extensions: Vec<String>,
}

/// Registry of enabled languages, keyed by language name.
pub fn default_languages() -> HashMap<String, LanguageConfig> {
    let mut languages = HashMap::new();
    languages.insert(
        "python".to_string(),
        LanguageConfig {
            enabled: true,
            file_extensions: vec![".py".to_string(), ".pyi".to_string()],
        },
    );
    languages.insert(
        "javascript".to_string(),
        LanguageConfig {
            enabled: true,
            file_extensions: vec![".js".to_string(), ".mjs".to_string(), ".jsx".to_string()],
        },
    );
    languages.insert(
        "typescript".to_string(),
        LanguageConfig {
            enabled: true,
            file_extensions: vec![".ts".to_string(), ".tsx".to_string()],
        },
    );
    languages.insert(
        "rust".to_string(),
        LanguageConfig {
            enabled: true,
            file_extensions: vec![".rs".to_string()],
        },
    );
    languages.insert(
        "go".to_string(),
        LanguageConfig {
            enabled: true,
            file_extensions: vec![".go".to_string()],
        },
    );
    languages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = HandoverConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn anthropic_subscription_is_rejected() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::Anthropic;
        config.auth_method = AuthMethod::Subscription;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HandoverError::Config { .. }));
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::Custom;
        config.base_url = None;
        assert!(config.validate().is_err());

        config.base_url = Some("https://example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn subscription_clamps_concurrency_to_one() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::OpenAI;
        config.auth_method = AuthMethod::Subscription;
        config.analysis.concurrency = Some(8);
        assert_eq!(config.effective_concurrency(4), 1);
    }

    #[test]
    fn yaml_round_trip_preserves_fields() {
        let config = HandoverConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let restored: HandoverConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(restored.output, config.output);
        assert_eq!(restored.audience, config.audience);
    }
}
