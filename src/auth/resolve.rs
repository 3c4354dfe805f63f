//! Credential precedence chain (spec §4.10 `resolveAuth`).

use tracing::info;

use crate::auth::credentials::TokenStore;
use crate::core::config::{AuthMethod, HandoverConfig};
use crate::core::errors::{HandoverError, Result};
use crate::provider::presets::ProviderPreset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    CliFlag,
    EnvVar,
    CredentialStore,
    InteractivePrompt,
    Local,
}

impl AuthSource {
    fn label(&self) -> &'static str {
        match self {
            Self::CliFlag => "cli-flag",
            Self::EnvVar => "env-var",
            Self::CredentialStore => "credential-store",
            Self::InteractivePrompt => "interactive-prompt",
            Self::Local => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedAuth {
    pub token: String,
    pub source: AuthSource,
}

/// Prompts for a secret interactively; returns `None` on cancellation. A
/// trait so tests can stub interactive input without a real TTY.
pub trait SecretPrompt {
    fn prompt(&self, message: &str) -> Option<String>;
}

pub struct DialoguerPrompt;

impl SecretPrompt for DialoguerPrompt {
    fn prompt(&self, message: &str) -> Option<String> {
        dialoguer::Password::new().with_prompt(message).interact().ok()
    }
}

/// Resolves credentials per spec §4.10's five-step precedence chain. Local
/// providers short-circuit before step 2 with a dummy credential.
pub fn resolve_auth(
    config: &HandoverConfig,
    preset: &ProviderPreset,
    cli_api_key: Option<&str>,
    non_interactive: bool,
    prompt: &dyn SecretPrompt,
) -> Result<ResolvedAuth> {
    if preset.is_local {
        info!(provider = config.provider.preset_key(), source = "local", "auth resolved");
        return Ok(ResolvedAuth { token: String::new(), source: AuthSource::Local });
    }

    if let Some(key) = cli_api_key {
        info!(provider = config.provider.preset_key(), source = AuthSource::CliFlag.label(), "auth resolved");
        return Ok(ResolvedAuth { token: key.to_string(), source: AuthSource::CliFlag });
    }

    let env_var = config.api_key_env.as_deref().unwrap_or(preset.api_key_env);
    if !env_var.is_empty() {
        if let Ok(value) = std::env::var(env_var) {
            info!(provider = config.provider.preset_key(), source = AuthSource::EnvVar.label(), "auth resolved");
            return Ok(ResolvedAuth { token: value, source: AuthSource::EnvVar });
        }
    }

    if matches!(config.auth_method, AuthMethod::Subscription) {
        let store = TokenStore::new();
        if let Some(stored) = store.read() {
            if stored.provider == config.provider.preset_key() {
                info!(provider = config.provider.preset_key(), source = AuthSource::CredentialStore.label(), "auth resolved");
                return Ok(ResolvedAuth { token: stored.token, source: AuthSource::CredentialStore });
            }
        }
    }

    if non_interactive {
        return Err(HandoverError::auth(
            "AUTH_NO_CREDENTIAL",
            format!(
                "no credential available for '{}'; set it via --api-key, the {env_var} environment variable, or run the interactive login",
                config.provider.preset_key()
            ),
        ));
    }

    match prompt.prompt(&format!("Enter API key for {}", preset.display_name)) {
        Some(token) => {
            info!(provider = config.provider.preset_key(), source = AuthSource::InteractivePrompt.label(), "auth resolved");
            Ok(ResolvedAuth { token, source: AuthSource::InteractivePrompt })
        }
        None => Err(HandoverError::auth("AUTH_CANCELLED", "credential prompt was cancelled")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderName;
    use crate::provider::presets;

    struct AlwaysCancel;
    impl SecretPrompt for AlwaysCancel {
        fn prompt(&self, _message: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn local_provider_short_circuits() {
        let mut config = HandoverConfig::default();
        config.provider = ProviderName::Ollama;
        let preset = presets::preset("ollama").unwrap();
        let resolved = resolve_auth(&config, preset, None, true, &AlwaysCancel).unwrap();
        assert_eq!(resolved.source, AuthSource::Local);
    }

    #[test]
    fn cli_flag_wins_over_everything() {
        let config = HandoverConfig::default();
        let preset = presets::preset("anthropic").unwrap();
        let resolved = resolve_auth(&config, preset, Some("sk-cli"), true, &AlwaysCancel).unwrap();
        assert_eq!(resolved.source, AuthSource::CliFlag);
        assert_eq!(resolved.token, "sk-cli");
    }

    #[test]
    fn non_interactive_without_credential_fails_with_code() {
        let config = HandoverConfig::default();
        let preset = presets::preset("anthropic").unwrap();
        std::env::remove_var("ANTHROPIC_API_KEY");
        let err = resolve_auth(&config, preset, None, true, &AlwaysCancel).unwrap_err();
        assert!(matches!(err, HandoverError::Auth { code: "AUTH_NO_CREDENTIAL", .. }));
    }

    #[test]
    fn interactive_cancel_yields_auth_cancelled() {
        let config = HandoverConfig::default();
        let preset = presets::preset("anthropic").unwrap();
        std::env::remove_var("ANTHROPIC_API_KEY");
        let err = resolve_auth(&config, preset, None, false, &AlwaysCancel).unwrap_err();
        assert!(matches!(err, HandoverError::Auth { code: "AUTH_CANCELLED", .. }));
    }
}
