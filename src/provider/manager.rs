//! Facade that picks the adapter for a request

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use super::adapter::{AuthStatus, CliDiscovery, ProviderAdapter};
use super::error::ProviderError;
use super::registry::ProviderRegistry;
use super::stream::ChunkStream;
use crate::config::Config;
use crate::{MessageRequest, ProviderId};

/// Provider used when the requested one cannot be resolved
pub const FALLBACK_PROVIDER: ProviderId = ProviderId::ClaudeCode;

/// Installation and login state of one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub id: ProviderId,
    pub display_name: String,
    pub cli: CliDiscovery,
    /// Only checked when the CLI is installed
    pub auth: Option<AuthStatus>,
    pub has_session: bool,
    pub active: bool,
}

/// Resolves "which adapter" and delegates to it
pub struct ProviderManager {
    registry: ProviderRegistry,
    active: Mutex<String>,
}

impl ProviderManager {
    pub fn new(registry: ProviderRegistry, default_provider: impl Into<String>) -> Self {
        Self {
            registry,
            active: Mutex::new(default_provider.into()),
        }
    }

    /// Manager over the built-in adapters, defaulting to `[settings] default_provider`
    pub fn with_config(config: &Config) -> Self {
        Self::new(
            ProviderRegistry::with_config(config),
            config.settings.default_provider.clone(),
        )
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The configured active provider id, as written in config
    fn active_name(&self) -> String {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Change the provider used by [`send_message`](Self::send_message)
    pub fn set_active_provider(&self, id: &str) -> Result<ProviderId, ProviderError> {
        let parsed: ProviderId = id
            .parse()
            .map_err(|_| ProviderError::UnknownProvider(id.to_string()))?;
        if self.registry.get(parsed).is_none() {
            return Err(ProviderError::UnknownProvider(id.to_string()));
        }
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = parsed.as_str().to_string();
        info!(provider = %parsed, "Active provider changed");
        Ok(parsed)
    }

    /// Adapter for `id`, else the active provider, else claude-code.
    ///
    /// A stale or misspelled id falls back instead of failing, so a bad
    /// `default_provider` never blocks sending.
    pub fn resolve(&self, id: Option<&str>) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        let requested = id.map(str::to_string).unwrap_or_else(|| self.active_name());
        let found = requested
            .parse::<ProviderId>()
            .ok()
            .and_then(|parsed| self.registry.get(parsed));
        if let Some(adapter) = found {
            return Ok(adapter);
        }

        warn!(
            requested = %requested,
            fallback = %FALLBACK_PROVIDER,
            "Unknown provider, falling back"
        );
        self.registry
            .get(FALLBACK_PROVIDER)
            .ok_or(ProviderError::UnknownProvider(requested))
    }

    /// The adapter [`send_message`](Self::send_message) would use
    pub fn active_provider(&self) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        self.resolve(None)
    }

    /// Send to the active provider
    pub async fn send_message(&self, request: MessageRequest) -> Result<ChunkStream> {
        let adapter = self.resolve(None)?;
        adapter.send_message(request).await
    }

    /// Send to a specific provider
    pub async fn send_message_to_provider(&self, id: ProviderId, request: MessageRequest) -> Result<ChunkStream> {
        let adapter = self.resolve(Some(id.as_str()))?;
        adapter.send_message(request).await
    }

    /// Cancel in-flight requests of the active provider
    pub fn cancel_current_request(&self) {
        if let Ok(adapter) = self.resolve(None) {
            adapter.cancel_current_request();
        }
    }

    /// Cancel in-flight requests of every provider
    pub fn cancel_all(&self) {
        self.registry.cancel_all();
    }

    /// Forget the CLI session of `id`, or of the active provider
    pub fn clear_session(&self, id: Option<ProviderId>) {
        let name = id.map(|id| id.as_str().to_string());
        if let Ok(adapter) = self.resolve(name.as_deref()) {
            adapter.clear_session();
        }
    }

    /// Discovery and auth state of every registered provider
    pub async fn provider_statuses(&self) -> Vec<ProviderStatus> {
        let active = self.resolve(None).ok().map(|a| a.id());
        let mut statuses = Vec::new();
        for adapter in self.registry.list_all() {
            let cli = adapter.discover_cli().await;
            let auth = if cli.found {
                Some(adapter.check_authentication().await)
            } else {
                None
            };
            statuses.push(ProviderStatus {
                id: adapter.id(),
                display_name: adapter.display_name().to_string(),
                cli,
                auth,
                has_session: adapter.has_session(),
                active: active == Some(adapter.id()),
            });
        }
        statuses
    }

    pub fn dispose(&self) {
        self.registry.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_explicit_then_default_then_fallback() {
        let config: Config = toml::from_str("[settings]\ndefault_provider = \"gemini\"\n").unwrap();
        let manager = ProviderManager::with_config(&config);

        assert_eq!(manager.resolve(Some("codex")).unwrap().id(), ProviderId::OpenaiCodex);
        assert_eq!(manager.resolve(None).unwrap().id(), ProviderId::GoogleGemini);
        assert_eq!(manager.resolve(Some("cursor")).unwrap().id(), ProviderId::ClaudeCode);
    }

    #[test]
    fn stale_default_falls_back_to_claude() {
        let config: Config = toml::from_str("[settings]\ndefault_provider = \"openai-gpt4\"\n").unwrap();
        let manager = ProviderManager::with_config(&config);
        assert_eq!(manager.active_provider().unwrap().id(), ProviderId::ClaudeCode);
    }

    #[test]
    fn set_active_provider_validates() {
        let manager = ProviderManager::with_config(&Config::default());
        assert_eq!(manager.set_active_provider("copilot").unwrap(), ProviderId::GithubCopilot);
        assert_eq!(manager.active_provider().unwrap().id(), ProviderId::GithubCopilot);
        assert!(matches!(
            manager.set_active_provider("nope"),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn empty_registry_has_no_fallback() {
        let manager = ProviderManager::new(ProviderRegistry::new(), "claude-code");
        assert!(manager.resolve(None).is_err());
    }
}
