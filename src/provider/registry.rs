//! Provider registry for managing adapter instances.
//!
//! The registry maps each [`ProviderId`] to one long-lived adapter. Adapters
//! are stored as `Arc<dyn ProviderAdapter>` so the manager, the brainstorm
//! orchestrator and the CLI front end can share them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chorus::config::Config;
//! use chorus::provider::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_config(&Config::default());
//! registry.initialize_all().await;
//!
//! for adapter in registry.get_available().await {
//!     println!("{} is installed", adapter.display_name());
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::adapter::ProviderAdapter;
use super::claude::ClaudeAdapter;
use super::codex::CodexAdapter;
use super::copilot::CopilotAdapter;
use super::gemini::GeminiAdapter;
use crate::ProviderId;
use crate::config::Config;

/// Central registry of provider adapters.
///
/// # Ordering
///
/// Adapters are kept in a `BTreeMap`, so listing order follows
/// [`ProviderId`] declaration order (Claude, Codex, Gemini, Copilot) rather
/// than registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the four built-in CLI adapters.
    ///
    /// # Registered Adapters
    ///
    /// - `claude-code` → [`ClaudeAdapter`]
    /// - `openai-codex` → [`CodexAdapter`]
    /// - `google-gemini` → [`GeminiAdapter`]
    /// - `github-copilot` → [`CopilotAdapter`]
    pub fn with_config(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClaudeAdapter::from_config(config)));
        registry.register(Arc::new(CodexAdapter::from_config(config)));
        registry.register(Arc::new(GeminiAdapter::from_config(config)));
        registry.register(Arc::new(CopilotAdapter::from_config(config)));
        registry
    }

    /// Registers an adapter, replacing any adapter with the same id.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let id = adapter.id();
        if self.adapters.insert(id, adapter).is_some() {
            debug!(provider = %id, "Replaced registered adapter");
        }
    }

    /// Gets an adapter by id.
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&id).cloned()
    }

    /// All registered adapters.
    pub fn list_all(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        self.adapters.values().cloned().collect()
    }

    /// Registered provider ids.
    pub fn ids(&self) -> Vec<ProviderId> {
        self.adapters.keys().copied().collect()
    }

    /// Runs each adapter's initialization in turn.
    ///
    /// A failing adapter is logged and skipped; an uninstalled CLI never
    /// blocks the others. Returns the ids that initialized successfully.
    pub async fn initialize_all(&self) -> Vec<ProviderId> {
        let mut ready = Vec::new();
        for (id, adapter) in &self.adapters {
            match adapter.initialize().await {
                Ok(()) => ready.push(*id),
                Err(e) => warn!(provider = %id, "Provider unavailable: {:#}", e),
            }
        }
        ready
    }

    /// Adapters whose CLI is installed.
    pub async fn get_available(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut available = Vec::new();
        for adapter in self.adapters.values() {
            if adapter.discover_cli().await.found {
                available.push(adapter.clone());
            }
        }
        available
    }

    /// Adapters whose CLI is installed and has credentials.
    pub async fn get_authenticated(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut authenticated = Vec::new();
        for adapter in self.get_available().await {
            if adapter.check_authentication().await.authenticated {
                authenticated.push(adapter);
            }
        }
        authenticated
    }

    /// Cancels in-flight requests on every adapter.
    pub fn cancel_all(&self) {
        for adapter in self.adapters.values() {
            adapter.cancel_current_request();
        }
    }

    /// Disposes every adapter.
    pub fn dispose_all(&self) {
        for adapter in self.adapters.values() {
            adapter.dispose();
        }
    }
}
