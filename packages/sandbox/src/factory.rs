// ABOUTME: Sandbox provider selection and lazy adapter construction
// ABOUTME: Picks a provider from config signals and caches one configured adapter

use crate::config::SandboxConfig;
use crate::providers::{DockerSandboxAdapter, SandboxAdapter};
use crate::types::SandboxProviderKind;
use crate::{Result, SandboxError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Builds and caches the sandbox adapter for the selected provider
pub struct SandboxFactory {
    config: SandboxConfig,
    provider: SandboxProviderKind,
    adapter: RwLock<Option<Arc<dyn SandboxAdapter>>>,
}

impl SandboxFactory {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;
        let provider = detect_provider(&config);
        info!("Sandbox factory initialized with provider: {}", provider);

        Ok(Self {
            config,
            provider,
            adapter: RwLock::new(None),
        })
    }

    /// Build from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(SandboxConfig::from_env()?)
    }

    pub fn provider(&self) -> SandboxProviderKind {
        self.provider
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.as_str()
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// The shared adapter, constructed on first use.
    ///
    /// An adapter that cannot reach its backend is discarded, so a later call
    /// tries again.
    pub async fn get_adapter(&self) -> Result<Arc<dyn SandboxAdapter>> {
        if let Some(adapter) = self.adapter.read().await.as_ref() {
            return Ok(Arc::clone(adapter));
        }

        let mut slot = self.adapter.write().await;
        if let Some(adapter) = slot.as_ref() {
            return Ok(Arc::clone(adapter));
        }

        let adapter = self.create_adapter().await?;
        if !adapter.is_configured() {
            return Err(SandboxError::Configuration(format!(
                "Sandbox provider '{}' is not properly configured. \
                 Check your environment variables and service availability.",
                self.provider
            )));
        }

        *slot = Some(Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Drop the cached adapter; the next `get_adapter` builds a fresh one
    pub async fn reset(&self) {
        if self.adapter.write().await.take().is_some() {
            info!("Sandbox adapter cache cleared");
        }
    }

    async fn create_adapter(&self) -> Result<Arc<dyn SandboxAdapter>> {
        match self.provider {
            SandboxProviderKind::Docker => {
                let adapter = DockerSandboxAdapter::new(self.config.clone()).await?;
                Ok(Arc::new(adapter))
            }
            SandboxProviderKind::E2B | SandboxProviderKind::Daytona => {
                Err(SandboxError::NotImplemented {
                    provider: self.provider.to_string(),
                    alternative: SandboxProviderKind::Docker.to_string(),
                })
            }
        }
    }
}

/// Decide which provider to use.
///
/// Order: explicit selector, deployment target, available credentials, Docker.
pub fn detect_provider(config: &SandboxConfig) -> SandboxProviderKind {
    if let Some(kind) = config
        .provider
        .as_deref()
        .and_then(SandboxProviderKind::from_selector)
    {
        if kind == SandboxProviderKind::Daytona {
            warn!("Daytona is deprecated, consider migrating to Docker or E2B");
        }
        return kind;
    }

    match config.cloud_provider.as_deref().map(str::to_lowercase).as_deref() {
        Some("aliyun" | "tencent" | "local") => return SandboxProviderKind::Docker,
        Some("supabase") => {
            return if config.e2b_api_key.is_some() {
                SandboxProviderKind::E2B
            } else {
                SandboxProviderKind::Docker
            };
        }
        _ => {}
    }

    if config.e2b_api_key.is_some() {
        info!("E2B API key found, using E2B sandboxes");
        return SandboxProviderKind::E2B;
    }

    if config.daytona_api_key.is_some() {
        warn!("Daytona API key found, but Daytona is deprecated");
        return SandboxProviderKind::Daytona;
    }

    info!("Defaulting to Docker sandbox provider");
    SandboxProviderKind::Docker
}
