// ABOUTME: Sandbox configuration loaded from the environment
// ABOUTME: One validated structure passed explicitly to the factory and adapters

use crate::{Result, SandboxError};
use agentbox_config::constants;
use agentbox_config::{
    env_non_empty, parse_env_bool, parse_env_or_default, parse_env_or_default_with_validation,
};
use std::time::Duration;

pub const DEFAULT_IMAGE: &str = "agentbox-sandbox:latest";
pub const DEFAULT_NETWORK: &str = "bridge";
pub const DEFAULT_MEMORY_LIMIT: &str = "512m";
pub const DEFAULT_CPU_LIMIT: f64 = 1.0;
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WORKSPACE_DIR: &str = "/workspace";
pub const DEFAULT_ENGINE_CONCURRENCY: usize = 16;

/// Everything the factory and the Docker adapter need to know
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    /// Engine endpoint; bollard's local defaults when `None`
    pub docker_host: Option<String>,
    pub image: String,
    pub network: String,
    pub memory_limit: String,
    pub cpu_limit: f64,
    pub enable_gpu: bool,
    pub exec_timeout: Duration,
    pub workspace_dir: String,
    /// Maximum number of in-flight engine calls
    pub engine_concurrency: usize,
    /// Explicit provider selector
    pub provider: Option<String>,
    /// Deployment target selector
    pub cloud_provider: Option<String>,
    pub e2b_api_key: Option<String>,
    pub daytona_api_key: Option<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            docker_host: None,
            image: DEFAULT_IMAGE.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            memory_limit: DEFAULT_MEMORY_LIMIT.to_string(),
            cpu_limit: DEFAULT_CPU_LIMIT,
            enable_gpu: false,
            exec_timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS),
            workspace_dir: DEFAULT_WORKSPACE_DIR.to_string(),
            engine_concurrency: DEFAULT_ENGINE_CONCURRENCY,
            provider: None,
            cloud_provider: None,
            e2b_api_key: None,
            daytona_api_key: None,
        }
    }
}

impl SandboxConfig {
    /// Load from environment variables and validate
    pub fn from_env() -> Result<Self> {
        let config = Self {
            docker_host: env_non_empty(constants::DOCKER_HOST),
            image: env_non_empty(constants::SANDBOX_IMAGE)
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            network: env_non_empty(constants::SANDBOX_NETWORK)
                .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            memory_limit: env_non_empty(constants::SANDBOX_MEMORY_LIMIT)
                .unwrap_or_else(|| DEFAULT_MEMORY_LIMIT.to_string()),
            cpu_limit: parse_env_or_default(constants::SANDBOX_CPU_LIMIT, DEFAULT_CPU_LIMIT),
            enable_gpu: parse_env_bool(constants::SANDBOX_ENABLE_GPU, false),
            exec_timeout: Duration::from_secs(parse_env_or_default_with_validation(
                constants::SANDBOX_EXEC_TIMEOUT_SECS,
                DEFAULT_EXEC_TIMEOUT_SECS,
                |secs| secs > 0,
            )),
            workspace_dir: env_non_empty(constants::SANDBOX_WORKSPACE_DIR)
                .unwrap_or_else(|| DEFAULT_WORKSPACE_DIR.to_string()),
            engine_concurrency: parse_env_or_default_with_validation(
                constants::SANDBOX_ENGINE_CONCURRENCY,
                DEFAULT_ENGINE_CONCURRENCY,
                |n| n > 0,
            ),
            provider: env_non_empty(constants::SANDBOX_PROVIDER),
            cloud_provider: env_non_empty(constants::CLOUD_PROVIDER),
            e2b_api_key: env_non_empty(constants::E2B_API_KEY),
            daytona_api_key: env_non_empty(constants::DAYTONA_API_KEY),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine would refuse later
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(SandboxError::Configuration(
                "Sandbox image must not be empty".to_string(),
            ));
        }
        if !(self.cpu_limit.is_finite() && self.cpu_limit > 0.0) {
            return Err(SandboxError::Configuration(format!(
                "CPU limit must be a positive number, got {}",
                self.cpu_limit
            )));
        }
        if self.engine_concurrency == 0 {
            return Err(SandboxError::Configuration(
                "Engine concurrency must be at least 1".to_string(),
            ));
        }
        if !self.workspace_dir.starts_with('/') {
            return Err(SandboxError::Configuration(format!(
                "Workspace directory must be absolute, got '{}'",
                self.workspace_dir
            )));
        }
        parse_memory_limit(&self.memory_limit)?;
        Ok(())
    }

    /// Memory limit in bytes
    pub fn memory_limit_bytes(&self) -> Result<i64> {
        parse_memory_limit(&self.memory_limit)
    }
}

/// Parse a docker-style size string ("512m", "1g", "1024k", "2048b", "4096") into bytes
pub fn parse_memory_limit(value: &str) -> Result<i64> {
    let trimmed = value.trim().to_lowercase();
    let invalid = || {
        SandboxError::Configuration(format!(
            "Invalid memory limit '{}', expected a number with an optional b/k/m/g suffix",
            value
        ))
    };

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('b') => (&trimmed[..trimmed.len() - 1], 1i64),
        Some('k') => (&trimmed[..trimmed.len() - 1], 1024),
        Some('m') => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        Some('g') => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
        Some(c) if c.is_ascii_digit() => (trimmed.as_str(), 1),
        _ => return Err(invalid()),
    };

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }
    amount.checked_mul(multiplier).ok_or_else(invalid)
}
