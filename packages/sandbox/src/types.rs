// ABOUTME: Core type definitions shared by every sandbox provider
// ABOUTME: Sandbox state, execution results, file listings and resource usage

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Sandbox providers known to the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxProviderKind {
    /// Local Docker containers
    Docker,
    /// E2B cloud sandboxes
    E2B,
    /// Legacy Daytona workspaces (deprecated)
    Daytona,
}

impl SandboxProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::E2B => "e2b",
            Self::Daytona => "daytona",
        }
    }

    /// Parse a selector value, case-insensitively
    pub fn from_selector(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "docker" => Some(Self::Docker),
            "e2b" => Some(Self::E2B),
            "daytona" => Some(Self::Daytona),
            _ => None,
        }
    }
}

impl fmt::Display for SandboxProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sandbox lifecycle state
///
/// `Creating → Started → Stopped → Archiving → Archived`, with `Error`
/// reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxState {
    Creating,
    Started,
    Stopped,
    Archiving,
    Archived,
    Error,
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Creating => "creating",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Archiving => "archiving",
            Self::Archived => "archived",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Complete sandbox information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxInfo {
    /// Engine-assigned id, stable for the sandbox lifetime
    pub sandbox_id: String,
    pub state: SandboxState,
    /// Caller-defined key/values, passed through untouched
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnc_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SandboxInfo {
    pub fn new(
        sandbox_id: impl Into<String>,
        state: SandboxState,
        metadata: HashMap<String, String>,
    ) -> Self {
        let password = metadata.get("password").cloned();
        Self {
            sandbox_id: sandbox_id.into(),
            state,
            metadata,
            password,
            sandbox_url: None,
            vnc_preview: None,
            token: None,
        }
    }
}

/// Resource limits requested at creation time. Unset fields use adapter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Docker-style size string, e.g. "512m" or "2g"
    pub memory: Option<String>,
    /// Fractional CPU cores, e.g. 0.5
    pub cpu: Option<f64>,
}

/// Request to create a new sandbox
#[derive(Debug, Clone, Default)]
pub struct CreateSandboxRequest {
    /// Image (or snapshot) reference; the configured default when `None`
    pub image: Option<String>,
    pub resources: Option<ResourceSpec>,
    pub metadata: HashMap<String, String>,
}

impl CreateSandboxRequest {
    pub fn with_metadata(metadata: HashMap<String, String>) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }
}

/// Options for a single command execution
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Defaults to the adapter's workspace directory
    pub working_dir: Option<String>,
    pub env: HashMap<String, String>,
    /// Defaults to the adapter's execution timeout
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Result of a command execution
///
/// `exit_code == -1` is reserved for failures inside the adapter (timeout,
/// transport). `error` is only set for failures outside the executed program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteResult {
    /// The program ran to completion
    pub fn completed(exit_code: i64, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: exit_code == 0,
            error: None,
        }
    }

    /// The timeout elapsed before the program finished
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("Command timeout after {} seconds", timeout.as_secs_f64()),
            success: false,
            error: Some("Timeout".to_string()),
        }
    }

    /// The adapter failed to run or collect the command
    pub fn adapter_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: message.clone(),
            success: false,
            error: Some(message),
        }
    }

    /// Stdout followed by stderr
    pub fn output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// A directory entry inside a sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub is_directory: bool,
    /// Unix epoch seconds
    pub modified_time: Option<f64>,
}

/// Point-in-time resource usage for a sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
}

impl ResourceUsage {
    /// Build usage from a pair of CPU samples plus memory counters.
    ///
    /// Percentages are rounded to two decimals and clamped to `[0, 100]`.
    pub fn from_samples(
        cpu_total: u64,
        precpu_total: u64,
        system_total: u64,
        presystem_total: u64,
        memory_bytes: u64,
        memory_limit_bytes: u64,
    ) -> Self {
        let cpu_delta = cpu_total as f64 - precpu_total as f64;
        let system_delta = system_total as f64 - presystem_total as f64;
        let cpu_percent = if system_delta > 0.0 {
            cpu_delta / system_delta * 100.0
        } else {
            0.0
        };

        let memory_percent = if memory_limit_bytes > 0 {
            memory_bytes as f64 / memory_limit_bytes as f64 * 100.0
        } else {
            0.0
        };

        Self {
            cpu_percent: bounded_percent(cpu_percent),
            memory_bytes,
            memory_limit_bytes,
            memory_percent: bounded_percent(memory_percent),
        }
    }
}

fn bounded_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
