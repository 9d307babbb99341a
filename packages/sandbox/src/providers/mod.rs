// ABOUTME: Provider contract for sandbox execution backends
// ABOUTME: Mandatory lifecycle/exec/file capabilities plus optional browser automation

use crate::types::{
    CreateSandboxRequest, ExecOptions, ExecuteResult, FileInfo, ResourceUsage, SandboxInfo,
};
use crate::Result;
use async_trait::async_trait;

pub mod docker;

pub use docker::DockerSandboxAdapter;

/// Capability set every sandbox provider implements
#[async_trait]
pub trait SandboxAdapter: Send + Sync {
    /// Human-readable provider name
    fn provider_name(&self) -> &'static str;

    /// Whether the provider reached its backend and can serve requests
    fn is_configured(&self) -> bool;

    /// Allocate and start a new sandbox
    async fn create_sandbox(&self, request: CreateSandboxRequest) -> Result<SandboxInfo>;

    /// Live information about a sandbox; `SandboxNotFound` when it does not exist
    async fn get_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo>;

    /// Start a stopped sandbox. Returns current info when already started.
    async fn start_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo>;

    /// Stop a running sandbox. Returns current info when already stopped.
    async fn stop_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo>;

    /// Permanently delete a sandbox. Deleting twice succeeds.
    async fn delete_sandbox(&self, sandbox_id: &str) -> Result<()>;

    /// Run a shell command and wait for it, bounded by the timeout
    async fn execute_command(
        &self,
        sandbox_id: &str,
        command: &str,
        options: ExecOptions,
    ) -> Result<ExecuteResult>;

    /// Write bytes to `path`, creating or replacing the file
    async fn write_file(
        &self,
        sandbox_id: &str,
        path: &str,
        content: &[u8],
        mode: Option<u32>,
    ) -> Result<()>;

    async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<Vec<u8>>;

    async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<FileInfo>>;

    /// Delete a file or directory recursively
    async fn delete_file(&self, sandbox_id: &str, path: &str) -> Result<()>;

    async fn health_check(&self, sandbox_id: &str) -> bool;

    /// Best-effort resource telemetry; `None` when stats are unavailable
    async fn get_resource_usage(&self, sandbox_id: &str) -> Result<Option<ResourceUsage>>;

    /// Browser automation, when the provider supports it
    fn browser(&self) -> Option<&dyn BrowserAutomation> {
        None
    }
}

/// Optional browser/VNC capability
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// URL for driving the sandbox browser, if one is running
    async fn browser_url(&self, sandbox_id: &str) -> Result<Option<String>>;

    /// PNG screenshot, optionally after navigating to `url`
    async fn take_screenshot(&self, sandbox_id: &str, url: Option<&str>)
        -> Result<Option<Vec<u8>>>;
}
