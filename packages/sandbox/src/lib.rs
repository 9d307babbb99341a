// ABOUTME: Sandbox execution subsystem for agent tool calls
// ABOUTME: Provider contract, Docker adapter, provider factory and legacy compatibility shim

pub mod archive;
pub mod compat;
pub mod config;
pub mod error;
pub mod factory;
pub mod providers;
pub mod types;

pub use compat::{
    create_compat_sandbox, get_or_start_sandbox, CompatSandbox, FileOperations, Language,
    ProcessOperations, SessionExecuteRequest, SessionInfo, StartupPolling,
};
pub use config::SandboxConfig;
pub use error::{Result, SandboxError};
pub use factory::{detect_provider, SandboxFactory};
pub use providers::{BrowserAutomation, DockerSandboxAdapter, SandboxAdapter};
pub use types::{
    CreateSandboxRequest, ExecOptions, ExecuteResult, FileInfo, ResourceSpec, ResourceUsage,
    SandboxInfo, SandboxProviderKind, SandboxState,
};
