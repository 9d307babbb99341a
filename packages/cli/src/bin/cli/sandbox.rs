// ABOUTME: CLI commands for sandbox lifecycle, command execution and file transfer
// ABOUTME: Resolves the adapter through the provider factory and prints JSON results

use super::utils::{parse_key_values, parse_mode, print_json};
use agentbox_sandbox::{
    CreateSandboxRequest, DockerSandboxAdapter, ExecOptions, ResourceSpec, SandboxAdapter,
    SandboxError, SandboxFactory, SandboxProviderKind,
};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Subcommand)]
pub enum SandboxCommands {
    /// Show which sandbox provider is selected and whether it is usable
    Provider,

    /// Create and start a new sandbox
    Create {
        /// Image to run (default: SANDBOX_IMAGE)
        #[arg(long)]
        image: Option<String>,

        /// Memory limit, e.g. 512m or 2g
        #[arg(long)]
        memory: Option<String>,

        /// CPU limit in cores, e.g. 0.5
        #[arg(long)]
        cpu: Option<f64>,

        /// Metadata entries as key=value (repeatable)
        #[arg(long = "meta")]
        meta: Vec<String>,
    },

    /// Show sandbox information
    Info { id: String },

    /// Start a stopped sandbox
    Start { id: String },

    /// Stop a running sandbox
    Stop { id: String },

    /// Delete a sandbox
    Delete { id: String },

    /// Execute a shell command inside a sandbox
    Exec {
        id: String,
        command: String,

        /// Working directory (default: SANDBOX_WORKSPACE_DIR)
        #[arg(long)]
        workdir: Option<String>,

        /// Timeout in seconds (default: SANDBOX_EXEC_TIMEOUT_SECS)
        #[arg(long)]
        timeout: Option<u64>,

        /// Environment variables as KEY=value (repeatable)
        #[arg(long = "env")]
        env: Vec<String>,
    },

    /// List a directory inside a sandbox
    Ls {
        id: String,
        #[arg(default_value = "/workspace")]
        path: String,
    },

    /// Read a file from a sandbox
    Read {
        id: String,
        path: String,

        /// Write the raw bytes to this local file instead of printing them
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Copy a local file into a sandbox
    Write {
        id: String,
        path: String,
        local_file: PathBuf,

        /// Octal file mode (default: 644)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Delete a file or directory inside a sandbox
    Rm { id: String, path: String },

    /// Show CPU and memory usage
    Stats { id: String },

    /// List all managed sandboxes
    List,

    /// Remove stopped sandboxes older than the given age
    Cleanup {
        #[arg(long, default_value = "24")]
        max_age_hours: u64,
    },
}

impl SandboxCommands {
    pub async fn execute(&self) -> Result<()> {
        let factory = SandboxFactory::from_env().context("Failed to load sandbox configuration")?;

        match self {
            SandboxCommands::Provider => {
                let status = factory.get_adapter().await;
                print_json(&json!({
                    "provider": factory.provider_name(),
                    "configured": status.is_ok(),
                    "error": status.err().map(|e| e.to_string()),
                }))
            }
            SandboxCommands::Create {
                image,
                memory,
                cpu,
                meta,
            } => {
                let resources = (memory.is_some() || cpu.is_some()).then(|| ResourceSpec {
                    memory: memory.clone(),
                    cpu: *cpu,
                });
                let request = CreateSandboxRequest {
                    image: image.clone(),
                    resources,
                    metadata: parse_key_values(meta)?,
                };
                let info = adapter(&factory)
                    .await?
                    .create_sandbox(request)
                    .await
                    .context("Failed to create sandbox")?;
                print_json(&info)
            }
            SandboxCommands::Info { id } => {
                let info = adapter(&factory).await?.get_sandbox(id).await?;
                print_json(&info)
            }
            SandboxCommands::Start { id } => {
                let info = adapter(&factory).await?.start_sandbox(id).await?;
                print_json(&info)
            }
            SandboxCommands::Stop { id } => {
                let info = adapter(&factory).await?.stop_sandbox(id).await?;
                print_json(&info)
            }
            SandboxCommands::Delete { id } => {
                adapter(&factory).await?.delete_sandbox(id).await?;
                print_json(&json!({ "sandbox_id": id, "deleted": true }))
            }
            SandboxCommands::Exec {
                id,
                command,
                workdir,
                timeout,
                env,
            } => {
                let options = ExecOptions {
                    working_dir: workdir.clone(),
                    env: parse_key_values(env)?,
                    timeout: timeout.map(Duration::from_secs),
                };
                let result = adapter(&factory)
                    .await?
                    .execute_command(id, command, options)
                    .await?;
                print_json(&result)
            }
            SandboxCommands::Ls { id, path } => {
                let files = adapter(&factory).await?.list_files(id, path).await?;
                print_json(&files)
            }
            SandboxCommands::Read { id, path, output } => {
                let content = adapter(&factory).await?.read_file(id, path).await?;
                match output {
                    Some(local) => {
                        tokio::fs::write(local, &content)
                            .await
                            .with_context(|| format!("Failed to write {}", local.display()))?;
                        print_json(&json!({
                            "path": path,
                            "size": content.len(),
                            "output": local,
                        }))
                    }
                    None => print_json(&json!({
                        "path": path,
                        "size": content.len(),
                        "content": String::from_utf8_lossy(&content),
                    })),
                }
            }
            SandboxCommands::Write {
                id,
                path,
                local_file,
                mode,
            } => {
                let content = tokio::fs::read(local_file)
                    .await
                    .with_context(|| format!("Failed to read {}", local_file.display()))?;
                let mode = mode.as_deref().map(parse_mode).transpose()?;
                adapter(&factory)
                    .await?
                    .write_file(id, path, &content, mode)
                    .await?;
                print_json(&json!({ "path": path, "size": content.len() }))
            }
            SandboxCommands::Rm { id, path } => {
                adapter(&factory).await?.delete_file(id, path).await?;
                print_json(&json!({ "path": path, "deleted": true }))
            }
            SandboxCommands::Stats { id } => {
                let usage = adapter(&factory).await?.get_resource_usage(id).await?;
                print_json(&usage)
            }
            SandboxCommands::List => {
                let sandboxes = docker_adapter(&factory).await?.list_sandboxes().await?;
                print_json(&sandboxes)
            }
            SandboxCommands::Cleanup { max_age_hours } => {
                let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));
                let removed = docker_adapter(&factory)
                    .await?
                    .cleanup_stale_sandboxes(max_age)
                    .await?;
                print_json(&json!({ "removed": removed }))
            }
        }
    }
}

async fn adapter(factory: &SandboxFactory) -> Result<Arc<dyn SandboxAdapter>> {
    factory
        .get_adapter()
        .await
        .with_context(|| format!("Sandbox provider '{}' unavailable", factory.provider_name()))
}

/// Listing and cleanup are Docker-specific maintenance operations
async fn docker_adapter(factory: &SandboxFactory) -> Result<DockerSandboxAdapter> {
    ensure_docker(factory.provider())?;
    let adapter = DockerSandboxAdapter::new(factory.config().clone()).await?;
    if !adapter.is_configured() {
        bail!("Docker engine is not reachable");
    }
    Ok(adapter)
}

fn ensure_docker(provider: SandboxProviderKind) -> std::result::Result<(), SandboxError> {
    if provider == SandboxProviderKind::Docker {
        Ok(())
    } else {
        Err(SandboxError::NotImplemented {
            provider: provider.to_string(),
            alternative: SandboxProviderKind::Docker.to_string(),
        })
    }
}
