// ABOUTME: Docker-backed sandbox adapter for local and self-hosted deployments
// ABOUTME: Uses bollard to manage keep-alive containers, exec, tar file transfer and stats

use super::SandboxAdapter;
use crate::archive;
use crate::config::SandboxConfig;
use crate::types::{
    CreateSandboxRequest, ExecOptions, ExecuteResult, FileInfo, ResourceUsage, SandboxInfo,
    SandboxState,
};
use crate::{Result, SandboxError};
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, DownloadFromContainerOptions, InspectContainerOptions,
        ListContainersOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
        StatsOptions, StopContainerOptions, UploadToContainerOptions,
    },
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecResults},
    models::{ContainerInspectResponse, DeviceRequest, HostConfig},
    Docker, API_DEFAULT_VERSION,
};
use futures::StreamExt;
use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Marker label identifying containers owned by agentbox
pub const MANAGED_LABEL: &str = "agentbox.sandbox";
/// Creation time label, Unix epoch seconds
pub const CREATED_AT_LABEL: &str = "agentbox.created_at";
/// Caller metadata is stored as `agentbox.meta.<key>` labels
pub const METADATA_LABEL_PREFIX: &str = "agentbox.meta.";

/// CPU quota is expressed against this fixed period
const CPU_PERIOD: i64 = 100_000;
const KEEP_ALIVE_COMMAND: [&str; 3] = ["/bin/bash", "-c", "tail -f /dev/null"];
const READY_WAIT: Duration = Duration::from_millis(500);
const PING_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_TIMEOUT_SECS: i64 = 10;
const DELETE_STOP_TIMEOUT_SECS: i64 = 5;
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const DELETE_TIMEOUT: Duration = Duration::from_secs(30);
/// Floor for the bollard request timeout
const MIN_ENGINE_TIMEOUT_SECS: u64 = 120;

pub struct DockerSandboxAdapter {
    /// `None` when the engine was unreachable at construction
    client: Option<Docker>,
    config: SandboxConfig,
    memory_limit_bytes: i64,
    /// Bounds the number of in-flight engine calls
    permits: Arc<Semaphore>,
    init_error: Option<String>,
}

impl DockerSandboxAdapter {
    /// Connect to the engine described by `config` and verify it answers.
    ///
    /// An unreachable engine does not fail construction: the adapter comes
    /// back unconfigured and every operation returns `NotInitialized`.
    /// Invalid configuration is a hard error.
    pub async fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;

        let connected = match connect(config.docker_host.as_deref(), engine_timeout_secs(&config)) {
            Ok(client) => match tokio::time::timeout(PING_TIMEOUT, client.ping()).await {
                Ok(Ok(_)) => Ok(client),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("ping timed out after {:?}", PING_TIMEOUT)),
            },
            Err(e) => Err(e.to_string()),
        };

        let endpoint = config
            .docker_host
            .clone()
            .unwrap_or_else(|| "local defaults".to_string());

        match connected {
            Ok(client) => {
                info!("Docker sandbox adapter initialized: {}", endpoint);
                Self::with_client(client, config)
            }
            Err(reason) => {
                error!("Failed to connect to Docker at {}: {}", endpoint, reason);
                let mut adapter = Self::unconfigured(config)?;
                adapter.init_error = Some(format!("Docker unreachable at {}: {}", endpoint, reason));
                Ok(adapter)
            }
        }
    }

    /// Create with an already connected Docker client
    pub fn with_client(client: Docker, config: SandboxConfig) -> Result<Self> {
        let mut adapter = Self::unconfigured(config)?;
        adapter.client = Some(client);
        Ok(adapter)
    }

    fn unconfigured(config: SandboxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: None,
            memory_limit_bytes: config.memory_limit_bytes()?,
            permits: Arc::new(Semaphore::new(config.engine_concurrency)),
            config,
            init_error: None,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn client(&self) -> Result<&Docker> {
        self.client.as_ref().ok_or_else(|| {
            SandboxError::NotInitialized(
                self.init_error
                    .clone()
                    .unwrap_or_else(|| "Docker client not initialized".to_string()),
            )
        })
    }

    /// Run one engine call while holding a pool permit
    async fn gated<F: Future>(&self, call: F) -> Result<F::Output> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SandboxError::NotInitialized("engine call pool closed".to_string()))?;
        Ok(call.await)
    }

    async fn inspect(&self, sandbox_id: &str) -> Result<ContainerInspectResponse> {
        let client = self.client()?;
        self.gated(client.inspect_container(sandbox_id, None::<InspectContainerOptions>))
            .await?
            .map_err(|e| container_error(e, sandbox_id))
    }

    /// Absolute paths are used as-is, relative ones resolve against the workspace
    fn resolve_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.workspace_dir.trim_end_matches('/'),
                path
            )
        }
    }

    async fn upload(&self, sandbox_id: &str, dir: &str, tar: Vec<u8>) -> Result<()> {
        let client = self.client()?;
        let options = UploadToContainerOptions {
            path: dir.to_string(),
            ..Default::default()
        };
        self.gated(client.upload_to_container(sandbox_id, Some(options), tar.into()))
            .await?
            .map_err(|e| path_error(e, sandbox_id, dir))
    }

    /// All containers carrying the managed marker label, stopped ones included
    pub async fn list_sandboxes(&self) -> Result<Vec<SandboxInfo>> {
        let client = self.client()?;

        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{}=true", MANAGED_LABEL)]);
        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        let containers = self.gated(client.list_containers(Some(options))).await??;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                let state = map_engine_status(c.state.as_deref().unwrap_or("unknown"));
                let metadata = decode_metadata(c.labels.as_ref());
                Some(SandboxInfo::new(id, state, metadata))
            })
            .collect())
    }

    /// Remove non-running managed sandboxes created more than `max_age` ago.
    /// Returns the ids that were removed.
    pub async fn cleanup_stale_sandboxes(&self, max_age: Duration) -> Result<Vec<String>> {
        let client = self.client()?;
        info!("Starting sandbox cleanup (max_age={:?})", max_age);

        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{}=true", MANAGED_LABEL)]);
        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };
        let containers = self.gated(client.list_containers(Some(options))).await??;

        let cutoff = epoch_seconds() - max_age.as_secs_f64();
        let mut removed = Vec::new();

        for container in containers {
            let Some(id) = container.id else { continue };
            if container.state.as_deref() == Some("running") {
                continue;
            }

            let created_at = container
                .labels
                .as_ref()
                .and_then(|labels| labels.get(CREATED_AT_LABEL))
                .and_then(|raw| raw.parse::<f64>().ok())
                .or(container.created.map(|secs| secs as f64));

            if matches!(created_at, Some(created) if created < cutoff) {
                match self.delete_sandbox(&id).await {
                    Ok(()) => removed.push(id),
                    Err(e) => warn!("Failed to remove stale sandbox {}: {}", id, e),
                }
            }
        }

        info!("Cleaned up {} stale sandboxes", removed.len());
        Ok(removed)
    }
}

#[async_trait]
impl SandboxAdapter for DockerSandboxAdapter {
    fn provider_name(&self) -> &'static str {
        "Docker"
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn create_sandbox(&self, request: CreateSandboxRequest) -> Result<SandboxInfo> {
        let client = self.client()?;
        let image = request
            .image
            .clone()
            .unwrap_or_else(|| self.config.image.clone());

        match self.gated(client.inspect_image(&image)).await? {
            Ok(_) => debug!("Image {} found locally", image),
            Err(e) if is_status(&e, 404) => {
                error!("Docker image not found: {}", image);
                return Err(SandboxError::ImageNotFound { image });
            }
            Err(e) => return Err(SandboxError::Engine(e)),
        }

        let container_config = container_config(
            &self.config,
            self.memory_limit_bytes,
            &request,
            &image,
            epoch_seconds(),
        )?;
        let options = CreateContainerOptions {
            name: format!("agentbox-{}", uuid::Uuid::new_v4().simple()),
            platform: None,
        };

        let created = self
            .gated(client.create_container(Some(options), container_config))
            .await?
            .map_err(|e| {
                error!("Failed to create Docker sandbox: {}", e);
                SandboxError::Engine(e)
            })?;

        if let Err(e) = self
            .gated(client.start_container(&created.id, None::<StartContainerOptions<String>>))
            .await?
        {
            error!("Failed to start Docker sandbox {}: {}", created.id, e);
            // Do not leak a created-but-dead container
            let remove = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(cleanup) = client.remove_container(&created.id, Some(remove)).await {
                warn!("Failed to clean up container {}: {}", created.id, cleanup);
            }
            return Err(SandboxError::Engine(e));
        }

        info!("Created Docker sandbox: {}", short_id(&created.id));
        tokio::time::sleep(READY_WAIT).await;

        self.get_sandbox(&created.id).await
    }

    async fn get_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        let inspect = self.inspect(sandbox_id).await?;

        let state = map_engine_status(engine_status(&inspect));
        let metadata = decode_metadata(inspect.config.as_ref().and_then(|c| c.labels.as_ref()));
        let id = inspect.id.unwrap_or_else(|| sandbox_id.to_string());

        Ok(SandboxInfo::new(id, state, metadata))
    }

    async fn start_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        let client = self.client()?;
        let inspect = self.inspect(sandbox_id).await?;

        match engine_status(&inspect) {
            "running" => return self.get_sandbox(sandbox_id).await,
            "paused" => {
                self.gated(client.unpause_container(sandbox_id))
                    .await?
                    .map_err(|e| container_error(e, sandbox_id))?;
            }
            _ => {
                self.gated(client.start_container(sandbox_id, None::<StartContainerOptions<String>>))
                    .await?
                    .map_err(|e| container_error(e, sandbox_id))?;
            }
        }

        info!("Started Docker sandbox: {}", short_id(sandbox_id));
        tokio::time::sleep(READY_WAIT).await;
        self.get_sandbox(sandbox_id).await
    }

    async fn stop_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        let client = self.client()?;
        let inspect = self.inspect(sandbox_id).await?;

        if engine_status(&inspect) == "running" {
            let options = StopContainerOptions {
                t: STOP_TIMEOUT_SECS,
            };
            match self.gated(client.stop_container(sandbox_id, Some(options))).await? {
                Ok(()) => info!("Stopped Docker sandbox: {}", short_id(sandbox_id)),
                // Already stopped between inspect and stop
                Err(e) if is_status(&e, 304) => {
                    debug!("Sandbox {} already stopped", short_id(sandbox_id))
                }
                Err(e) => {
                    error!("Failed to stop Docker sandbox {}: {}", sandbox_id, e);
                    return Err(container_error(e, sandbox_id));
                }
            }
        }

        self.get_sandbox(sandbox_id).await
    }

    async fn delete_sandbox(&self, sandbox_id: &str) -> Result<()> {
        let client = self.client()?;

        let inspect = match self.inspect(sandbox_id).await {
            Ok(inspect) => inspect,
            Err(SandboxError::SandboxNotFound(_)) => {
                warn!("Docker container already deleted: {}", sandbox_id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if engine_status(&inspect) == "running" {
            let options = StopContainerOptions {
                t: DELETE_STOP_TIMEOUT_SECS,
            };
            if let Err(e) = self.gated(client.stop_container(sandbox_id, Some(options))).await? {
                // Forced removal below still kills it
                debug!("Stop before delete failed for {}: {}", sandbox_id, e);
            }
        }

        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.gated(client.remove_container(sandbox_id, Some(options))).await? {
            Ok(()) => {
                info!("Deleted Docker sandbox: {}", short_id(sandbox_id));
                Ok(())
            }
            Err(e) if is_status(&e, 404) => {
                warn!("Docker container already deleted: {}", sandbox_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete Docker sandbox {}: {}", sandbox_id, e);
                Err(SandboxError::Engine(e))
            }
        }
    }

    async fn execute_command(
        &self,
        sandbox_id: &str,
        command: &str,
        options: ExecOptions,
    ) -> Result<ExecuteResult> {
        let client = self.client()?.clone();
        let timeout = options.timeout.unwrap_or(self.config.exec_timeout);
        let working_dir = options
            .working_dir
            .map(|dir| self.resolve_path(&dir))
            .unwrap_or_else(|| self.config.workspace_dir.clone());
        let env: Vec<String> = options
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        debug!(
            sandbox_id = %short_id(sandbox_id),
            working_dir = %working_dir,
            timeout_secs = timeout.as_secs(),
            "Executing command in sandbox"
        );

        let permits = Arc::clone(&self.permits);
        let id = sandbox_id.to_string();
        let cmd = command.to_string();
        let mut handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            run_exec(&client, &id, cmd, working_dir, env).await
        });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(result))) => {
                debug!(
                    exit_code = result.exit_code,
                    stdout_len = result.stdout.len(),
                    stderr_len = result.stderr.len(),
                    "Command completed"
                );
                Ok(result)
            }
            Ok(Ok(Err(e))) if is_status(&e, 404) => {
                Err(SandboxError::SandboxNotFound(sandbox_id.to_string()))
            }
            Ok(Ok(Err(e))) => {
                error!("Failed to execute command in Docker sandbox: {}", e);
                Ok(ExecuteResult::adapter_failure(e.to_string()))
            }
            Ok(Err(join_error)) => {
                error!("Command task failed: {}", join_error);
                Ok(ExecuteResult::adapter_failure(join_error.to_string()))
            }
            Err(_) => {
                // Stop collecting output; the process itself keeps running in the container
                handle.abort();
                error!("Command execution timeout after {}s", timeout.as_secs());
                Ok(ExecuteResult::timed_out(timeout))
            }
        }
    }

    async fn write_file(
        &self,
        sandbox_id: &str,
        path: &str,
        content: &[u8],
        mode: Option<u32>,
    ) -> Result<()> {
        self.client()?;
        let path = self.resolve_path(path);
        let (dir, name) = split_path(&path)?;

        let tar = archive::pack_single_file(
            name,
            content,
            mode.unwrap_or(0o644),
            epoch_seconds() as u64,
        )?;

        match self.upload(sandbox_id, dir, tar.clone()).await {
            Err(SandboxError::FileNotFound(_)) => {
                debug!("Creating missing directory {} in {}", dir, short_id(sandbox_id));
                let mkdir = format!("mkdir -p {}", shell_quote(dir));
                let result = self
                    .execute_command(sandbox_id, &mkdir, ExecOptions::with_timeout(LIST_TIMEOUT))
                    .await?;
                if !result.success {
                    return Err(SandboxError::CommandFailed(format!(
                        "Failed to create {}: {}",
                        dir,
                        result.stderr.trim()
                    )));
                }
                self.upload(sandbox_id, dir, tar).await?;
            }
            other => other?,
        }

        debug!("Wrote {} bytes to Docker sandbox: {}", content.len(), path);
        Ok(())
    }

    async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<Vec<u8>> {
        let client = self.client()?;
        let path = self.resolve_path(path);

        let options = DownloadFromContainerOptions { path: path.clone() };
        let data = self
            .gated(async {
                let mut stream = client.download_from_container(sandbox_id, Some(options));
                let mut data = Vec::new();
                while let Some(chunk) = stream.next().await {
                    data.extend_from_slice(&chunk?);
                }
                Ok::<_, BollardError>(data)
            })
            .await?
            .map_err(|e| path_error(e, sandbox_id, &path))?;

        let content = archive::first_entry_bytes(&data)?
            .ok_or_else(|| SandboxError::FileNotFound(path.clone()))?;

        debug!("Read {} bytes from Docker sandbox: {}", content.len(), path);
        Ok(content)
    }

    async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<FileInfo>> {
        let path = self.resolve_path(path);
        let command = format!("ls -la --time-style=+%s {}", shell_quote(&path));

        let result = self
            .execute_command(sandbox_id, &command, ExecOptions::with_timeout(LIST_TIMEOUT))
            .await?;

        if !result.success {
            debug!("Listing {} failed: {}", path, result.stderr.trim());
            return Ok(Vec::new());
        }

        Ok(parse_ls_output(&path, &result.stdout))
    }

    async fn delete_file(&self, sandbox_id: &str, path: &str) -> Result<()> {
        let path = self.resolve_path(path);
        let command = format!("rm -rf {}", shell_quote(&path));

        let result = self
            .execute_command(sandbox_id, &command, ExecOptions::with_timeout(DELETE_TIMEOUT))
            .await?;

        if !result.success {
            return Err(SandboxError::CommandFailed(format!(
                "Failed to delete {}: {}",
                path,
                result.stderr.trim()
            )));
        }
        Ok(())
    }

    async fn health_check(&self, sandbox_id: &str) -> bool {
        matches!(
            self.get_sandbox(sandbox_id).await,
            Ok(info) if info.state == SandboxState::Started
        )
    }

    async fn get_resource_usage(&self, sandbox_id: &str) -> Result<Option<ResourceUsage>> {
        let client = self.client()?;

        // one_shot=false makes the engine fill precpu_stats with a prior sample
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };

        let sample = self
            .gated(async { client.stats(sandbox_id, Some(options)).next().await })
            .await?;

        match sample {
            Some(Ok(stats)) => Ok(Some(ResourceUsage::from_samples(
                stats.cpu_stats.cpu_usage.total_usage,
                stats.precpu_stats.cpu_usage.total_usage,
                stats.cpu_stats.system_cpu_usage.unwrap_or(0),
                stats.precpu_stats.system_cpu_usage.unwrap_or(0),
                stats.memory_stats.usage.unwrap_or(0),
                stats.memory_stats.limit.unwrap_or(0),
            ))),
            Some(Err(e)) => {
                error!("Failed to get resource usage for {}: {}", sandbox_id, e);
                Ok(None)
            }
            None => {
                error!("No stats returned for {}", sandbox_id);
                Ok(None)
            }
        }
    }
}

/// Run one exec to completion, keeping stdout and stderr apart
async fn run_exec(
    client: &Docker,
    sandbox_id: &str,
    command: String,
    working_dir: String,
    env: Vec<String>,
) -> std::result::Result<ExecuteResult, BollardError> {
    let exec_config = CreateExecOptions {
        cmd: Some(vec!["/bin/bash".to_string(), "-c".to_string(), command]),
        env: Some(env),
        working_dir: Some(working_dir),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        ..Default::default()
    };

    let exec = client.create_exec(sandbox_id, exec_config).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    if let StartExecResults::Attached { mut output, .. } = client.start_exec(&exec.id, None).await? {
        while let Some(msg) = output.next().await {
            match msg? {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    stdout.extend_from_slice(&message)
                }
                LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }
    }

    let exit_code = client.inspect_exec(&exec.id).await?.exit_code.unwrap_or(-1);

    Ok(ExecuteResult::completed(
        exit_code,
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

fn connect(docker_host: Option<&str>, timeout_secs: u64) -> std::result::Result<Docker, BollardError> {
    match docker_host {
        None => Docker::connect_with_local_defaults()
            .map(|client| client.with_timeout(Duration::from_secs(timeout_secs))),
        Some(host) if host.starts_with("unix://") || host.starts_with("npipe://") => {
            Docker::connect_with_socket(host, timeout_secs, API_DEFAULT_VERSION)
        }
        Some(host) => Docker::connect_with_http(host, timeout_secs, API_DEFAULT_VERSION),
    }
}

fn engine_timeout_secs(config: &SandboxConfig) -> u64 {
    config.exec_timeout.as_secs().max(MIN_ENGINE_TIMEOUT_SECS) + 60
}

/// Build the bollard container config for a new sandbox
fn container_config(
    config: &SandboxConfig,
    default_memory_bytes: i64,
    request: &CreateSandboxRequest,
    image: &str,
    created_at: f64,
) -> Result<Config<String>> {
    let resources = request.resources.clone().unwrap_or_default();

    let memory = match resources.memory.as_deref() {
        Some(raw) => crate::config::parse_memory_limit(raw)?,
        None => default_memory_bytes,
    };
    let cpu = resources.cpu.unwrap_or(config.cpu_limit);
    if !(cpu.is_finite() && cpu > 0.0) {
        return Err(SandboxError::InvalidRequest(format!(
            "CPU limit must be positive, got {}",
            cpu
        )));
    }

    let device_requests = config.enable_gpu.then(|| {
        vec![DeviceRequest {
            count: Some(-1),
            capabilities: Some(vec![vec!["gpu".to_string()]]),
            ..Default::default()
        }]
    });

    let host_config = HostConfig {
        memory: Some(memory),
        cpu_period: Some(CPU_PERIOD),
        cpu_quota: Some((cpu * CPU_PERIOD as f64) as i64),
        network_mode: Some(config.network.clone()),
        device_requests,
        ..Default::default()
    };

    Ok(Config {
        image: Some(image.to_string()),
        cmd: Some(KEEP_ALIVE_COMMAND.iter().map(|s| s.to_string()).collect()),
        env: Some(vec!["DEBIAN_FRONTEND=noninteractive".to_string()]),
        working_dir: Some(config.workspace_dir.clone()),
        labels: Some(encode_labels(&request.metadata, created_at)),
        host_config: Some(host_config),
        open_stdin: Some(true),
        tty: Some(true),
        ..Default::default()
    })
}

fn encode_labels(metadata: &HashMap<String, String>, created_at: f64) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    labels.insert(CREATED_AT_LABEL.to_string(), created_at.to_string());
    for (key, value) in metadata {
        labels.insert(format!("{}{}", METADATA_LABEL_PREFIX, key), value.clone());
    }
    labels
}

fn decode_metadata(labels: Option<&HashMap<String, String>>) -> HashMap<String, String> {
    labels
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| {
            key.strip_prefix(METADATA_LABEL_PREFIX)
                .map(|meta_key| (meta_key.to_string(), value.clone()))
        })
        .collect()
}

/// Map the engine's container status onto the sandbox state machine
pub fn map_engine_status(status: &str) -> SandboxState {
    match status.to_lowercase().as_str() {
        "running" => SandboxState::Started,
        "created" | "restarting" => SandboxState::Creating,
        "paused" | "exited" => SandboxState::Stopped,
        _ => SandboxState::Error,
    }
}

fn engine_status(inspect: &ContainerInspectResponse) -> &str {
    inspect
        .state
        .as_ref()
        .and_then(|state| state.status.as_ref())
        .map(|s| s.as_ref())
        .unwrap_or("unknown")
}

/// Parse `ls -la --time-style=+%s` output.
///
/// Columns: permissions, links, owner, group, size, epoch mtime, name.
fn parse_ls_output(dir: &str, stdout: &str) -> Vec<FileInfo> {
    let mut files = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() || line.starts_with("total") {
            continue;
        }

        let Some((fields, name)) = split_columns(line, 6) else {
            continue;
        };

        let permissions = fields[0];
        let name = if permissions.starts_with('l') {
            name.split(" -> ").next().unwrap_or(name)
        } else {
            name
        };
        if name == "." || name == ".." {
            continue;
        }

        let Ok(size) = fields[4].parse::<u64>() else {
            continue;
        };

        files.push(FileInfo {
            path: join_path(dir, name),
            size,
            is_directory: permissions.starts_with('d'),
            modified_time: fields[5].parse::<f64>().ok(),
        });
    }

    files
}

/// Split off `count` whitespace-separated columns; the remainder keeps its inner spacing
fn split_columns(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();

    for _ in 0..count {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    if rest.is_empty() {
        None
    } else {
        Some((fields, rest))
    }
}

/// `ls` prints the full path when given a file; such names are already absolute
fn join_path(dir: &str, name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Parent directory and file name of an absolute path
fn split_path(path: &str) -> Result<(&str, &str)> {
    match path.rfind('/') {
        Some(idx) if idx + 1 < path.len() => {
            let dir = if idx == 0 { "/" } else { &path[..idx] };
            Ok((dir, &path[idx + 1..]))
        }
        _ => Err(SandboxError::InvalidRequest(format!(
            "'{}' does not name a file",
            path
        ))),
    }
}

fn shell_quote(value: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(value))
}

fn is_status(err: &BollardError, code: u16) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError { status_code, .. } if *status_code == code
    )
}

fn is_missing_container(err: &BollardError) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError { status_code: 404, message }
            if message.contains("No such container")
    )
}

fn container_error(err: BollardError, sandbox_id: &str) -> SandboxError {
    if is_status(&err, 404) {
        SandboxError::SandboxNotFound(sandbox_id.to_string())
    } else {
        SandboxError::Engine(err)
    }
}

/// 404s on archive endpoints mean either the container or the path is missing
fn path_error(err: BollardError, sandbox_id: &str, path: &str) -> SandboxError {
    if is_missing_container(&err) {
        SandboxError::SandboxNotFound(sandbox_id.to_string())
    } else if is_status(&err, 404) {
        SandboxError::FileNotFound(path.to_string())
    } else {
        SandboxError::Engine(err)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
