// ABOUTME: Shared helpers for sandbox integration tests
// ABOUTME: In-memory fake adapter plus Docker availability probing

#![allow(dead_code)]

use agentbox_sandbox::{
    BrowserAutomation, CreateSandboxRequest, ExecOptions, ExecuteResult, FileInfo, Result,
    ResourceUsage, SandboxAdapter, SandboxError, SandboxInfo, SandboxState,
};
use async_trait::async_trait;
use bollard::Docker;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct FakeSandbox {
    state: SandboxState,
    metadata: HashMap<String, String>,
    files: BTreeMap<String, Vec<u8>>,
    /// `get_sandbox` calls left before a started sandbox reports `Started`
    pending_polls: usize,
}

#[derive(Default)]
struct FakeState {
    sandboxes: HashMap<String, FakeSandbox>,
    next_id: usize,
    commands: Vec<(String, String)>,
    start_calls: usize,
    get_calls: usize,
}

/// Adapter keeping sandboxes in memory; commands are recorded and echoed back
pub struct FakeAdapter {
    state: Mutex<FakeState>,
    polls_until_started: usize,
    browser: Option<FakeBrowser>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            polls_until_started: 0,
            browser: None,
        }
    }

    /// Started sandboxes report `Creating` for this many reads
    pub fn with_startup_delay(mut self, polls: usize) -> Self {
        self.polls_until_started = polls;
        self
    }

    pub fn with_browser(mut self) -> Self {
        self.browser = Some(FakeBrowser);
        self
    }

    pub fn insert(&self, id: &str, state: SandboxState) {
        let mut inner = self.state.lock().unwrap();
        inner.sandboxes.insert(
            id.to_string(),
            FakeSandbox {
                state,
                metadata: HashMap::new(),
                files: BTreeMap::new(),
                pending_polls: 0,
            },
        );
    }

    pub fn set_state(&self, id: &str, state: SandboxState) {
        let mut inner = self.state.lock().unwrap();
        if let Some(sandbox) = inner.sandboxes.get_mut(id) {
            sandbox.state = state;
        }
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn start_calls(&self) -> usize {
        self.state.lock().unwrap().start_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    fn with_sandbox<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut FakeSandbox) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.state.lock().unwrap();
        match inner.sandboxes.get_mut(id) {
            Some(sandbox) => f(sandbox),
            None => Err(SandboxError::SandboxNotFound(id.to_string())),
        }
    }

    fn info(id: &str, sandbox: &FakeSandbox) -> SandboxInfo {
        SandboxInfo::new(id, sandbox.state, sandbox.metadata.clone())
    }
}

#[async_trait]
impl SandboxAdapter for FakeAdapter {
    fn provider_name(&self) -> &'static str {
        "Fake"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn create_sandbox(&self, request: CreateSandboxRequest) -> Result<SandboxInfo> {
        let mut inner = self.state.lock().unwrap();
        inner.next_id += 1;
        let id = format!("fake-{}", inner.next_id);
        let sandbox = FakeSandbox {
            state: SandboxState::Started,
            metadata: request.metadata,
            files: BTreeMap::new(),
            pending_polls: 0,
        };
        let info = Self::info(&id, &sandbox);
        inner.sandboxes.insert(id, sandbox);
        Ok(info)
    }

    async fn get_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        self.state.lock().unwrap().get_calls += 1;
        self.with_sandbox(sandbox_id, |sandbox| {
            if sandbox.pending_polls > 0 {
                sandbox.pending_polls -= 1;
                if sandbox.pending_polls == 0 {
                    sandbox.state = SandboxState::Started;
                }
            }
            Ok(Self::info(sandbox_id, sandbox))
        })
    }

    async fn start_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        self.state.lock().unwrap().start_calls += 1;
        let delay = self.polls_until_started;
        self.with_sandbox(sandbox_id, |sandbox| {
            if delay == 0 {
                sandbox.state = SandboxState::Started;
            } else {
                sandbox.state = SandboxState::Creating;
                sandbox.pending_polls = delay;
            }
            Ok(Self::info(sandbox_id, sandbox))
        })
    }

    async fn stop_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        self.with_sandbox(sandbox_id, |sandbox| {
            sandbox.state = SandboxState::Stopped;
            Ok(Self::info(sandbox_id, sandbox))
        })
    }

    async fn delete_sandbox(&self, sandbox_id: &str) -> Result<()> {
        self.state.lock().unwrap().sandboxes.remove(sandbox_id);
        Ok(())
    }

    async fn execute_command(
        &self,
        sandbox_id: &str,
        command: &str,
        _options: ExecOptions,
    ) -> Result<ExecuteResult> {
        self.with_sandbox(sandbox_id, |_| Ok(()))?;
        self.state
            .lock()
            .unwrap()
            .commands
            .push((sandbox_id.to_string(), command.to_string()));
        Ok(ExecuteResult::completed(
            0,
            format!("ran: {}", command),
            String::new(),
        ))
    }

    async fn write_file(
        &self,
        sandbox_id: &str,
        path: &str,
        content: &[u8],
        _mode: Option<u32>,
    ) -> Result<()> {
        self.with_sandbox(sandbox_id, |sandbox| {
            sandbox.files.insert(path.to_string(), content.to_vec());
            Ok(())
        })
    }

    async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<Vec<u8>> {
        self.with_sandbox(sandbox_id, |sandbox| {
            sandbox
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| SandboxError::FileNotFound(path.to_string()))
        })
    }

    async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<FileInfo>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.with_sandbox(sandbox_id, |sandbox| {
            Ok(sandbox
                .files
                .iter()
                .filter(|(file, _)| {
                    file.strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.contains('/'))
                })
                .map(|(file, content)| FileInfo {
                    path: file.clone(),
                    size: content.len() as u64,
                    is_directory: false,
                    modified_time: None,
                })
                .collect())
        })
    }

    async fn delete_file(&self, sandbox_id: &str, path: &str) -> Result<()> {
        self.with_sandbox(sandbox_id, |sandbox| {
            sandbox.files.remove(path);
            Ok(())
        })
    }

    async fn health_check(&self, sandbox_id: &str) -> bool {
        matches!(
            self.get_sandbox(sandbox_id).await,
            Ok(info) if info.state == SandboxState::Started
        )
    }

    async fn get_resource_usage(&self, _sandbox_id: &str) -> Result<Option<ResourceUsage>> {
        Ok(None)
    }

    fn browser(&self) -> Option<&dyn BrowserAutomation> {
        self.browser
            .as_ref()
            .map(|browser| browser as &dyn BrowserAutomation)
    }
}

pub struct FakeBrowser;

#[async_trait]
impl BrowserAutomation for FakeBrowser {
    async fn browser_url(&self, sandbox_id: &str) -> Result<Option<String>> {
        Ok(Some(format!("http://browser.local/{}", sandbox_id)))
    }

    async fn take_screenshot(
        &self,
        _sandbox_id: &str,
        _url: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        Ok(Some(b"\x89PNG".to_vec()))
    }
}

/// Check if Docker is available for testing
pub async fn is_docker_available() -> bool {
    match Docker::connect_with_local_defaults() {
        Ok(docker) => docker.ping().await.is_ok(),
        Err(_) => false,
    }
}
