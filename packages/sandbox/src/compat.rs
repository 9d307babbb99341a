// ABOUTME: Legacy-style sandbox handle over the adapter contract
// ABOUTME: Nested files/process operations, local sessions and start-and-wait helpers

use crate::providers::SandboxAdapter;
use crate::types::{CreateSandboxRequest, ExecOptions, ExecuteResult, FileInfo, SandboxState};
use crate::{Result, SandboxError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// How long `get_or_start_sandbox` waits for a started sandbox to report ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPolling {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for StartupPolling {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

/// Command submitted to a named session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExecuteRequest {
    pub command: String,
    /// Accepted for compatibility; commands always run to completion
    #[serde(default, alias = "var_async")]
    pub run_async: bool,
}

impl SessionExecuteRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            run_async: false,
        }
    }
}

/// Bookkeeping for a session; no engine state backs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

/// Languages `code_run` knows how to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Bash,
    Node,
}

impl Language {
    /// Shell command running `code` with this language's interpreter
    pub fn command_for(&self, code: &str) -> String {
        let (program, flag) = match self {
            Self::Python => ("python", "-c"),
            Self::Bash => ("bash", "-c"),
            Self::Node => ("node", "-e"),
        };
        format!(
            "{} {} {}",
            program,
            flag,
            shell_escape::unix::escape(Cow::Borrowed(code))
        )
    }
}

impl FromStr for Language {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Self::Python),
            "bash" | "sh" => Ok(Self::Bash),
            "node" | "javascript" | "js" => Ok(Self::Node),
            other => Err(SandboxError::InvalidRequest(format!(
                "Unsupported language: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Python => "python",
            Self::Bash => "bash",
            Self::Node => "node",
        })
    }
}

/// `sandbox.files` operations
pub struct FileOperations {
    adapter: Arc<dyn SandboxAdapter>,
    sandbox_id: String,
}

impl FileOperations {
    pub async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.adapter
            .write_file(&self.sandbox_id, path, content, None)
            .await
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.adapter.read_file(&self.sandbox_id, path).await
    }

    pub async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        self.adapter.list_files(&self.sandbox_id, path).await
    }

    pub async fn remove(&self, path: &str) -> Result<()> {
        self.adapter.delete_file(&self.sandbox_id, path).await
    }
}

/// `sandbox.process` operations
pub struct ProcessOperations {
    adapter: Arc<dyn SandboxAdapter>,
    sandbox_id: String,
    sessions: RwLock<HashMap<String, SessionInfo>>,
}

impl ProcessOperations {
    pub async fn execute(&self, command: &str, options: ExecOptions) -> Result<ExecuteResult> {
        self.adapter
            .execute_command(&self.sandbox_id, command, options)
            .await
    }

    /// Run a snippet of code with the language's interpreter
    pub async fn code_run(
        &self,
        language: Language,
        code: &str,
        timeout: Option<Duration>,
    ) -> Result<ExecuteResult> {
        info!("Running {} code in sandbox {}", language, self.sandbox_id);
        let options = ExecOptions {
            timeout,
            ..Default::default()
        };
        self.execute(&language.command_for(code), options).await
    }

    /// Register a session. Re-creating an existing session keeps the original.
    pub async fn create_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionInfo {
                session_id: session_id.to_string(),
                created_at: Utc::now(),
            });
        debug!("Created session: {}", session_id);
    }

    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Known sessions ordered by id
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        sessions
    }

    /// Run a command on behalf of a session.
    ///
    /// Sessions live only on this handle, so an id created through another
    /// handle is registered here on first use instead of being rejected.
    pub async fn execute_session_command(
        &self,
        session_id: &str,
        request: SessionExecuteRequest,
    ) -> Result<ExecuteResult> {
        if !self.sessions.read().await.contains_key(session_id) {
            debug!("Session {} not registered on this handle; registering it", session_id);
            self.create_session(session_id).await;
        }
        if request.run_async {
            debug!("Session {} requested async execution; running synchronously", session_id);
        }
        self.execute(&request.command, ExecOptions::default()).await
    }
}

/// Sandbox handle exposing the legacy nested API
pub struct CompatSandbox {
    pub id: String,
    pub metadata: HashMap<String, String>,
    pub files: FileOperations,
    pub process: ProcessOperations,
    adapter: Arc<dyn SandboxAdapter>,
    state: RwLock<Option<SandboxState>>,
}

impl CompatSandbox {
    pub fn new(
        adapter: Arc<dyn SandboxAdapter>,
        sandbox_id: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        let id = sandbox_id.into();
        Self {
            files: FileOperations {
                adapter: Arc::clone(&adapter),
                sandbox_id: id.clone(),
            },
            process: ProcessOperations {
                adapter: Arc::clone(&adapter),
                sandbox_id: id.clone(),
                sessions: RwLock::new(HashMap::new()),
            },
            id,
            metadata,
            adapter,
            state: RwLock::new(None),
        }
    }

    fn with_state(mut self, state: SandboxState) -> Self {
        self.state = RwLock::new(Some(state));
        self
    }

    pub fn adapter(&self) -> &Arc<dyn SandboxAdapter> {
        &self.adapter
    }

    /// Password stored in the sandbox metadata at creation
    pub fn password(&self) -> Option<&str> {
        self.metadata.get("password").map(String::as_str)
    }

    /// State, fetched on first call and cached afterwards
    pub async fn get_state(&self) -> Result<SandboxState> {
        if let Some(state) = *self.state.read().await {
            return Ok(state);
        }
        self.refresh_state().await
    }

    /// Last known state without contacting the engine; may be stale
    pub async fn state(&self) -> Option<SandboxState> {
        *self.state.read().await
    }

    pub async fn refresh_state(&self) -> Result<SandboxState> {
        let info = self.adapter.get_sandbox(&self.id).await?;
        *self.state.write().await = Some(info.state);
        Ok(info.state)
    }

    /// Browser URL, or `None` when the provider has no browser capability
    pub async fn browser_url(&self) -> Result<Option<String>> {
        match self.adapter.browser() {
            Some(browser) => browser.browser_url(&self.id).await,
            None => Ok(None),
        }
    }

    pub async fn take_screenshot(&self, url: Option<&str>) -> Result<Option<Vec<u8>>> {
        match self.adapter.browser() {
            Some(browser) => browser.take_screenshot(&self.id, url).await,
            None => Ok(None),
        }
    }
}

/// Fetch a sandbox and make sure it is running.
///
/// A stopped or archived sandbox is started and then polled until it reports
/// `Started`. Running out of attempts is not an error; the handle carries the
/// last observed state.
pub async fn get_or_start_sandbox(
    adapter: Arc<dyn SandboxAdapter>,
    sandbox_id: &str,
    polling: StartupPolling,
) -> Result<CompatSandbox> {
    info!("Getting or starting sandbox with ID: {}", sandbox_id);

    let mut info = adapter.get_sandbox(sandbox_id).await.map_err(|e| {
        error!("Error retrieving sandbox {}: {}", sandbox_id, e);
        e
    })?;

    if matches!(info.state, SandboxState::Stopped | SandboxState::Archived) {
        info!("Sandbox is in {} state. Starting...", info.state);
        adapter.start_sandbox(sandbox_id).await.map_err(|e| {
            error!("Error starting sandbox {}: {}", sandbox_id, e);
            e
        })?;

        for _ in 0..polling.attempts {
            tokio::time::sleep(polling.interval).await;
            info = adapter.get_sandbox(sandbox_id).await?;
            if info.state == SandboxState::Started {
                break;
            }
        }
    }

    info!("Sandbox {} is {}", sandbox_id, info.state);
    Ok(CompatSandbox::new(adapter, info.sandbox_id, info.metadata).with_state(info.state))
}

/// Create a sandbox, recording the access password and project in its metadata
pub async fn create_compat_sandbox(
    adapter: Arc<dyn SandboxAdapter>,
    password: &str,
    project_id: Option<&str>,
    mut metadata: HashMap<String, String>,
) -> Result<CompatSandbox> {
    info!("Creating new sandbox environment");

    metadata.insert("password".to_string(), password.to_string());
    if let Some(project_id) = project_id {
        metadata.insert("project_id".to_string(), project_id.to_string());
    }

    let info = adapter
        .create_sandbox(CreateSandboxRequest::with_metadata(metadata))
        .await
        .map_err(|e| {
            error!("Error creating sandbox: {}", e);
            e
        })?;

    info!("Created sandbox: {}", info.sandbox_id);
    Ok(CompatSandbox::new(adapter, info.sandbox_id, info.metadata).with_state(info.state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("python", Language::Python)]
    #[case("Python3", Language::Python)]
    #[case("sh", Language::Bash)]
    #[case("javascript", Language::Node)]
    #[case(" node ", Language::Node)]
    fn test_language_parsing(#[case] raw: &str, #[case] expected: Language) {
        assert_eq!(raw.parse::<Language>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_language_is_invalid_request() {
        let err = "cobol".parse::<Language>().unwrap_err();
        assert!(matches!(err, SandboxError::InvalidRequest(_)));
    }

    #[rstest]
    #[case(Language::Python, "print('hi')", "python -c 'print('\\''hi'\\'')'")]
    #[case(Language::Bash, "echo $HOME", "bash -c 'echo $HOME'")]
    #[case(Language::Node, "console.log(1)", "node -e 'console.log(1)'")]
    fn test_command_for_quotes_code(
        #[case] language: Language,
        #[case] code: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(language.command_for(code), expected);
    }

    #[test]
    fn test_session_request_accepts_legacy_field_name() {
        let request: SessionExecuteRequest =
            serde_json::from_str(r#"{"command": "ls", "var_async": true}"#).unwrap();
        assert_eq!(request.command, "ls");
        assert!(request.run_async);
    }

    #[test]
    fn test_default_polling() {
        let polling = StartupPolling::default();
        assert_eq!(polling.attempts, 30);
        assert_eq!(polling.interval, Duration::from_secs(1));
    }
}
