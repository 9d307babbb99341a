// ABOUTME: Tests for the legacy-style sandbox handle over an in-memory adapter
// ABOUTME: Covers files/process passthrough, sessions, state caching and start polling

mod common;

use agentbox_sandbox::{
    create_compat_sandbox, get_or_start_sandbox, ExecOptions, Language, SandboxAdapter,
    SandboxError, SandboxState, SessionExecuteRequest, StartupPolling,
};
use common::FakeAdapter;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_create_records_password_and_project() {
    let adapter = Arc::new(FakeAdapter::new());
    let metadata = HashMap::from([("owner".to_string(), "agent-1".to_string())]);

    let sandbox = create_compat_sandbox(adapter.clone(), "s3cret", Some("proj-9"), metadata)
        .await
        .unwrap();

    assert_eq!(sandbox.password(), Some("s3cret"));
    assert_eq!(
        sandbox.metadata.get("project_id").map(String::as_str),
        Some("proj-9")
    );
    assert_eq!(
        sandbox.metadata.get("owner").map(String::as_str),
        Some("agent-1")
    );
    assert_eq!(sandbox.state().await, Some(SandboxState::Started));

    let info = adapter.get_sandbox(&sandbox.id).await.unwrap();
    assert_eq!(info.password.as_deref(), Some("s3cret"));
}

#[tokio::test]
async fn test_create_without_project_omits_it() {
    let adapter = Arc::new(FakeAdapter::new());
    let sandbox = create_compat_sandbox(adapter, "pw", None, HashMap::new())
        .await
        .unwrap();
    assert!(!sandbox.metadata.contains_key("project_id"));
}

#[tokio::test]
async fn test_files_passthrough() {
    let adapter = Arc::new(FakeAdapter::new());
    let sandbox = create_compat_sandbox(adapter, "pw", None, HashMap::new())
        .await
        .unwrap();

    sandbox
        .files
        .write("/workspace/test.txt", b"hello")
        .await
        .unwrap();
    assert_eq!(
        sandbox.files.read("/workspace/test.txt").await.unwrap(),
        b"hello".to_vec()
    );

    let listed = sandbox.files.list("/workspace").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].path, "/workspace/test.txt");
    assert_eq!(listed[0].size, 5);

    sandbox.files.remove("/workspace/test.txt").await.unwrap();
    assert!(sandbox.files.list("/workspace").await.unwrap().is_empty());
    let err = sandbox.files.read("/workspace/test.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_process_execute_and_code_run() {
    let adapter = Arc::new(FakeAdapter::new());
    let sandbox = create_compat_sandbox(adapter.clone(), "pw", None, HashMap::new())
        .await
        .unwrap();

    let result = sandbox
        .process
        .execute("echo hi", ExecOptions::default())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.stdout, "ran: echo hi");

    sandbox
        .process
        .code_run(Language::Python, "print(1)", Some(Duration::from_secs(5)))
        .await
        .unwrap();

    let commands: Vec<String> = adapter.commands().into_iter().map(|(_, c)| c).collect();
    assert_eq!(commands, vec!["echo hi", "python -c 'print(1)'"]);
}

#[tokio::test]
async fn test_sessions_are_local_bookkeeping() {
    let adapter = Arc::new(FakeAdapter::new());
    let sandbox = create_compat_sandbox(adapter.clone(), "pw", None, HashMap::new())
        .await
        .unwrap();

    sandbox.process.create_session("b").await;
    sandbox.process.create_session("a").await;
    sandbox.process.create_session("a").await;
    let ids: Vec<String> = sandbox
        .process
        .sessions()
        .await
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    let request = SessionExecuteRequest {
        command: "pwd".to_string(),
        run_async: true,
    };
    let result = sandbox
        .process
        .execute_session_command("a", request)
        .await
        .unwrap();
    assert_eq!(result.stdout, "ran: pwd");

    assert!(sandbox.process.delete_session("a").await);
    assert!(!sandbox.process.delete_session("a").await);
    assert_eq!(sandbox.process.sessions().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_session_runs_and_is_registered() {
    let adapter = Arc::new(FakeAdapter::new());
    let sandbox = create_compat_sandbox(adapter.clone(), "pw", None, HashMap::new())
        .await
        .unwrap();

    let result = sandbox
        .process
        .execute_session_command("missing", SessionExecuteRequest::new("ls"))
        .await
        .unwrap();
    assert_eq!(result.stdout, "ran: ls");
    assert_eq!(adapter.commands().len(), 1);

    let ids: Vec<String> = sandbox
        .process
        .sessions()
        .await
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    assert_eq!(ids, vec!["missing"]);
}

#[tokio::test]
async fn test_session_survives_reacquiring_the_sandbox() {
    let adapter = Arc::new(FakeAdapter::new());
    adapter.insert("box", SandboxState::Started);

    let first = get_or_start_sandbox(adapter.clone(), "box", StartupPolling::default())
        .await
        .unwrap();
    first.process.create_session("s1").await;

    let second = get_or_start_sandbox(adapter.clone(), "box", StartupPolling::default())
        .await
        .unwrap();
    let result = second
        .process
        .execute_session_command("s1", SessionExecuteRequest::new("ls"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.stdout, "ran: ls");
    assert_eq!(adapter.commands(), vec![("box".to_string(), "ls".to_string())]);
}

#[tokio::test]
async fn test_state_is_cached_until_refreshed() {
    let adapter = Arc::new(FakeAdapter::new());
    adapter.insert("box", SandboxState::Started);
    let sandbox = agentbox_sandbox::CompatSandbox::new(adapter.clone(), "box", HashMap::new());

    assert_eq!(sandbox.state().await, None);
    assert_eq!(sandbox.get_state().await.unwrap(), SandboxState::Started);

    adapter.set_state("box", SandboxState::Stopped);
    assert_eq!(sandbox.get_state().await.unwrap(), SandboxState::Started);
    assert_eq!(sandbox.state().await, Some(SandboxState::Started));

    assert_eq!(sandbox.refresh_state().await.unwrap(), SandboxState::Stopped);
    assert_eq!(sandbox.state().await, Some(SandboxState::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_get_or_start_waits_for_started() {
    let adapter = Arc::new(FakeAdapter::new().with_startup_delay(3));
    adapter.insert("box", SandboxState::Stopped);

    let started = tokio::time::Instant::now();
    let sandbox = get_or_start_sandbox(adapter.clone(), "box", StartupPolling::default())
        .await
        .unwrap();

    assert_eq!(sandbox.state().await, Some(SandboxState::Started));
    assert_eq!(adapter.start_calls(), 1);
    // One initial read plus three polls
    assert_eq!(adapter.get_calls(), 4);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_get_or_start_gives_up_without_error() {
    let adapter = Arc::new(FakeAdapter::new().with_startup_delay(100));
    adapter.insert("box", SandboxState::Archived);

    let polling = StartupPolling {
        attempts: 5,
        interval: Duration::from_millis(200),
    };
    let sandbox = get_or_start_sandbox(adapter.clone(), "box", polling)
        .await
        .unwrap();

    assert_eq!(sandbox.state().await, Some(SandboxState::Creating));
    assert_eq!(adapter.get_calls(), 6);
}

#[tokio::test]
async fn test_get_or_start_leaves_running_sandbox_alone() {
    let adapter = Arc::new(FakeAdapter::new());
    adapter.insert("box", SandboxState::Started);

    let sandbox = get_or_start_sandbox(adapter.clone(), "box", StartupPolling::default())
        .await
        .unwrap();

    assert_eq!(sandbox.id, "box");
    assert_eq!(adapter.start_calls(), 0);
}

#[tokio::test]
async fn test_get_or_start_unknown_sandbox_fails() {
    let adapter = Arc::new(FakeAdapter::new());
    let err = get_or_start_sandbox(adapter, "nope", StartupPolling::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SandboxError::SandboxNotFound(_)));
}

#[tokio::test]
async fn test_browser_passthrough() {
    let plain = Arc::new(FakeAdapter::new());
    plain.insert("box", SandboxState::Started);
    let sandbox = agentbox_sandbox::CompatSandbox::new(plain, "box", HashMap::new());
    assert_eq!(sandbox.browser_url().await.unwrap(), None);
    assert_eq!(sandbox.take_screenshot(None).await.unwrap(), None);

    let with_browser = Arc::new(FakeAdapter::new().with_browser());
    with_browser.insert("box", SandboxState::Started);
    let sandbox = agentbox_sandbox::CompatSandbox::new(with_browser, "box", HashMap::new());
    assert_eq!(
        sandbox.browser_url().await.unwrap().as_deref(),
        Some("http://browser.local/box")
    );
    assert!(sandbox
        .take_screenshot(Some("https://example.com"))
        .await
        .unwrap()
        .is_some());
}
