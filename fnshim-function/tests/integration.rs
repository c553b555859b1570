//! Integration tests for the function handler
//!
//! These tests spawn real processes: `manage.py` is a shell script run by
//! `sh`, standing in for the Django development server.

#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use fnshim_core::RequestId;
use fnshim_function::{
    ChildPolicy, FunctionConfig, FunctionHandler, HandlerResponse, InvocationContext,
    InvocationEvent,
};
use fnshim_test::{ScriptedProject, TestHost};

/// Window long enough for `sh` to start on a loaded machine
const GENEROUS_WINDOW_MS: u64 = 1_000;

async fn invoke(config: FunctionConfig) -> HandlerResponse {
    let handler = FunctionHandler::new(config);
    let context = InvocationContext::local("server", &RequestId::new(), 10_000);
    handler.handle(InvocationEvent::default(), context).await
}

fn generous(project: &ScriptedProject) -> FunctionConfig {
    FunctionConfig {
        sample_window_ms: GENEROUS_WINDOW_MS,
        ..project.config()
    }
}

fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn kill_process(pid: &str) {
    let _ = std::process::Command::new("kill").arg(pid).status();
}

async fn read_pid(root: &Path) -> String {
    let pid_file = root.join("server.pid");
    for _ in 0..100 {
        if let Ok(pid) = std::fs::read_to_string(&pid_file) {
            if !pid.trim().is_empty() {
                return pid.trim().to_string();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server never wrote its pid");
}

// =============================================================================
// RESPONSE BODY
// =============================================================================

#[tokio::test]
async fn test_stdout_becomes_body() {
    let project =
        ScriptedProject::new("printf 'Watching for file changes with StatReloader\\n'").unwrap();

    let response = invoke(generous(&project)).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Watching for file changes with StatReloader\n");
}

#[tokio::test]
async fn test_stderr_used_when_stdout_empty() {
    let project = ScriptedProject::new("printf 'ModuleNotFoundError: django' >&2").unwrap();

    let response = invoke(generous(&project)).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "ModuleNotFoundError: django");
}

#[tokio::test]
async fn test_stdout_preferred_over_stderr() {
    let project = ScriptedProject::new("printf 'warning' >&2; printf 'o'").unwrap();

    let response = invoke(generous(&project)).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "o");
}

#[tokio::test]
async fn test_server_receives_runserver_arguments() {
    let project = ScriptedProject::new("printf '%s|' \"$@\"; pwd -P").unwrap();
    let root = project.root().canonicalize().unwrap();

    let response = invoke(generous(&project)).await;

    let expected = format!(
        "{}|runserver|0.0.0.0:8000|{}\n",
        project.root().join("manage.py").display(),
        root.display()
    );
    assert_eq!(response.body, expected);
}

// =============================================================================
// TIMING
// =============================================================================

#[tokio::test]
async fn test_default_window_status_and_lower_bound() {
    let project = ScriptedProject::new("printf 'Performing system checks...'").unwrap();

    let started = Instant::now();
    let response = invoke(project.config()).await;

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_output_after_window_is_ignored() {
    let project = ScriptedProject::new("sleep 1; printf 'late'").unwrap();

    let config = FunctionConfig {
        child_policy: ChildPolicy::Kill,
        ..project.config()
    };
    let response = invoke(config).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "");
}

#[tokio::test]
async fn test_missing_interpreter_still_succeeds() {
    let project = ScriptedProject::new("printf unreachable").unwrap();

    let config = FunctionConfig {
        interpreter: "fnshim-no-such-interpreter".to_string(),
        ..project.config()
    };

    let started = Instant::now();
    let response = invoke(config).await;

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(response, HandlerResponse::ok(String::new()));
}

// =============================================================================
// CHILD LIFETIME
// =============================================================================

#[tokio::test]
async fn test_detached_server_keeps_running() {
    let project = ScriptedProject::new("echo $$ > server.pid; exec sleep 30").unwrap();

    let response = invoke(generous(&project)).await;
    assert_eq!(response.status_code, 200);

    let pid = read_pid(project.root()).await;
    assert!(process_alive(&pid));
    kill_process(&pid);
}

#[tokio::test]
async fn test_kill_policy_terminates_server() {
    let project = ScriptedProject::new("echo $$ > server.pid; exec sleep 30").unwrap();

    let config = FunctionConfig {
        child_policy: ChildPolicy::Kill,
        ..generous(&project)
    };
    let response = invoke(config).await;
    assert_eq!(response.status_code, 200);

    let pid = read_pid(project.root()).await;
    let mut alive = true;
    for _ in 0..100 {
        if !process_alive(&pid) {
            alive = false;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    if alive {
        kill_process(&pid);
    }
    assert!(!alive, "server process survived the kill policy");
}

// =============================================================================
// READINESS
// =============================================================================

#[tokio::test]
async fn test_ready_marker_from_real_process() {
    let project = ScriptedProject::new(
        "printf 'Performing system checks...\\n'; sleep 0.3; \
         printf 'Quit the server with CONTROL-C.\\n'; exec sleep 30",
    )
    .unwrap();

    let config = FunctionConfig {
        ready_marker: Some("Quit the server with".to_string()),
        ready_timeout_ms: 10_000,
        child_policy: ChildPolicy::Kill,
        ..project.config()
    };

    let started = Instant::now();
    let response = invoke(config).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        "Performing system checks...\nQuit the server with CONTROL-C.\n"
    );
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_ready_marker_timeout_from_real_process() {
    let project = ScriptedProject::new("exec sleep 30").unwrap();

    let config = FunctionConfig {
        ready_marker: Some("Quit the server with".to_string()),
        ready_timeout_ms: 200,
        child_policy: ChildPolicy::Kill,
        ..project.config()
    };

    let response = invoke(config).await;
    assert_eq!(response.status_code, 504);
    assert_eq!(response.body, "");
}

// =============================================================================
// HTTP HOST
// =============================================================================

#[tokio::test]
async fn test_hosted_function_over_http() {
    let project = ScriptedProject::new("printf 'Starting development server'").unwrap();

    let host = TestHost::start(generous(&project)).await.unwrap();
    let reply = host.client().invoke("server").await.unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "Starting development server");
}

#[tokio::test]
async fn test_unknown_function_over_http() {
    let project = ScriptedProject::new("printf unreachable").unwrap();

    let host = TestHost::start(project.config()).await.unwrap();
    let reply = host.client().invoke("chatbot").await.unwrap();

    assert_eq!(reply.status, 404);
    assert!(reply.body.contains("ResourceNotFound"));
}
