//! Function handler
//!
//! One invocation launches the development server, samples whatever it
//! printed during the fixed window and responds with that text. The
//! handler never fails: a server that could not be started looks exactly
//! like one that has not printed anything yet.

use crate::capture::{OutputCapture, OutputStream};
use crate::config::{ChildPolicy, FunctionConfig};
use crate::event::{HandlerResponse, InvocationContext, InvocationEvent};
use crate::launcher::{ProcessLauncher, ServerLauncher};
use std::sync::Arc;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Handler for the hosted function
pub struct FunctionHandler {
    config: FunctionConfig,
    launcher: Arc<dyn ServerLauncher>,
}

impl FunctionHandler {
    /// Handler spawning the configured server process
    pub fn new(config: FunctionConfig) -> Self {
        let launcher = Arc::new(ProcessLauncher::from_config(&config));
        Self { config, launcher }
    }

    pub fn with_launcher(config: FunctionConfig, launcher: Arc<dyn ServerLauncher>) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &FunctionConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.function_name
    }

    /// Handle one invocation. The event is never inspected.
    pub async fn handle(
        &self,
        _event: InvocationEvent,
        context: InvocationContext,
    ) -> HandlerResponse {
        let started = Instant::now();
        let request_id = context.aws_request_id.as_str();
        let capture = OutputCapture::new();

        let (child, pumps) = match self.launcher.launch().await {
            Ok(server) => {
                debug!(request_id, pid = ?server.pid(), "Server launched");
                let pumps = [
                    capture.pump(OutputStream::Stdout, server.stdout),
                    capture.pump(OutputStream::Stderr, server.stderr),
                ];
                (server.child, Some(pumps))
            }
            Err(e) => {
                warn!(request_id, error = %e, "Server did not start; responding with empty output");
                (None, None)
            }
        };

        let response = match self.config.ready_marker.as_deref() {
            None => {
                tokio::time::sleep_until(started + self.config.sample_window()).await;
                HandlerResponse::ok(capture.body())
            }
            Some(marker) => {
                let deadline = started + self.config.ready_timeout();
                match tokio::time::timeout_at(deadline, capture.wait_for(marker)).await {
                    Ok(()) => HandlerResponse::ok(capture.body()),
                    Err(_) => {
                        warn!(
                            request_id,
                            marker,
                            timeout_ms = self.config.ready_timeout_ms,
                            "Server did not report ready in time"
                        );
                        HandlerResponse::gateway_timeout(capture.body())
                    }
                }
            }
        };
        // The body has been taken; a detached server's later output is drained and dropped
        capture.seal();

        info!(
            request_id,
            status = response.status_code,
            stdout_bytes = capture.len(OutputStream::Stdout),
            stderr_bytes = capture.len(OutputStream::Stderr),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Invocation complete"
        );

        self.release(child, pumps, request_id);
        response
    }

    /// Apply the child policy once the response has been built
    fn release(&self, child: Option<Child>, pumps: Option<[JoinHandle<()>; 2]>, request_id: &str) {
        match self.config.child_policy {
            ChildPolicy::Detach => {
                // Dropping the handles leaves the server and its pumps running
                debug!(
                    request_id,
                    pid = ?child.as_ref().and_then(Child::id),
                    "Leaving server process running"
                );
            }
            ChildPolicy::Kill => {
                if let Some(mut child) = child {
                    let pid = child.id();
                    if let Err(e) = child.start_kill() {
                        warn!(request_id, pid = ?pid, error = %e, "Failed to kill server process");
                    } else {
                        debug!(request_id, pid = ?pid, "Killed server process");
                    }
                    // Reap in the background so the process does not linger as a zombie
                    tokio::spawn(async move {
                        let _ = child.wait().await;
                    });
                }
                for pump in pumps.into_iter().flatten() {
                    pump.abort();
                }
            }
        }
    }
}
