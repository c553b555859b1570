//! In-process function host for tests

use fnshim_function::{function_router, FunctionConfig, FunctionHandler, FunctionState};
use portpicker::pick_unused_port;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::info;

use crate::STARTUP_TIMEOUT_SECS;

/// A function host serving one handler on a random local port
pub struct TestHost {
    port: u16,
    base_url: String,
    handle: JoinHandle<()>,
}

impl TestHost {
    /// Start hosting a handler built from `config`
    pub async fn start(config: FunctionConfig) -> Result<Self, TestError> {
        let port = pick_unused_port().ok_or(TestError::NoPortAvailable)?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|_| TestError::PortInUse(port))?;

        let state = Arc::new(FunctionState::new(Arc::new(FunctionHandler::new(config))));
        let router = function_router(state);

        info!(port = port, "Starting fnshim test host");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        // Wait until the listener accepts connections
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                return Ok(Self {
                    port,
                    base_url: format!("http://127.0.0.1:{port}"),
                    handle,
                });
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        handle.abort();
        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a client for invoking hosted functions
    pub fn client(&self) -> crate::FunctionClient {
        crate::FunctionClient::new(self.base_url.clone())
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Errors that can occur with the test host
#[derive(Debug)]
pub enum TestError {
    NoPortAvailable,
    PortInUse(u16),
    Setup(String),
    StartupTimeout,
    ClientError(String),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::NoPortAvailable => write!(f, "No available port found"),
            TestError::PortInUse(port) => write!(f, "Port {} is already in use", port),
            TestError::Setup(msg) => write!(f, "Failed to set up project: {}", msg),
            TestError::StartupTimeout => write!(f, "Test host startup timed out"),
            TestError::ClientError(msg) => write!(f, "Client error: {}", msg),
        }
    }
}

impl std::error::Error for TestError {}
