//! Test utilities for fnshim
//!
//! Provides utilities for integration testing the function:
//! - Scripted stand-ins for the Django project on disk
//! - An in-process function host on a random port
//! - A client for invoking hosted functions over HTTP
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fnshim_test::{ScriptedProject, TestHost};
//!
//! #[tokio::test]
//! async fn test_invoke() {
//!     let project = ScriptedProject::new("printf ready").unwrap();
//!     let host = TestHost::start(project.config()).await.unwrap();
//!
//!     let reply = host.client().invoke("server").await.unwrap();
//!     assert_eq!(reply.status, 200);
//! }
//! ```

pub mod client;
pub mod project;
pub mod server;

pub use client::{FunctionClient, FunctionReply};
pub use project::ScriptedProject;
pub use server::{TestError, TestHost};

/// Timeout for waiting on the test host
pub const STARTUP_TIMEOUT_SECS: u64 = 10;
