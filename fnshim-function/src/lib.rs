//! Function handler for fnshim
//!
//! Launches the Django development server on every invocation and answers
//! with whatever the server printed during the sampling window. Also hosts
//! the handler locally over HTTP and under the Lambda runtime.

pub mod capture;
pub mod config;
pub mod event;
pub mod handler;
pub mod handlers;
pub mod launcher;
pub mod runtime;

pub use capture::{OutputCapture, OutputStream};
pub use config::{ChildPolicy, FunctionConfig};
pub use event::{HandlerResponse, InvocationContext, InvocationEvent};
pub use handler::FunctionHandler;
pub use handlers::{function_router, FunctionState};
pub use launcher::{LaunchError, LaunchedServer, ProcessLauncher, ServerCommand, ServerLauncher};
