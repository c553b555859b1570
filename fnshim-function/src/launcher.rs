//! Server process launching
//!
//! Starts the backend development server as a child process with both
//! output streams piped back to the handler.

use crate::config::FunctionConfig;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Server launch errors
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture {0} of the server process")]
    MissingPipe(&'static str),
}

/// Boxed output stream of a launched server
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// A started server: its output streams and, for real processes, the child
pub struct LaunchedServer {
    pub stdout: OutputReader,
    pub stderr: OutputReader,
    pub child: Option<Child>,
}

impl LaunchedServer {
    /// A server backed by arbitrary streams and no OS process
    pub fn from_streams(
        stdout: impl AsyncRead + Send + Unpin + 'static,
        stderr: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child: None,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}

/// Starts the server for one invocation
#[async_trait]
pub trait ServerLauncher: Send + Sync {
    async fn launch(&self) -> Result<LaunchedServer, LaunchError>;
}

/// Fully resolved command line for the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: PathBuf,
}

impl ServerCommand {
    /// `<interpreter> <root>/<entry_script> <subcommand> <bind_address>`
    pub fn from_config(config: &FunctionConfig) -> Self {
        Self {
            program: config.interpreter_path(),
            args: vec![
                config.entry_script_path().into_os_string(),
                OsString::from(&config.subcommand),
                OsString::from(&config.bind_address),
            ],
            current_dir: config.project_root(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

/// Launches the server as an OS process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    command: ServerCommand,
}

impl ProcessLauncher {
    pub fn new(command: ServerCommand) -> Self {
        Self { command }
    }

    pub fn from_config(config: &FunctionConfig) -> Self {
        Self::new(ServerCommand::from_config(config))
    }
}

#[async_trait]
impl ServerLauncher for ProcessLauncher {
    async fn launch(&self) -> Result<LaunchedServer, LaunchError> {
        debug!(
            program = %self.command.program.display(),
            args = ?self.command.args,
            cwd = %self.command.current_dir.display(),
            "Spawning server process"
        );

        let mut child = self
            .command
            .command()
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.command.program.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(LaunchError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(LaunchError::MissingPipe("stderr"))?;

        info!(
            pid = ?child.id(),
            program = %self.command.program.display(),
            "Started server process"
        );

        Ok(LaunchedServer {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child: Some(child),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_command_from_default_config() {
        let config = FunctionConfig {
            function_dir: Some(PathBuf::from("/srv/site/netlify/functions")),
            ..Default::default()
        };

        let command = ServerCommand::from_config(&config);
        assert_eq!(command.program, PathBuf::from("python"));
        assert_eq!(
            command.args,
            vec![
                OsString::from("/srv/site/manage.py"),
                OsString::from("runserver"),
                OsString::from("0.0.0.0:8000"),
            ]
        );
        assert_eq!(command.current_dir, Path::new("/srv/site"));
    }

    #[test]
    fn test_command_uses_configured_bind_address() {
        let config = FunctionConfig {
            function_dir: Some(PathBuf::from("/srv/site/netlify/functions")),
            bind_address: "127.0.0.1:8123".to_string(),
            ..Default::default()
        };

        let command = ServerCommand::from_config(&config);
        assert_eq!(command.args[2], OsString::from("127.0.0.1:8123"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_fails_to_spawn() {
        let launcher = ProcessLauncher::new(ServerCommand {
            program: PathBuf::from("fnshim-no-such-interpreter"),
            args: vec![],
            current_dir: std::env::temp_dir(),
        });

        let result = launcher.launch().await;
        assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_pipes_output() {
        use tokio::io::AsyncReadExt;

        let launcher = ProcessLauncher::new(ServerCommand {
            program: PathBuf::from("sh"),
            args: vec![OsString::from("-c"), OsString::from("printf out; printf err >&2")],
            current_dir: std::env::temp_dir(),
        });

        let mut server = launcher.launch().await.unwrap();
        assert!(server.pid().is_some());

        let mut stdout = String::new();
        server.stdout.read_to_string(&mut stdout).await.unwrap();
        let mut stderr = String::new();
        server.stderr.read_to_string(&mut stderr).await.unwrap();

        assert_eq!(stdout, "out");
        assert_eq!(stderr, "err");

        if let Some(mut child) = server.child.take() {
            assert!(child.wait().await.unwrap().success());
        }
    }
}
