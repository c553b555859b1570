//! Function configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happens to the spawned server once the handler has responded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildPolicy {
    /// Leave the server running; its output keeps draining in the background
    #[default]
    Detach,
    /// Kill the server after the response is built
    Kill,
}

impl ChildPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detach => "detach",
            Self::Kill => "kill",
        }
    }
}

/// Function configuration
///
/// Every default reproduces `python ../../manage.py runserver 0.0.0.0:8000`
/// sampled for 100ms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// Name the function is hosted under
    pub function_name: String,
    /// The handler's own location; defaults to the executable's directory
    pub function_dir: Option<PathBuf>,
    /// Directories up from `function_dir` to the project root
    pub root_depth: usize,
    pub interpreter: String,
    /// Prefer `<root>/.venv/bin/python` when it exists
    pub use_virtualenv: bool,
    /// Entry script, relative to the project root
    pub entry_script: PathBuf,
    pub subcommand: String,
    pub bind_address: String,
    pub sample_window_ms: u64,
    pub child_policy: ChildPolicy,
    /// Output text that marks the server as ready; unset keeps the fixed window
    pub ready_marker: Option<String>,
    pub ready_timeout_ms: u64,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            function_dir: None,
            root_depth: 2,
            interpreter: "python".to_string(),
            use_virtualenv: false,
            entry_script: PathBuf::from("manage.py"),
            subcommand: "runserver".to_string(),
            bind_address: "0.0.0.0:8000".to_string(),
            sample_window_ms: 100,
            child_policy: ChildPolicy::Detach,
            ready_marker: None,
            ready_timeout_ms: 5_000,
        }
    }
}

/// Name of the single hosted function
pub const DEFAULT_FUNCTION_NAME: &str = "server";

impl FunctionConfig {
    pub fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Directory the handler considers its own location
    pub fn resolved_function_dir(&self) -> PathBuf {
        if let Some(dir) = &self.function_dir {
            return dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Project root, `root_depth` directories above the function directory
    pub fn project_root(&self) -> PathBuf {
        ascend(&self.resolved_function_dir(), self.root_depth)
    }

    pub fn entry_script_path(&self) -> PathBuf {
        self.project_root().join(&self.entry_script)
    }

    /// Program to spawn, honouring `use_virtualenv`
    pub fn interpreter_path(&self) -> PathBuf {
        if self.use_virtualenv {
            let venv_python = self.project_root().join(".venv").join("bin").join("python");
            if venv_python.is_file() {
                return venv_python;
            }
        }
        PathBuf::from(&self.interpreter)
    }
}

/// Lexically walk `levels` directories up, adding `..` once there is
/// nothing left to pop.
fn ascend(dir: &Path, levels: usize) -> PathBuf {
    let mut path = dir.to_path_buf();
    for _ in 0..levels {
        if path.file_name().is_some() {
            path.pop();
        } else {
            path.push("..");
        }
    }
    if path.as_os_str().is_empty() {
        path.push(".");
    }
    path
}
