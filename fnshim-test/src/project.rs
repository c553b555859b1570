//! Scripted stand-in for the Django project
//!
//! Lays out `<root>/manage.py` and `<root>/netlify/functions/` in a temp
//! directory. `manage.py` is a shell script run by `sh`, so tests control
//! exactly what the "server" prints and when.

use fnshim_function::FunctionConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::server::TestError;

/// A temporary project whose entry script is a shell script
pub struct ScriptedProject {
    dir: TempDir,
    function_dir: PathBuf,
}

impl ScriptedProject {
    /// Create a project whose `manage.py` runs `script` under `sh`
    pub fn new(script: &str) -> Result<Self, TestError> {
        let dir = tempfile::tempdir().map_err(|e| TestError::Setup(e.to_string()))?;
        let function_dir = dir.path().join("netlify").join("functions");
        std::fs::create_dir_all(&function_dir).map_err(|e| TestError::Setup(e.to_string()))?;
        std::fs::write(dir.path().join("manage.py"), script)
            .map_err(|e| TestError::Setup(e.to_string()))?;

        Ok(Self { dir, function_dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn function_dir(&self) -> &Path {
        &self.function_dir
    }

    /// Function config running this project's script with `sh`
    pub fn config(&self) -> FunctionConfig {
        FunctionConfig {
            function_dir: Some(self.function_dir.clone()),
            interpreter: "sh".to_string(),
            ..Default::default()
        }
    }
}
