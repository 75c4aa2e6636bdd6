//! Run options and the optional `tran.toml` project file.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options controlling a single interpreter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Deepest allowed nesting of method and constructor calls
    pub max_call_depth: usize,
    /// Name of the shared entry method
    pub entry: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            entry: "start".to_string(),
        }
    }
}

/// Configuration file structure for tran.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranConfig {
    pub run: RunOptions,
}

/// Failure to load a project file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(tran::config))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {path}: {message}")]
    #[diagnostic(code(tran::config))]
    Parse { path: String, message: String },
}

impl TranConfig {
    pub const FILE_NAME: &'static str = "tran.toml";

    /// Parse a project file's contents.
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.message().to_string(),
        })
    }

    /// Load a project file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&content, &display)
    }

    /// Load `tran.toml` from `dir`, or the defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(Self::FILE_NAME);
        if !path.exists() {
            tracing::debug!(dir = %dir.display(), "no project file, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(&path)?;
        tracing::debug!(path = %path.display(), ?config, "loaded project file");
        Ok(config)
    }
}
