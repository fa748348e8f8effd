//! Runtime configuration (`funasm.toml`)
//!
//! ```toml
//! [engine]
//! warn_missing_module = true
//! trace = false
//!
//! [log]
//! filter = "warn"
//! ```

use crate::error::{CompileError, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub engine: EngineOptions,
    pub log: LogConfig,
}

/// Interpreter behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Warn once when a program runs without a `module` line
    pub warn_missing_module: bool,
    /// Log every executed line at debug level
    pub trace: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            warn_missing_module: true,
            trace: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "funasm.toml";

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CompileError::config_error(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Load `funasm.toml` from the script's directory, or the defaults
    pub fn discover(script: &Path) -> Result<Self> {
        let candidate = script
            .parent()
            .map(|dir| dir.join(Self::FILE_NAME))
            .filter(|path| path.is_file());
        match candidate {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
