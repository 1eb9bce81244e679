//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Debug log file, in addition to stderr. Unset disables the file sink.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive used when no `-v` flag is given (e.g. "info")
    pub level: Option<String>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("calendar_server_debug.log")),
            level: None,
        }
    }
}
