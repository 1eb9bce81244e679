//! Configuration file loading for calmcp
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CALMCP_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./calmcp.toml` or `./.calmcp.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/calmcp/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_API_BASE, FileCalendarConfig, FileConfig,
    FileCredentialsConfig, FileLoggingConfig, FileOAuthConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
