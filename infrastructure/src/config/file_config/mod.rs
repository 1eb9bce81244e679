//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod calendar;
mod credentials;
mod logging;
mod oauth;

pub use calendar::{DEFAULT_API_BASE, FileCalendarConfig};
pub use credentials::FileCredentialsConfig;
pub use logging::FileLoggingConfig;
pub use oauth::FileOAuthConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration values that deserialize but cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("calendar.calendar_id cannot be empty")]
    EmptyCalendarId,

    #[error("calendar.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("calendar.api_base is not a valid URL: {0}")]
    InvalidApiBase(String),

    #[error("oauth.scopes cannot be empty")]
    EmptyScopes,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Credential and client secret file locations
    pub credentials: FileCredentialsConfig,
    /// Calendar backend settings
    pub calendar: FileCalendarConfig,
    /// Interactive authorization settings
    pub oauth: FileOAuthConfig,
    /// Log sinks
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.calendar.calendar_id.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCalendarId);
        }

        if self.calendar.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        if let Err(e) = url::Url::parse(&self.calendar.api_base) {
            return Err(ConfigValidationError::InvalidApiBase(e.to_string()));
        }

        if self.oauth.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyScopes);
        }

        Ok(())
    }
}
