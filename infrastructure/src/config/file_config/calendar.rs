//! Calendar backend configuration from TOML (`[calendar]` section)

use calmcp_domain::SendUpdates;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Raw calendar configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCalendarConfig {
    /// Calendar the tools operate on ("primary" is the user's main calendar)
    pub calendar_id: String,
    /// Base URL of the Calendar v3 REST API
    pub api_base: String,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Who is notified when an event is created (uses domain type)
    pub send_updates: SendUpdates,
}

impl FileCalendarConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for FileCalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_seconds: 30,
            send_updates: SendUpdates::All,
        }
    }
}
