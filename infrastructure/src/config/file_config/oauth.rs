//! OAuth flow configuration from TOML (`[oauth]` section)

use calmcp_domain::CALENDAR_SCOPE;
use serde::{Deserialize, Serialize};

/// Raw OAuth configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOAuthConfig {
    /// Scopes requested by the interactive flow
    pub scopes: Vec<String>,
    /// Interface the loopback redirect listener binds to
    pub redirect_host: String,
    /// Port of the loopback redirect listener (0 picks a free port)
    pub redirect_port: u16,
}

impl Default for FileOAuthConfig {
    fn default() -> Self {
        Self {
            scopes: vec![CALENDAR_SCOPE.to_string()],
            redirect_host: "127.0.0.1".to_string(),
            redirect_port: 0,
        }
    }
}
