//! Credential file locations from TOML (`[credentials]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw credentials configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCredentialsConfig {
    /// Where the authorized credential is persisted between runs
    pub token_file: PathBuf,
    /// OAuth client secret downloaded from the Google Cloud console
    pub client_secret_file: PathBuf,
}

impl Default for FileCredentialsConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from("token.json"),
            client_secret_file: PathBuf::from("credentials.json"),
        }
    }
}
