//! OAuth client secret artifact.
//!
//! Google issues client secrets as JSON with the client under an `installed`
//! (desktop app) or `web` key:
//!
//! ```json
//! {"installed": {"client_id": "...", "client_secret": "...",
//!                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
//!                "token_uri": "https://oauth2.googleapis.com/token"}}
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum ClientSecretError {
    #[error("Failed to read client secret {path}: {message}")]
    Read { path: String, message: String },

    #[error("Client secret is not valid JSON: {0}")]
    Malformed(String),

    #[error("Client secret has neither an \"installed\" nor a \"web\" section")]
    MissingClient,
}

/// OAuth client registration used by the authorization flow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(json: &str) -> Result<Self, ClientSecretError> {
        let file: ClientSecretFile =
            serde_json::from_str(json).map_err(|e| ClientSecretError::Malformed(e.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or(ClientSecretError::MissingClient)
    }

    pub async fn load(path: &Path) -> Result<Self, ClientSecretError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClientSecretError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_client() {
        let secret = ClientSecret::from_json(
            r#"{"installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "calmcp",
                "client_secret": "shh",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }}"#,
        )
        .unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("shh"));
        assert_eq!(secret.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_web_client_with_defaults() {
        let secret = ClientSecret::from_json(r#"{"web": {"client_id": "abc"}}"#).unwrap();
        assert_eq!(secret.client_id, "abc");
        assert!(secret.client_secret.is_none());
        assert_eq!(secret.auth_uri, GOOGLE_AUTH_URI);
    }

    #[test]
    fn test_missing_section() {
        let err = ClientSecret::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, ClientSecretError::MissingClient));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecret::load(&dir.path().join("credentials.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientSecretError::Read { .. }));
    }
}
