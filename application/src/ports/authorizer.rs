//! Authorizer port
//!
//! Obtains credentials from the identity provider: either through an
//! interactive flow involving the user, or by renewing an expired credential
//! with its refresh token.

use async_trait::async_trait;
use calmcp_domain::Credential;
use thiserror::Error;

/// Errors that can occur during authorization
#[derive(Error, Debug)]
pub enum AuthorizationError {
    /// The client secret artifact is missing or unreadable.
    #[error("Client secret unavailable: {0}")]
    ClientSecret(String),

    /// The user declined, or the provider returned an error to the redirect.
    #[error("Authorization denied: {0}")]
    Denied(String),

    /// The interactive flow itself failed (listener, redirect parsing).
    #[error("Authorization flow failed: {0}")]
    Flow(String),

    /// Exchanging a code or refresh token for an access token failed.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

/// Port for obtaining credentials
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Run the interactive authorization flow for `scopes`.
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthorizationError>;

    /// Renew an expired credential without user interaction.
    ///
    /// Only called for credentials where [`Credential::can_refresh`] holds.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthorizationError>;
}
