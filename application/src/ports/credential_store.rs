//! Credential store port
//!
//! Defines where the credential authorizing calendar calls is persisted
//! between process runs.

use async_trait::async_trait;
use calmcp_domain::Credential;
use thiserror::Error;

/// Errors that can occur while loading or saving a credential
#[derive(Error, Debug)]
pub enum CredentialStoreError {
    #[error("Failed to read credential: {0}")]
    Read(String),

    #[error("Failed to write credential: {0}")]
    Write(String),

    /// The stored data exists but cannot be decoded as a credential.
    #[error("Stored credential is malformed: {0}")]
    Malformed(String),
}

/// Port for credential persistence
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential, `None` if nothing has been stored yet.
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    /// Persist `credential`, replacing any previous one.
    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
}
