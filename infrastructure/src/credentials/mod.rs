//! Credential persistence and OAuth client registration.

pub mod client_secret;
pub mod file_store;

pub use client_secret::{ClientSecret, ClientSecretError};
pub use file_store::FileCredentialStore;
