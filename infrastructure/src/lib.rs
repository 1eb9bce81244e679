//! Infrastructure layer for calmcp
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: Google OAuth and Calendar clients, the
//! credential file store, tool schema rendering, and configuration file
//! loading.

pub mod config;
pub mod credentials;
pub mod google;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileCalendarConfig, FileConfig, FileCredentialsConfig,
    FileLoggingConfig, FileOAuthConfig,
};
pub use credentials::{ClientSecret, ClientSecretError, FileCredentialStore};
pub use google::{GoogleCalendarConnector, GoogleCalendarService, GoogleOAuthClient};
pub use tools::JsonSchemaToolConverter;
