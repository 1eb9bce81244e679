//! Application layer for calmcp
//!
//! This crate contains the use cases (service lifecycle and tool dispatch)
//! and the port definitions adapters implement. It depends only on the
//! domain layer.

pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use ports::{
    authorizer::{AuthorizationError, Authorizer},
    calendar_service::{CalendarConnector, CalendarError, CalendarService, ServiceHandle},
    credential_store::{CredentialStore, CredentialStoreError},
    tool_schema::ToolSchemaPort,
};
pub use use_cases::call_tool::{CallToolError, ToolDispatcher};
pub use use_cases::ensure_ready::{InitializationError, ServiceLifecycle};
