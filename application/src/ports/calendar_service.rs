//! Calendar service port
//!
//! Defines the capability the tools execute against. A [`ServiceHandle`] is
//! built from a valid credential by a [`CalendarConnector`] and is owned by
//! the service lifecycle for the rest of the process.

use async_trait::async_trait;
use calmcp_domain::{Credential, Event, EventDraft, EventQuery, SendUpdates};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the calendar backend
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend no longer accepts the credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Calendar API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl CalendarError {
    /// Whether the credential behind the handle should be considered dead.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CalendarError::Unauthorized(_))
    }
}

/// Authorized capability to create and list events.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Create an event, notifying attendees according to `send_updates`.
    async fn insert(
        &self,
        draft: &EventDraft,
        send_updates: SendUpdates,
    ) -> Result<Event, CalendarError>;

    /// List events matching `query`.
    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, CalendarError>;
}

/// Shared handle to the process-wide calendar service.
pub type ServiceHandle = Arc<dyn CalendarService>;

/// Builds a [`ServiceHandle`] from a credential.
#[async_trait]
pub trait CalendarConnector: Send + Sync {
    async fn connect(&self, credential: Credential) -> Result<ServiceHandle, CalendarError>;
}
