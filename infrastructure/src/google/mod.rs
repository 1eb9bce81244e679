//! Google adapters: OAuth authorization and the Calendar v3 API.

pub mod calendar;
pub mod oauth;
mod wire;

pub use calendar::{GoogleCalendarConnector, GoogleCalendarService};
pub use oauth::{GoogleOAuthClient, PendingAuthorization};
