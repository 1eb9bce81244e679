//! Credential domain module
//!
//! The [`Credential`] authorizing calls to the calendar backend. Validity is
//! derived from the expiry; loading, refreshing and persisting belong to the
//! application layer's lifecycle manager.

pub mod entities;

pub use entities::{CALENDAR_SCOPE, Credential, EXPIRY_SKEW_SECONDS};
