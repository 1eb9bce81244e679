//! Domain layer for calmcp
//!
//! This crate contains the tool definitions, calendar entities and the
//! credential model. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A tool is a named, schema-described operation an external agent can call.
//! The set is fixed ([`calendar_tool_spec`]) and dispatch happens over the
//! closed [`ToolKind`] enum.
//!
//! ## Credentials
//!
//! A [`Credential`] authorizes calls to the calendar backend. Its validity is
//! derived from its expiry; an expired credential with a refresh token can be
//! renewed without user interaction.

pub mod calendar;
pub mod credential;
pub mod tool;

// Re-export commonly used types
pub use calendar::{
    Attendee, Event, EventDateTime, EventDraft, EventOrder, EventQuery, SendUpdates,
    describe_created, describe_search,
};
pub use credential::{CALENDAR_SCOPE, Credential};
pub use tool::{
    ArgumentError, ContentBlock, ToolCallRequest, ToolDefinition, ToolDescriptor, ToolInvocation,
    ToolKind, ToolParameter, ToolSpec, calendar_tool_spec,
};
