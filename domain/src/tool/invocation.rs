//! Typed tool invocations.
//!
//! Opaque `(name, arguments)` pairs are turned into a [`ToolInvocation`]
//! before anything touches the network, so malformed calls fail without I/O.

use super::entities::{ToolDefinition, ToolKind};
use super::traits::{DefaultToolValidator, ToolValidator};
use crate::calendar::entities::{EventDateTime, EventDraft, EventQuery};
use chrono::DateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Arguments that could not be decoded for a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid arguments for '{tool}': {message}")]
pub struct ArgumentError {
    pub tool: ToolKind,
    pub message: String,
}

impl ArgumentError {
    pub fn new(tool: ToolKind, message: impl Into<String>) -> Self {
        Self {
            tool,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateEventArgs {
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
}

impl CreateEventArgs {
    /// Build the backend payload; attendees only appear when non-empty.
    pub fn into_draft(self) -> EventDraft {
        let draft = EventDraft::new(
            self.summary,
            EventDateTime::at(self.start_time),
            EventDateTime::at(self.end_time),
        )
        .with_description(self.description.unwrap_or_default());

        match self.attendees {
            Some(emails) => draft.with_attendees(emails),
            None => draft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchEventsArgs {
    pub time_min: String,
    pub time_max: String,
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchEventsArgs {
    pub fn into_query(self) -> EventQuery {
        EventQuery::between(self.time_min, self.time_max)
            .with_query(self.query.unwrap_or_default())
    }
}

/// A validated call to one of the known tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    CreateEvent(CreateEventArgs),
    SearchEvents(SearchEventsArgs),
}

impl ToolInvocation {
    /// Validate `arguments` against `definition` and decode them.
    ///
    /// Unknown argument keys are ignored.
    pub fn decode(
        definition: &ToolDefinition,
        arguments: &Map<String, Value>,
    ) -> Result<Self, ArgumentError> {
        let kind = definition.kind;
        DefaultToolValidator
            .validate(arguments, definition)
            .map_err(|message| ArgumentError::new(kind, message))?;

        match kind {
            ToolKind::CreateEvent => {
                let args: CreateEventArgs = decode_args(kind, arguments)?;
                require_timestamp(kind, "start_time", &args.start_time)?;
                require_timestamp(kind, "end_time", &args.end_time)?;
                Ok(ToolInvocation::CreateEvent(args))
            }
            ToolKind::SearchEvents => {
                let args: SearchEventsArgs = decode_args(kind, arguments)?;
                require_timestamp(kind, "time_min", &args.time_min)?;
                require_timestamp(kind, "time_max", &args.time_max)?;
                Ok(ToolInvocation::SearchEvents(args))
            }
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::CreateEvent(_) => ToolKind::CreateEvent,
            ToolInvocation::SearchEvents(_) => ToolKind::SearchEvents,
        }
    }
}

fn decode_args<T: DeserializeOwned>(
    kind: ToolKind,
    arguments: &Map<String, Value>,
) -> Result<T, ArgumentError> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ArgumentError::new(kind, e.to_string()))
}

fn require_timestamp(kind: ToolKind, field: &str, value: &str) -> Result<(), ArgumentError> {
    DateTime::parse_from_rfc3339(value).map(|_| ()).map_err(|e| {
        ArgumentError::new(
            kind,
            format!("'{}' must be an ISO 8601 timestamp ({}): {}", field, e, value),
        )
    })
}
