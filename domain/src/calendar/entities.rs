//! Calendar event entities
//!
//! Field names serialize in the calendar backend's camelCase convention so the
//! adapter can send drafts and read events without a second mapping layer.

use serde::{Deserialize, Serialize};

/// Maximum number of events returned by a search.
pub const SEARCH_RESULT_CAP: u32 = 10;

/// Title shown for events that have none.
pub const UNTITLED: &str = "Untitled";

/// Start or end of an event: either a timestamp or an all-day date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day date (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Self::default()
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// The timestamp if present, otherwise the all-day date.
    pub fn resolved(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            response_status: None,
        }
    }
}

/// Payload for creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    /// Absent unless at least one attendee was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

impl EventDraft {
    pub fn new(
        summary: impl Into<String>,
        start: EventDateTime,
        end: EventDateTime,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: String::new(),
            start,
            end,
            attendees: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach attendees; an empty list leaves the field absent.
    pub fn with_attendees<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attendees: Vec<Attendee> = emails.into_iter().map(Attendee::new).collect();
        self.attendees = (!attendees.is_empty()).then_some(attendees);
        self
    }
}

/// An event as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

impl Event {
    /// Title, or `"Untitled"` when the event has none.
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or(UNTITLED)
    }
}

/// Ordering applied to search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventOrder {
    #[default]
    StartTime,
}

impl EventOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrder::StartTime => "startTime",
        }
    }
}

/// Who the backend notifies about a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendUpdates {
    #[default]
    All,
    ExternalOnly,
    None,
}

impl SendUpdates {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendUpdates::All => "all",
            SendUpdates::ExternalOnly => "externalOnly",
            SendUpdates::None => "none",
        }
    }
}

/// Filter for listing events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: String,
    pub time_max: String,
    /// Free-text filter; empty means no filter
    pub query: String,
    pub max_results: u32,
    /// Expand recurring events into single instances
    pub single_events: bool,
    pub order_by: EventOrder,
}

impl EventQuery {
    /// Query over `[time_min, time_max)` with the default cap, expansion and
    /// start-time ordering.
    pub fn between(time_min: impl Into<String>, time_max: impl Into<String>) -> Self {
        Self {
            time_min: time_min.into(),
            time_max: time_max.into(),
            query: String::new(),
            max_results: SEARCH_RESULT_CAP,
            single_events: true,
            order_by: EventOrder::StartTime,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}
