//! Calendar domain module
//!
//! Events as the tools see them: drafts sent for creation, events read back
//! from the backend, the search filter, and the text rendering of both.
//! Nothing here performs I/O; the backend itself is reached through the
//! application layer's `CalendarService` port.

pub mod entities;
pub mod summary;

pub use entities::{
    Attendee, Event, EventDateTime, EventDraft, EventOrder, EventQuery, SendUpdates,
    SEARCH_RESULT_CAP,
};
pub use summary::{NO_EVENTS_FOUND, describe_created, describe_search};
