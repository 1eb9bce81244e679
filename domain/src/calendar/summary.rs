//! Human-readable text for tool results.

use super::entities::Event;

/// Text returned by a search that matched nothing.
pub const NO_EVENTS_FOUND: &str = "No events found";

/// Summary of a freshly created event: title, start, end and assigned id.
pub fn describe_created(event: &Event) -> String {
    format!(
        "Created event: {}\nStart: {}\nEnd: {}\nID: {}",
        event.title(),
        event.start.resolved().unwrap_or_default(),
        event.end.resolved().unwrap_or_default(),
        event.id
    )
}

/// Listing of search results, or [`NO_EVENTS_FOUND`] for an empty slice.
pub fn describe_search(events: &[Event]) -> String {
    if events.is_empty() {
        return NO_EVENTS_FOUND.to_string();
    }

    let entries = events
        .iter()
        .map(|event| {
            format!(
                "- {}\n  Start: {}\n  End: {}",
                event.title(),
                event.start.resolved().unwrap_or_default(),
                event.end.resolved().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Found {} events:\n\n{}", events.len(), entries)
}
