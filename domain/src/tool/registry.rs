//! Calendar tool registry: the fixed, ordered set of tools this server
//! advertises.
//!
//! Field names and required/optional status are the contract callers code
//! against; changing them is a breaking change.

use super::entities::{ToolDefinition, ToolKind, ToolParameter, ToolSpec};

/// Format hint shared by every timestamp parameter.
const DATE_TIME: &str = "date-time";

/// Get the tool definition for create-event
pub fn create_event_definition() -> ToolDefinition {
    ToolDefinition::new(
        ToolKind::CreateEvent,
        "Create a new calendar event. Times must be in ISO 8601 format with UTC timezone (e.g., '2024-12-04T10:00:00Z')",
    )
    .with_parameter(ToolParameter::new("summary", "Title of the event", true))
    .with_parameter(ToolParameter::new("description", "Event description", false))
    .with_parameter(
        ToolParameter::new(
            "start_time",
            "Start time in ISO 8601 format with UTC timezone (e.g., '2024-12-04T10:00:00Z')",
            true,
        )
        .with_format(DATE_TIME),
    )
    .with_parameter(
        ToolParameter::new(
            "end_time",
            "End time in ISO 8601 format with UTC timezone (e.g., '2024-12-04T11:00:00Z')",
            true,
        )
        .with_format(DATE_TIME),
    )
    .with_parameter(
        ToolParameter::new("attendees", "List of attendee email addresses", false)
            .array_of("string")
            .with_item_format("email"),
    )
}

/// Get the tool definition for search-events
pub fn search_events_definition() -> ToolDefinition {
    ToolDefinition::new(
        ToolKind::SearchEvents,
        "Search for calendar events. Time range must be specified in ISO 8601 format with UTC timezone",
    )
    .with_parameter(
        ToolParameter::new(
            "time_min",
            "Start time in ISO 8601 format (e.g., '2024-12-04T00:00:00Z')",
            true,
        )
        .with_format(DATE_TIME),
    )
    .with_parameter(
        ToolParameter::new(
            "time_max",
            "End time in ISO 8601 format (e.g., '2024-12-04T23:59:59Z')",
            true,
        )
        .with_format(DATE_TIME),
    )
    .with_parameter(ToolParameter::new("query", "Optional search term", false))
}

/// The tool specification advertised by the server.
pub fn calendar_tool_spec() -> ToolSpec {
    ToolSpec::new()
        .register(create_event_definition())
        .register(search_events_definition())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(def: &ToolDefinition) -> Vec<&str> {
        def.required_parameters().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_spec_lists_exactly_two_tools_in_order() {
        let spec = calendar_tool_spec();
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(names, vec!["create-event", "search-events"]);
    }

    #[test]
    fn test_create_event_fields() {
        let def = create_event_definition();
        assert_eq!(required(&def), vec!["summary", "start_time", "end_time"]);
        assert!(!def.parameter("description").unwrap().required);

        let attendees = def.parameter("attendees").unwrap();
        assert!(!attendees.required);
        assert_eq!(attendees.param_type, "array");
        assert_eq!(attendees.item_format.as_deref(), Some("email"));
        assert_eq!(
            def.parameter("start_time").unwrap().format.as_deref(),
            Some("date-time")
        );
    }

    #[test]
    fn test_search_events_fields() {
        let def = search_events_definition();
        assert_eq!(required(&def), vec!["time_min", "time_max"]);
        assert!(!def.parameter("query").unwrap().required);
        assert_eq!(def.parameters.len(), 3);
    }

    #[test]
    fn test_spec_is_stable_across_calls() {
        let first: Vec<ToolDefinition> = calendar_tool_spec().all().cloned().collect();
        let second: Vec<ToolDefinition> = calendar_tool_spec().all().cloned().collect();
        assert_eq!(first, second);
    }
}
