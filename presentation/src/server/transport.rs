//! Frame classification for the stdio transport.
//!
//! Every line read from the client is one JSON-RPC message. Before it is
//! decoded into a typed message, [`classify_message`] decides what kind of
//! frame it is so the server knows whether a reply is owed.

use super::protocol::RequestId;

/// Classification of an incoming JSON-RPC message.
///
/// - `Request` → must be answered with the same `id`
/// - `Notification` → never answered
/// - `Response` → a reply to something we sent; this server sends no
///   requests, so these are dropped
/// - `Invalid` → answered with an `Invalid Request` error
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Has `id` + `method`.
    Request { id: RequestId },
    /// Has `method`, no `id`.
    Notification,
    /// Has `id`, no `method`.
    Response,
    /// Neither, or an `id` of the wrong type.
    Invalid { id: Option<RequestId> },
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &serde_json::Value) -> MessageKind {
    let id = json.get("id").filter(|v| !v.is_null());
    let parsed_id = id.and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());
    let has_method = json.get("method").and_then(|v| v.as_str()).is_some();

    match (id, parsed_id, has_method) {
        (Some(_), Some(id), true) => MessageKind::Request { id },
        (Some(_), None, _) => MessageKind::Invalid { id: None },
        (None, _, true) => MessageKind::Notification,
        (Some(_), Some(_), false) if is_response(json) => MessageKind::Response,
        (_, parsed_id, false) => MessageKind::Invalid { id: parsed_id },
    }
}

fn is_response(json: &serde_json::Value) -> bool {
    json.get("result").is_some() || json.get("error").is_some()
}
