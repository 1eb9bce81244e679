//! Tool result content blocks.
//!
//! A successful tool call yields an ordered `Vec<ContentBlock>`. The serde
//! representation matches the MCP content shapes so the transport can embed
//! the blocks unchanged.

use serde::{Deserialize, Serialize};

/// A single unit of structured result content.
///
/// # Examples
///
/// ```
/// use calmcp_domain::tool::content::ContentBlock;
///
/// let block = ContentBlock::text("No events found");
/// assert_eq!(block.as_text(), Some("No events found"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// Base64-encoded image data.
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// A resource embedded inline in the result.
    #[serde(rename = "resource")]
    EmbeddedResource { resource: ResourceContents },
}

/// Contents of an embedded resource: either text or a base64 blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block_wire_shape() {
        let json = serde_json::to_value(ContentBlock::text("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_image_block_wire_shape() {
        let block = ContentBlock::Image {
            data: "aGk=".to_string(),
            mime_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["mimeType"], "image/png");
        assert!(block.as_text().is_none());
    }

    #[test]
    fn test_embedded_resource_wire_shape() {
        let block = ContentBlock::EmbeddedResource {
            resource: ResourceContents {
                uri: "calendar://primary/evt1".to_string(),
                mime_type: Some("text/plain".to_string()),
                text: Some("Standup".to_string()),
                blob: None,
            },
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "resource");
        assert_eq!(json["resource"]["uri"], "calendar://primary/evt1");
        assert!(json["resource"].get("blob").is_none());
    }
}
