//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of tools this server knows how to execute.
///
/// Dispatch happens on this enum rather than on the raw name string, so
/// adding a tool forces every `match` over it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "create-event")]
    CreateEvent,
    #[serde(rename = "search-events")]
    SearchEvents,
}

impl ToolKind {
    /// All tools, in the order they are advertised.
    pub const ALL: [ToolKind; 2] = [ToolKind::CreateEvent, ToolKind::SearchEvents];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::CreateEvent => "create-event",
            ToolKind::SearchEvents => "search-events",
        }
    }

    /// Resolve a wire name to a tool, `None` if the name is not registered.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name (exact key expected in the call arguments)
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Parameter type hint ("string", "array", ...)
    pub param_type: String,
    /// Optional JSON Schema `format` (e.g. "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Element type for `array` parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Element `format` for `array` parameters (e.g. "email")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_format: Option<String>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
            format: None,
            item_type: None,
            item_format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Mark this parameter as an array whose elements have the given type.
    pub fn array_of(mut self, item_type: impl Into<String>) -> Self {
        self.param_type = "array".to_string();
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_item_format(mut self, format: impl Into<String>) -> Self {
        self.item_format = Some(format.into());
        self
    }
}

/// Definition of a tool advertised to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Which tool this definition describes
    pub kind: ToolKind,
    /// Unique wire name of the tool (e.g., "create-event")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter specifications, in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(kind: ToolKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

/// Ordered specification of the tools a server advertises.
///
/// Names are unique: a definition whose name is already registered is
/// rejected and the first definition stands.
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: Vec<ToolDefinition>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        if !self.contains(&tool.name) {
            self.tools.push(tool);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn get_kind(&self, kind: ToolKind) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.kind == kind)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Protocol-facing descriptor of a tool: what `tools/list` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A named call with opaque arguments, as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to call
    pub name: String,
    /// Arguments passed to the tool, absent when the caller sent none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Arguments, or `None` when they are absent or an empty object.
    pub fn non_empty_arguments(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.arguments.as_ref().filter(|args| !args.is_empty())
    }
}
