//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] that renders tool
//! definitions as the `inputSchema` objects advertised by `tools/list`.

use calmcp_application::ports::tool_schema::ToolSchemaPort;
use calmcp_domain::tool::entities::{ToolDefinition, ToolParameter};
use serde_json::{Map, Value, json};

/// Default implementation producing JSON Schema input schemas.
///
/// Handles param_type → JSON Schema type mapping:
/// - `"string"` → `"string"`
/// - `"number"` → `"number"`
/// - `"integer"` → `"integer"`
/// - `"boolean"` → `"boolean"`
/// - `"array"` → `"array"` with `items` from the element type
/// - anything else → `"string"`
pub struct JsonSchemaToolConverter;

fn schema_type(param_type: &str) -> &'static str {
    match param_type {
        "number" => "number",
        "integer" => "integer",
        "boolean" => "boolean",
        "array" => "array",
        _ => "string",
    }
}

fn property(param: &ToolParameter) -> Value {
    let mut prop = Map::new();
    prop.insert("type".to_string(), json!(schema_type(&param.param_type)));
    prop.insert("description".to_string(), json!(param.description));
    if let Some(format) = &param.format {
        prop.insert("format".to_string(), json!(format));
    }

    if param.param_type == "array" {
        let mut items = Map::new();
        items.insert(
            "type".to_string(),
            json!(schema_type(param.item_type.as_deref().unwrap_or("string"))),
        );
        if let Some(format) = &param.item_format {
            items.insert("format".to_string(), json!(format));
        }
        prop.insert("items".to_string(), Value::Object(items));
    }

    Value::Object(prop)
}

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn input_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        for param in &tool.parameters {
            properties.insert(param.name.clone(), property(param));
        }
        let required: Vec<&str> = tool
            .required_parameters()
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
