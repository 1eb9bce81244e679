//! Tool domain traits
//!
//! Contains pure domain logic traits for tool argument validation.
//! The async dispatch lives in the application layer.

use super::entities::{ToolDefinition, ToolParameter};
use serde_json::{Map, Value};

/// Validator for tool call arguments
///
/// This is a pure domain trait that validates arguments
/// against a tool definition without any I/O operations.
pub trait ToolValidator {
    /// Validate call arguments against a tool definition
    fn validate(
        &self,
        arguments: &Map<String, Value>,
        definition: &ToolDefinition,
    ) -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Checks that required parameters are present and non-null, and that every
/// declared parameter that is present has the declared JSON type. Keys the
/// definition does not declare are tolerated.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(
        &self,
        arguments: &Map<String, Value>,
        definition: &ToolDefinition,
    ) -> Result<(), String> {
        for param in &definition.parameters {
            match arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, definition.name
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) => check_type(param, value).map_err(|expected| {
                    format!(
                        "Parameter '{}' for tool '{}' must be {}",
                        param.name, definition.name, expected
                    )
                })?,
            }
        }

        Ok(())
    }
}

fn check_type(param: &ToolParameter, value: &Value) -> Result<(), String> {
    if matches_type(&param.param_type, value) {
        if let (Value::Array(items), Some(item_type)) = (value, &param.item_type)
            && !items.iter().all(|item| matches_type(item_type, item))
        {
            return Err(format!("an array of {}", item_type));
        }
        return Ok(());
    }
    Err(format!("of type {}", param.param_type))
}

fn matches_type(param_type: &str, value: &Value) -> bool {
    match param_type {
        "array" => value.is_array(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "object" => value.is_object(),
        _ => value.is_string(),
    }
}
