//! Tool schema conversion port.
//!
//! Separates "which tools exist" (domain) from "how they are described on the
//! wire" (infrastructure). The domain layer defines [`ToolDefinition`] and
//! [`ToolSpec`]; this port renders them as JSON Schema descriptors.

use calmcp_domain::tool::entities::{ToolDefinition, ToolDescriptor, ToolSpec};

/// Port for converting tool definitions to protocol descriptors (JSON Schema).
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to its JSON Schema `inputSchema`.
    fn input_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert a single tool definition to a descriptor.
    fn descriptor(&self, tool: &ToolDefinition) -> ToolDescriptor {
        ToolDescriptor {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: self.input_schema(tool),
        }
    }

    /// Convert all tools to descriptors, preserving registration order.
    fn all_descriptors(&self, spec: &ToolSpec) -> Vec<ToolDescriptor> {
        spec.all().map(|t| self.descriptor(t)).collect()
    }
}
