//! Tool domain module
//!
//! This module defines what the server advertises and how a raw call becomes
//! something executable:
//!
//! ```text
//! ┌──────────────┐    ┌─────────────────┐    ┌────────────────┐
//! │ ToolSpec     │───▶│ ToolCallRequest │───▶│ ToolInvocation │
//! │ (registry)   │    │ (name + args)   │    │ (typed, valid) │
//! └──────────────┘    └─────────────────┘    └────────────────┘
//! ```
//!
//! - [`registry::calendar_tool_spec`]: the fixed, ordered tool list
//! - [`ToolKind`]: closed enumeration used for dispatch
//! - [`ToolValidator`]: pure required-field / type checks
//! - [`ToolInvocation`]: decoded arguments, ready for the backend
//! - [`ContentBlock`]: result content returned to the caller
//!
//! Everything here is pure; execution lives in the application layer.

pub mod content;
pub mod entities;
pub mod invocation;
pub mod registry;
pub mod traits;

pub use content::{ContentBlock, ResourceContents};
pub use entities::{
    ToolCallRequest, ToolDefinition, ToolDescriptor, ToolKind, ToolParameter, ToolSpec,
};
pub use invocation::{ArgumentError, CreateEventArgs, SearchEventsArgs, ToolInvocation};
pub use registry::calendar_tool_spec;
pub use traits::{DefaultToolValidator, ToolValidator};
