//! Presentation layer for calmcp
//!
//! This crate contains the CLI definition and the MCP server that exposes
//! the tool dispatcher over stdio.

pub mod cli;
pub mod server;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use server::protocol::{PROTOCOL_VERSION, SERVER_NAME, ServerInfo};
pub use server::{McpServer, ServerError};
