//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod authorizer;
pub mod calendar_service;
pub mod credential_store;
pub mod tool_schema;
