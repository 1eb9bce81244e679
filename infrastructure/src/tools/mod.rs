//! Tool schema rendering
//!
//! Turns the domain tool registry into the JSON Schema descriptors
//! advertised to callers.

mod schema;

pub use schema::JsonSchemaToolConverter;
