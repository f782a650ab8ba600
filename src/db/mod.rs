//! Database module - schema snapshot types and introspection client

pub mod introspection;
mod schema;

pub use introspection::{HttpIntrospector, SchemaIntrospector};
pub use schema::*;

#[cfg(test)]
pub(crate) use schema::fixtures;
