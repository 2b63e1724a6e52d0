//! OpenAPI 3.0 documents for dantic routes.
//!
//! The generator walks a [`RouteRegistry`](dantic_core::RouteRegistry),
//! keeps the endpoints whose name starts with a prefix and which declare a
//! response model, and documents each of their rules from the models'
//! schemas. Nested model definitions are hoisted into `components/schemas`.

mod builder;
mod error;
pub mod schema;
mod writer;

pub use builder::{build_document, OpenApiConfig};
pub use error::GenerateError;
pub use schema::{convert_parameter, find_definitions, merge_definitions};
pub use writer::{generate_swagger, write_document};
