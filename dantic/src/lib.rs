//! dantic: schema models that validate axum requests and document
//! themselves as OpenAPI.
//!
//! This facade crate re-exports the dantic sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use dantic::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Crate            |
//! |-----------|---------|------------------|
//! | `openapi` | **yes** | `dantic-openapi` |
//! | `test`    | no      | `dantic-test`    |
//! | `full`    | no      | All of the above |

pub extern crate dantic_core;

pub use dantic_core::*;

#[cfg(feature = "openapi")]
pub use dantic_openapi;

#[cfg(feature = "test")]
pub use dantic_test;

/// Unified prelude: the core prelude plus the entry points of every enabled
/// feature crate.
pub mod prelude {
    pub use dantic_core::prelude::*;

    #[cfg(feature = "openapi")]
    pub use dantic_openapi::{build_document, generate_swagger, OpenApiConfig};

    #[cfg(feature = "test")]
    pub use dantic_test::TestApp;
}
