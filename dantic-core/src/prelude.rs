//! Everything a service needs to declare models and validated routes.
//!
//! ```ignore
//! use dantic_core::prelude::*;
//! ```

pub use crate::config::DanticConfig;
pub use crate::error::{FieldError, ModelError, ValidationError};
pub use crate::http::{IntoResponse, Json, Method, Response, Router, StatusCode};
pub use crate::model::{Populate, SchemaModel, Setter};
pub use crate::router::ValidatedRouter;
pub use crate::validation::check_garde;
pub use crate::validator::{RequestContext, Validate, ValidationFailure};

pub use schemars::JsonSchema;
pub use serde::{Deserialize, Serialize};
