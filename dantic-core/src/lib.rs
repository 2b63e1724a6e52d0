pub mod coerce;
pub mod config;
pub mod error;
pub mod http;
pub mod layers;
pub mod model;
pub mod params;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod schema;
pub mod validation;
pub mod validator;

pub use config::{ConfigError, ConfigValue, DanticConfig, FromConfigValue};
pub use error::{FieldError, ModelError, SchemaError, ValidationError};
pub use layers::{default_trace, init_tracing};
pub use model::{Populate, SchemaModel, Setter};
pub use params::{BodyError, RequestParts};
pub use registry::{Endpoint, HandlerModels, ModelRef, RouteRegistry, RouteRule};
pub use router::ValidatedRouter;
pub use schema::CompiledModel;
pub use validation::check_garde;
pub use validator::{
    ModelInstance, ParamSource, Rejection, RequestContext, RequestValidator, Validate,
    ValidatedHandler, ValidationFailure,
};

pub use garde;
pub use schemars;
