//! Request validation around route handlers.
//!
//! [`Validate`] declares which models apply to a handler. Wrapping a handler
//! compiles those models once; every request then goes through
//! [`RequestValidator::run`], which builds each model's input from the query
//! string or JSON body (optionally on top of the path parameters), collects
//! failures from both sources, and either rejects the request or hands the
//! validated instances to the handler through its [`RequestContext`].

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use serde_json::{Map, Value};

use crate::error::{SchemaError, ValidationError};
use crate::http::{IntoResponse, Json, Parts, RawPathParams, Request, Response, StatusCode};
use crate::model::SchemaModel;
use crate::params::{parse_json_object, path_map, query_map, BodyError, RequestParts};
use crate::registry::{HandlerModels, ModelRef};
use crate::schema::CompiledModel;

/// Default cap on the size of a JSON body read for validation.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

// ── Error types ────────────────────────────────────────────

/// Which part of the request a model was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Query,
    Body,
}

impl ParamSource {
    /// Key used in `validation_error` bodies and on the request context.
    pub fn key(self) -> &'static str {
        match self {
            ParamSource::Query => "query_params",
            ParamSource::Body => "body_params",
        }
    }
}

/// A validation failure raised in strict mode.
///
/// It leaves the handler as a response carrying the failure in its
/// extensions. Without an error handler installed through
/// [`ValidatedRouter::on_validation_error`](crate::router::ValidatedRouter::on_validation_error)
/// the client sees a plain 500.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub source: ParamSource,
    pub error: ValidationError,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.source.key(), self.error)
    }
}

impl std::error::Error for ValidationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl IntoResponse for ValidationFailure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": "Internal server error" });
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Why a request did not reach its handler.
#[derive(Debug, Clone)]
pub enum Rejection {
    /// Non-strict failures, keyed by `query_params` / `body_params`, each
    /// holding the JSON rendering of that model's error list.
    Invalid(Map<String, Value>),
    /// A strict-mode failure, propagated as is.
    Raised(ValidationFailure),
    /// The body could not be read as a JSON object.
    Body(BodyError),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Invalid(errors) => {
                let body = serde_json::json!({ "validation_error": errors });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Rejection::Raised(failure) => failure.into_response(),
            Rejection::Body(err) => err.into_response(),
        }
    }
}

// ── Validated instances ────────────────────────────────────

/// A constructed model, stored on the request context without its type.
pub trait ModelInstance: Any + Send + Sync {
    fn to_mapping(&self) -> Map<String, Value>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: SchemaModel> ModelInstance for T {
    fn to_mapping(&self) -> Map<String, Value> {
        SchemaModel::as_mapping(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

trait ErasedModel: Send + Sync {
    fn construct(&self, input: Map<String, Value>) -> Result<Box<dyn ModelInstance>, ValidationError>;
}

impl<T: SchemaModel> ErasedModel for CompiledModel<T> {
    fn construct(&self, input: Map<String, Value>) -> Result<Box<dyn ModelInstance>, ValidationError> {
        let model: Box<dyn ModelInstance> = Box::new(CompiledModel::construct(self, input)?);
        Ok(model)
    }
}

#[derive(Clone, Copy)]
struct ModelDecl {
    model: ModelRef,
    compile: fn() -> Result<Arc<dyn ErasedModel>, SchemaError>,
}

impl ModelDecl {
    fn of<T: SchemaModel>() -> Self {
        fn compile<T: SchemaModel>() -> Result<Arc<dyn ErasedModel>, SchemaError> {
            let compiled: Arc<dyn ErasedModel> = Arc::new(CompiledModel::<T>::compile()?);
            Ok(compiled)
        }
        Self {
            model: ModelRef::of::<T>(),
            compile: compile::<T>,
        }
    }
}

/// Per-request context handed to a validated handler.
///
/// Owned by the single request being served.
pub struct RequestContext {
    head: Parts,
    path_params: Map<String, Value>,
    query_params: Option<Box<dyn ModelInstance>>,
    body_params: Option<Box<dyn ModelInstance>>,
}

impl RequestContext {
    fn new(path_params: Map<String, Value>) -> Self {
        let (head, ()) = ::http::Request::new(()).into_parts();
        Self {
            head,
            path_params,
            query_params: None,
            body_params: None,
        }
    }

    fn with_head(mut self, head: Parts) -> Self {
        self.head = head;
        self
    }

    /// The validated query model, if one was declared and is of type `T`.
    pub fn query_params<T: SchemaModel>(&self) -> Option<&T> {
        self.query_params
            .as_deref()
            .and_then(|instance| instance.as_any().downcast_ref::<T>())
    }

    /// The validated body model, if one was declared and is of type `T`.
    pub fn body_params<T: SchemaModel>(&self) -> Option<&T> {
        self.body_params
            .as_deref()
            .and_then(|instance| instance.as_any().downcast_ref::<T>())
    }

    pub fn query_mapping(&self) -> Option<Map<String, Value>> {
        self.query_params.as_deref().map(|instance| instance.to_mapping())
    }

    pub fn body_mapping(&self) -> Option<Map<String, Value>> {
        self.body_params.as_deref().map(|instance| instance.to_mapping())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).and_then(Value::as_str)
    }

    /// Method, URI, headers and extensions of the request.
    pub fn head(&self) -> &Parts {
        &self.head
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_mapping())
            .field("body_params", &self.body_mapping())
            .finish()
    }
}

// ── Declaration ────────────────────────────────────────────

/// Declares the models that apply to one handler.
///
/// ```ignore
/// let handler = Validate::new()
///     .body::<Book>()
///     .merge_path_params(true)
///     .response::<Book>()
///     .wrap(update_book)?;
/// ```
#[derive(Clone, Default)]
pub struct Validate {
    query: Option<ModelDecl>,
    body: Option<ModelDecl>,
    response: Option<ModelRef>,
    merge_path_params: bool,
    strict: bool,
    body_limit: Option<usize>,
}

impl Validate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the query string (and path parameters, when merged) with `Q`.
    pub fn query<Q: SchemaModel>(mut self) -> Self {
        self.query = Some(ModelDecl::of::<Q>());
        self
    }

    /// Validate the JSON body (and path parameters, when merged) with `B`.
    pub fn body<B: SchemaModel>(mut self) -> Self {
        self.body = Some(ModelDecl::of::<B>());
        self
    }

    /// Document `R` as the `200` response. Only routes with a response
    /// model appear in the generated document.
    pub fn response<R: SchemaModel>(mut self) -> Self {
        self.response = Some(ModelRef::of::<R>());
        self
    }

    /// Seed each model's input with the route's path parameters. Values from
    /// the query string or body win on conflicts.
    pub fn merge_path_params(mut self, enabled: bool) -> Self {
        self.merge_path_params = enabled;
        self
    }

    /// Propagate the first validation failure instead of answering 400.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// Compile every declared request model.
    pub fn compile(self) -> Result<RequestValidator, SchemaError> {
        let query = self.query.map(|decl| (decl.compile)()).transpose()?;
        let body = self.body.map(|decl| (decl.compile)()).transpose()?;
        let models = HandlerModels {
            query: self.query.map(|decl| decl.model),
            body: self.body.map(|decl| decl.model),
            response: self.response,
        };
        Ok(RequestValidator {
            models: Arc::new(models),
            query,
            body,
            merge_path_params: self.merge_path_params,
            strict: self.strict,
            body_limit: self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
        })
    }

    /// Compile the declared models and wrap `handler` with them.
    pub fn wrap<H, Fut, R>(self, handler: H) -> Result<ValidatedHandler<H>, SchemaError>
    where
        H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send,
        R: IntoResponse,
    {
        Ok(ValidatedHandler {
            validator: Arc::new(self.compile()?),
            handler,
        })
    }
}

// ── Per-request validation ─────────────────────────────────

/// Compiled form of a [`Validate`] declaration.
pub struct RequestValidator {
    models: Arc<HandlerModels>,
    query: Option<Arc<dyn ErasedModel>>,
    body: Option<Arc<dyn ErasedModel>>,
    merge_path_params: bool,
    strict: bool,
    body_limit: usize,
}

impl RequestValidator {
    pub fn models(&self) -> &Arc<HandlerModels> {
        &self.models
    }

    pub fn expects_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Validate the raw inputs of one request.
    ///
    /// The query model is checked before the body model. In strict mode the
    /// first failure is returned as [`Rejection::Raised`]; otherwise both are
    /// checked and reported together as [`Rejection::Invalid`].
    pub fn run(&self, parts: &RequestParts) -> Result<RequestContext, Rejection> {
        let mut ctx = RequestContext::new(parts.path_params.clone());
        let mut errors = Map::new();

        if let Some(model) = &self.query {
            let input = parts.merged(&parts.query, self.merge_path_params);
            if let Some(instance) = self.check(model.as_ref(), input, ParamSource::Query, &mut errors)? {
                ctx.query_params = Some(instance);
            }
        }

        if let Some(model) = &self.body {
            let empty = Map::new();
            let source = parts.body.as_ref().unwrap_or(&empty);
            let input = parts.merged(source, self.merge_path_params);
            if let Some(instance) = self.check(model.as_ref(), input, ParamSource::Body, &mut errors)? {
                ctx.body_params = Some(instance);
            }
        }

        if !errors.is_empty() {
            return Err(Rejection::Invalid(errors));
        }
        Ok(ctx)
    }

    fn check(
        &self,
        model: &dyn ErasedModel,
        input: Map<String, Value>,
        source: ParamSource,
        errors: &mut Map<String, Value>,
    ) -> Result<Option<Box<dyn ModelInstance>>, Rejection> {
        match model.construct(input) {
            Ok(instance) => Ok(Some(instance)),
            Err(error) if self.strict => {
                tracing::debug!(source = source.key(), %error, "raising validation failure");
                Err(Rejection::Raised(ValidationFailure { source, error }))
            }
            Err(error) => {
                tracing::debug!(source = source.key(), errors = error.len(), "validation failed");
                errors.insert(source.key().to_string(), Value::String(error.to_json_string()));
                Ok(None)
            }
        }
    }
}

// ── Wrapped handler ────────────────────────────────────────

/// A handler guarded by its [`RequestValidator`].
///
/// Cheap to clone: clones share the compiled models and the metadata the
/// route registry records.
pub struct ValidatedHandler<H> {
    validator: Arc<RequestValidator>,
    handler: H,
}

impl<H: Clone> Clone for ValidatedHandler<H> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            handler: self.handler.clone(),
        }
    }
}

impl<H, Fut, R> ValidatedHandler<H>
where
    H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    R: IntoResponse,
{
    pub fn models(&self) -> &Arc<HandlerModels> {
        self.validator.models()
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    /// Serve one request: extract the raw inputs, validate them, and run the
    /// handler only when validation passed.
    pub async fn call(&self, request: Request) -> Response {
        let (mut head, body) = request.into_parts();

        let path_params = RawPathParams::from_request_parts(&mut head, &())
            .await
            .map(|raw| path_map(&raw))
            .unwrap_or_default();
        let query = query_map(head.uri.query());

        let body = if self.validator.expects_body() {
            let bytes = match axum::body::to_bytes(body, self.validator.body_limit).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    return Rejection::Body(BodyError {
                        message: format!("Failed to read request body: {err}"),
                    })
                    .into_response()
                }
            };
            match parse_json_object(&bytes) {
                Ok(map) => Some(map),
                Err(err) => return Rejection::Body(err).into_response(),
            }
        } else {
            None
        };

        let parts = RequestParts {
            path_params,
            query,
            body,
        };
        match self.validator.run(&parts) {
            Ok(ctx) => (self.handler)(ctx.with_head(head)).await.into_response(),
            Err(rejection) => {
                tracing::warn!(
                    method = %head.method,
                    uri = %head.uri,
                    "request rejected by validation"
                );
                rejection.into_response()
            }
        }
    }
}
