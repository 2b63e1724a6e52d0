use std::sync::Arc;

use serde_json::Value;

use crate::http::Method;
use crate::model::SchemaModel;

/// Type-erased handle on a schema model, enough to document it.
#[derive(Clone, Copy)]
pub struct ModelRef {
    name: fn() -> String,
    describe: fn() -> Value,
}

impl ModelRef {
    pub fn of<T: SchemaModel>() -> Self {
        Self {
            name: T::model_name,
            describe: T::describe,
        }
    }

    pub fn name(&self) -> String {
        (self.name)()
    }

    pub fn describe(&self) -> Value {
        (self.describe)()
    }
}

impl std::fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelRef").field(&self.name()).finish()
    }
}

/// The models a validated handler declares.
///
/// Created once when the handler is wrapped and shared by every route the
/// handler is mounted on.
#[derive(Debug, Clone, Default)]
pub struct HandlerModels {
    pub query: Option<ModelRef>,
    pub body: Option<ModelRef>,
    pub response: Option<ModelRef>,
}

/// One URL rule an endpoint is mounted on.
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Route pattern exactly as registered, e.g. `/books/{id}`.
    pub pattern: String,
    pub methods: Vec<Method>,
}

/// A named handler and every rule it backs.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub models: Arc<HandlerModels>,
    pub rules: Vec<RouteRule>,
}

/// Side-table of registered endpoints, in registration order.
///
/// Owned by [`ValidatedRouter`](crate::router::ValidatedRouter) and handed to
/// the document generator once all routes are mounted.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    endpoints: Vec<Endpoint>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that endpoint `name` serves `pattern` for `methods`.
    ///
    /// Returns `false` when `name` is already registered with a different
    /// set of models; the registry is left unchanged in that case.
    pub fn register(
        &mut self,
        name: &str,
        models: &Arc<HandlerModels>,
        pattern: &str,
        methods: &[Method],
    ) -> bool {
        let rule = RouteRule {
            pattern: pattern.to_string(),
            methods: methods.to_vec(),
        };
        match self.endpoints.iter_mut().find(|e| e.name == name) {
            Some(endpoint) if Arc::ptr_eq(&endpoint.models, models) => {
                endpoint.rules.push(rule);
                true
            }
            Some(_) => false,
            None => {
                self.endpoints.push(Endpoint {
                    name: name.to_string(),
                    models: Arc::clone(models),
                    rules: vec![rule],
                });
                true
            }
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
