use std::future::Future;
use std::sync::Arc;

use crate::http::{method_filter, routing, IntoResponse, Method, Request, Response, Router};
use crate::registry::RouteRegistry;
use crate::validator::{RequestContext, ValidatedHandler, ValidationFailure};

type FailureHandler = Arc<dyn Fn(ValidationFailure) -> Response + Send + Sync>;

/// An axum `Router` that records every validated endpoint it mounts.
///
/// Endpoints are identified by name, the way documentation groups them:
/// the same handler can be mounted on several patterns under one name and
/// keeps a single set of model metadata.
///
/// ```ignore
/// let list = Validate::new().query::<BookQuery>().response::<BookList>().wrap(list_books)?;
///
/// let app = ValidatedRouter::new()
///     .route("shop.list_books", "/books", &[Method::GET], list.clone())
///     .route("shop.list_books", "/shelves/{shelf}/books", &[Method::GET], list);
///
/// let document = build_document(&config, app.registry(), "shop")?;
/// let router = app.into_router();
/// ```
#[derive(Default)]
pub struct ValidatedRouter {
    router: Router,
    registry: RouteRegistry,
    failure_handler: Option<FailureHandler>,
}

impl ValidatedRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `handler` on `pattern` for `methods` under the endpoint `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered with a different handler, or
    /// if axum rejects the route (overlapping method routes).
    pub fn route<H, Fut, R>(
        mut self,
        name: &str,
        pattern: &str,
        methods: &[Method],
        handler: ValidatedHandler<H>,
    ) -> Self
    where
        H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        if !self.registry.register(name, handler.models(), pattern, methods) {
            panic!("endpoint '{name}' is already registered with a different handler");
        }

        let Some(filter) = methods
            .iter()
            .filter_map(method_filter)
            .reduce(|a, b| a.or(b))
        else {
            tracing::warn!(endpoint = name, pattern, "no routable method, route not mounted");
            return self;
        };

        let service = move |request: Request| {
            let handler = handler.clone();
            async move { handler.call(request).await }
        };
        tracing::debug!(endpoint = name, pattern, ?methods, "mounted validated route");
        self.router = self.router.route(pattern, routing::on(filter, service));
        self
    }

    /// Mount plain, unvalidated routes alongside the validated ones.
    pub fn merge(mut self, other: Router) -> Self {
        self.router = self.router.merge(other);
        self
    }

    /// Install the handler for failures raised by strict validators.
    ///
    /// Without one, a strict failure is answered with a generic 500.
    pub fn on_validation_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(ValidationFailure) -> Response + Send + Sync + 'static,
    {
        self.failure_handler = Some(Arc::new(handler));
        self
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Finish into the axum router, keeping the registry for documentation.
    pub fn into_parts(self) -> (Router, RouteRegistry) {
        let router = match self.failure_handler {
            Some(handler) => self.router.layer(axum::middleware::map_response(
                move |mut response: Response| {
                    let handler = Arc::clone(&handler);
                    async move {
                        match response.extensions_mut().remove::<ValidationFailure>() {
                            Some(failure) => handler(failure),
                            None => response,
                        }
                    }
                },
            )),
            None => self.router,
        };
        (router, self.registry)
    }

    pub fn into_router(self) -> Router {
        self.into_parts().0
    }
}
