pub use axum::body::{self, Body};
pub use axum::extract::{RawPathParams, Request};
pub use axum::response::{IntoResponse, Response};
pub use axum::routing::{self, MethodFilter};
pub use axum::{serve, Json, Router};
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode, Uri};
pub use http::request::Parts;

/// Map a method to the axum filter that matches it.
///
/// Returns `None` for methods axum cannot route on (extension methods).
pub fn method_filter(method: &Method) -> Option<MethodFilter> {
    MethodFilter::try_from(method.clone()).ok()
}
