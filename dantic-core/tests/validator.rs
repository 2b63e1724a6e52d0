use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use dantic_core::prelude::*;
use dantic_core::{ParamSource, Rejection, RequestParts};
use http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Models ──────────────────────────────────────────────────────────────────

fn default_tag() -> String {
    "book".to_string()
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Book {
    pub title: Option<String>,
    pub price: Option<i64>,
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl SchemaModel for Book {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PriceQuery {
    pub price: i64,
}

impl SchemaModel for PriceQuery {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Author {
    pub name: String,
    pub books: Vec<Book>,
}

impl SchemaModel for Author {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Test,
    Other,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct KindBody {
    #[serde(rename = "enum")]
    pub kind: Kind,
}

impl SchemaModel for KindBody {}

// ── Helpers ─────────────────────────────────────────────────────────────────

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn echo(ctx: RequestContext) -> Json<Value> {
    Json(json!({
        "query": ctx.query_mapping(),
        "body": ctx.body_mapping(),
    }))
}

fn book_app() -> Router {
    let query = Validate::new().query::<Book>().wrap(echo).unwrap();
    let body = Validate::new().body::<Book>().wrap(echo).unwrap();
    let merged = Validate::new()
        .body::<Book>()
        .merge_path_params(true)
        .wrap(echo)
        .unwrap();
    let nested = Validate::new().body::<Author>().wrap(echo).unwrap();
    let kinds = Validate::new().body::<KindBody>().wrap(echo).unwrap();

    ValidatedRouter::new()
        .route("test.query", "/book", &[Method::GET], query)
        .route("test.body", "/book", &[Method::POST], body)
        .route("test.merged", "/names/{title}/books", &[Method::PUT], merged)
        .route("test.author", "/author", &[Method::POST], nested)
        .route("test.enum", "/enum", &[Method::POST], kinds)
        .into_router()
}

// ── Non-strict validation ───────────────────────────────────────────────────

#[tokio::test]
async fn valid_query_reaches_the_handler() {
    let (status, body) = send(book_app(), "GET", "/book?title=123&price=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], json!({"title": "123", "price": 5, "tag": "book"}));
    assert_eq!(body["body"], Value::Null);
}

#[tokio::test]
async fn valid_body_reaches_the_handler() {
    let (status, body) = send(book_app(), "POST", "/book", Some(json!({"price": "123"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["price"], 123);
    assert_eq!(body["body"]["tag"], "book");
}

#[tokio::test]
async fn invalid_query_is_a_400() {
    let (status, body) = send(book_app(), "GET", "/book?price=str", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let report = body["validation_error"].as_object().unwrap();
    assert_eq!(report.len(), 1);
    let errors: Value = serde_json::from_str(report["query_params"].as_str().unwrap()).unwrap();
    assert_eq!(errors[0]["loc"], "price");
}

#[tokio::test]
async fn path_parameters_merge_into_the_body() {
    let (status, body) = send(
        book_app(),
        "PUT",
        "/names/1234/books",
        Some(json!({"price": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["title"], "1234");
    assert_eq!(body["body"]["price"], 123);
}

#[tokio::test]
async fn body_wins_over_path_parameters() {
    let (_, body) = send(
        book_app(),
        "PUT",
        "/names/1234/books",
        Some(json!({"title": "from-body"})),
    )
    .await;
    assert_eq!(body["body"]["title"], "from-body");
}

#[tokio::test]
async fn nested_models_are_validated() {
    let (status, body) = send(
        book_app(),
        "POST",
        "/author",
        Some(json!({"name": "123", "books": [{"title": "title", "price": "123"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["books"][0]["price"], 123);

    let (status, body) = send(book_app(), "POST", "/author", Some(json!({"name": "123"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["validation_error"]["body_params"].is_string());
}

#[tokio::test]
async fn enum_values_are_checked() {
    let (status, _) = send(book_app(), "POST", "/enum", Some(json!({"enum": "test"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(book_app(), "POST", "/enum", Some(json!({"enum": "not_test"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["validation_error"]["body_params"].is_string());
}

#[tokio::test]
async fn malformed_body_is_rejected_before_validation() {
    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = book_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_and_body_errors_are_reported_together() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handler = Validate::new()
        .query::<PriceQuery>()
        .body::<Author>()
        .wrap(move |_ctx: RequestContext| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK
            }
        })
        .unwrap();
    let app = ValidatedRouter::new()
        .route("test.both", "/both", &[Method::POST], handler)
        .into_router();

    let (status, body) = send(app, "POST", "/both?price=abc", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let report = body["validation_error"].as_object().unwrap();
    assert!(report.contains_key("query_params"));
    assert!(report.contains_key("body_params"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ── Strict validation ───────────────────────────────────────────────────────

fn strict_app(calls: Arc<AtomicUsize>) -> ValidatedRouter {
    let handler = Validate::new()
        .query::<PriceQuery>()
        .strict(true)
        .wrap(move |_ctx: RequestContext| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                "ok"
            }
        })
        .unwrap();
    ValidatedRouter::new().route("test.raise", "/test/raise", &[Method::GET], handler)
}

#[tokio::test]
async fn strict_failures_reach_the_installed_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = strict_app(Arc::clone(&calls))
        .on_validation_error(|failure| {
            let body = json!({
                "source": failure.source.key(),
                "errors": failure.error.errors(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        })
        .into_router();

    let (status, body) = send(app, "GET", "/test/raise?price=str", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["source"], "query_params");
    assert_eq!(body["errors"][0]["loc"], "price");
    assert!(body.get("validation_error").is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn strict_failures_without_a_handler_are_server_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = strict_app(Arc::clone(&calls)).into_router();

    let (status, body) = send(app, "GET", "/test/raise?price=str", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("validation_error").is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn strict_mode_passes_valid_requests() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = strict_app(Arc::clone(&calls)).into_router();

    let (status, _) = send(app, "GET", "/test/raise?price=7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ── Direct validator use ────────────────────────────────────────────────────

#[test]
fn run_exposes_typed_instances() {
    let validator = Validate::new().query::<Book>().compile().unwrap();
    let ctx = validator
        .run(&RequestParts::new().with_query("title=dune&price=12"))
        .unwrap();

    let book = ctx.query_params::<Book>().unwrap();
    assert_eq!(book.price, Some(12));
    assert!(ctx.query_params::<Author>().is_none());
    assert!(ctx.body_params::<Book>().is_none());
}

#[test]
fn strict_run_stops_at_the_query() {
    let validator = Validate::new()
        .query::<PriceQuery>()
        .body::<Author>()
        .strict(true)
        .compile()
        .unwrap();
    let parts = RequestParts::new().with_query("price=x");

    match validator.run(&parts) {
        Err(Rejection::Raised(failure)) => assert_eq!(failure.source, ParamSource::Query),
        other => panic!("expected a raised failure, got {other:?}"),
    }
}

#[test]
fn registry_records_shared_models() {
    let handler = Validate::new()
        .query::<Book>()
        .response::<Author>()
        .wrap(echo)
        .unwrap();
    let app = ValidatedRouter::new()
        .route("shop.books", "/books", &[Method::GET], handler.clone())
        .route("shop.books", "/shelves/{id}/books", &[Method::GET, Method::HEAD], handler);

    let endpoint = app.registry().get("shop.books").unwrap();
    assert_eq!(endpoint.rules.len(), 2);
    assert_eq!(endpoint.models.query.unwrap().name(), "Book");
    assert_eq!(endpoint.models.response.unwrap().name(), "Author");
    assert!(endpoint.models.body.is_none());
}

#[test]
#[should_panic(expected = "already registered")]
fn conflicting_endpoint_names_panic() {
    let first = Validate::new().query::<Book>().wrap(echo).unwrap();
    let second = Validate::new().query::<Book>().wrap(echo).unwrap();
    let _ = ValidatedRouter::new()
        .route("shop.books", "/a", &[Method::GET], first)
        .route("shop.books", "/b", &[Method::GET], second);
}
