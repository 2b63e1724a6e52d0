use dantic::dantic_openapi::{build_document, generate_swagger, OpenApiConfig};
use dantic::dantic_test::TestApp;
use dantic::validator::DEFAULT_BODY_LIMIT;
use example_app::services::BookService;
use example_app::{routes, API};
use serde_json::{json, Value};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn app() -> TestApp {
    TestApp::from_router(routes(BookService::new(), DEFAULT_BODY_LIMIT).unwrap())
}

fn dune() -> Value {
    json!({
        "title": "  Dune ",
        "price": "1299",
        "shelf": "fiction",
        "authors": [{"name": "Frank Herbert"}]
    })
}

// ── Catalogue ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_book_trims_title_through_setter() {
    app()
        .post("/books")
        .json(&dune())
        .send()
        .await
        .assert_created()
        .assert_json_path("id", 1)
        .assert_json_path("title", "Dune")
        .assert_json_path("price", 1299)
        .assert_json_path("shelf", "fiction")
        .assert_json_path("authors.0.name", "Frank Herbert");
}

#[tokio::test]
async fn create_book_reports_structural_errors_only() {
    let resp = app()
        .post("/books")
        .json(&json!({"title": "Dune", "price": "cheap", "authors": []}))
        .send()
        .await
        .assert_validation_error(&["body_params"]);

    let errors = resp.validation_errors("body_params");
    let mut locs: Vec<&str> = errors.iter().map(|e| e["loc"].as_str().unwrap()).collect();
    locs.sort_unstable();
    assert_eq!(locs, vec!["price", "shelf"]);
}

#[tokio::test]
async fn create_book_applies_business_rules() {
    let resp = app()
        .post("/books")
        .json(&json!({"title": "", "price": 5, "shelf": "science", "authors": []}))
        .send()
        .await
        .assert_validation_error(&["body_params"]);

    let errors = resp.validation_errors("body_params");
    let locs: Vec<&str> = errors.iter().map(|e| e["loc"].as_str().unwrap()).collect();
    assert!(locs.contains(&"title"));
    assert!(locs.contains(&"authors"));
}

#[tokio::test]
async fn list_filters_by_query_and_path() {
    let app = app();
    app.post("/books").json(&dune()).send().await.assert_created();
    app.post("/books")
        .json(&json!({"title": "Cosmos", "price": 2500, "shelf": "science", "authors": [{"name": "Carl Sagan"}]}))
        .send()
        .await
        .assert_created();

    app.get("/books")
        .query("max_price", 2000)
        .send()
        .await
        .assert_ok()
        .assert_json_path("count", 1)
        .assert_json_path("books.0.title", "Dune");

    app.get("/shelves/science/books")
        .send()
        .await
        .assert_ok()
        .assert_json_path("count", 1)
        .assert_json_path("books.0.title", "Cosmos");

    app.get("/books?shelf=poetry").send().await.assert_validation_error(&["query_params"]);
}

#[tokio::test]
async fn update_takes_id_from_path() {
    let app = app();
    app.post("/books").json(&dune()).send().await.assert_created();

    app.put("/books/1")
        .json(&json!({"title": "Dune Messiah"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("id", 1)
        .assert_json_path("title", "Dune Messiah");

    app.put("/books/7").json(&json!({})).send().await.assert_not_found();
}

#[tokio::test]
async fn reprice_failures_use_the_error_handler() {
    let app = app();
    app.post("/books").json(&dune()).send().await.assert_created();

    app.patch("/books/1/price")
        .json(&json!({"price": -5}))
        .send()
        .await
        .assert_status(dantic::http::StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_path("source", "body_params")
        .assert_json_path("detail.0.loc", "price");

    app.patch("/books/1/price")
        .json(&json!({"price": "999"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("price", 999);
}

#[tokio::test]
async fn status_needs_no_input() {
    app()
        .get("/status")
        .send()
        .await
        .assert_ok()
        .assert_json_path("status", "ok");
}

// ── Documentation ───────────────────────────────────────────────────────────

#[test]
fn document_covers_every_route() {
    let app = routes(BookService::new(), DEFAULT_BODY_LIMIT).unwrap();
    let doc = build_document(&OpenApiConfig::default(), app.registry(), API).unwrap();

    let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
    assert_eq!(
        paths,
        vec!["/books", "/shelves/{shelf}/books", "/books/{id}", "/books/{id}/price", "/status"]
    );

    let books = doc["paths"]["/books"].as_object().unwrap();
    assert!(books["get"]["parameters"].is_array());
    assert!(books["post"]["requestBody"].is_object());

    let status: Vec<&String> = doc["paths"]["/status"].as_object().unwrap().keys().collect();
    assert_eq!(status, vec!["get"]);
    assert_eq!(doc["paths"]["/status"]["get"]["summary"], "no parameters");

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("Book"));
    assert!(schemas.contains_key("Author"));
    assert_eq!(
        schemas["Book"]["properties"]["authors"]["items"]["$ref"],
        "#/components/schemas/Author"
    );
}

#[test]
fn swagger_file_is_written_under_the_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let config = OpenApiConfig::new("Bookstore API", "0.1.0").with_output_dir(dir.path());
    let app = routes(BookService::new(), DEFAULT_BODY_LIMIT).unwrap();

    generate_swagger(&config, app.registry(), API).unwrap();
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("books-swagger.json")).unwrap())
            .unwrap();
    assert_eq!(written["info"]["title"], "Bookstore API");
}
