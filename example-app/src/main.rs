use dantic::dantic_openapi::{generate_swagger, OpenApiConfig};
use dantic::{default_trace, init_tracing, DanticConfig};
use example_app::services::BookService;
use example_app::{routes, API};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // load() succeeds without any application.yaml; env vars still overlay.
    let config = DanticConfig::load("dev")?;
    let docs = OpenApiConfig::from_config(&config)?;
    let port = u16::try_from(config.get_or::<i64>("server.port", 3000)?)?;

    let app = routes(BookService::new(), config.body_limit()?)?;
    generate_swagger(&docs, app.registry(), API)?;

    let router = app.into_router().layer(default_trace());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "bookstore listening");
    dantic::http::serve(listener, router).await?;
    Ok(())
}
