//! Bookstore demo: validated catalogue routes and their OpenAPI document.

pub mod models;
pub mod services;

use dantic::prelude::*;
use dantic::SchemaError;
use serde_json::json;

use models::{BookList, BookQuery, BookUpdate, NewBook, Reprice, Status};
use services::BookService;

/// Prefix shared by every documented endpoint.
pub const API: &str = "books";

/// Build the catalogue router. `body_limit` caps every JSON body read.
pub fn routes(service: BookService, body_limit: usize) -> Result<ValidatedRouter, SchemaError> {
    let list = Validate::new()
        .query::<BookQuery>()
        .merge_path_params(true)
        .response::<BookList>()
        .wrap({
            let service = service.clone();
            move |ctx: RequestContext| list_books(service.clone(), ctx)
        })?;

    let create = Validate::new()
        .body::<NewBook>()
        .body_limit(body_limit)
        .response::<models::Book>()
        .wrap({
            let service = service.clone();
            move |ctx: RequestContext| create_book(service.clone(), ctx)
        })?;

    let update = Validate::new()
        .body::<BookUpdate>()
        .body_limit(body_limit)
        .merge_path_params(true)
        .response::<models::Book>()
        .wrap({
            let service = service.clone();
            move |ctx: RequestContext| update_book(service.clone(), ctx)
        })?;

    let reprice = Validate::new()
        .body::<Reprice>()
        .body_limit(body_limit)
        .merge_path_params(true)
        .strict(true)
        .response::<models::Book>()
        .wrap(move |ctx: RequestContext| reprice_book(service.clone(), ctx))?;

    let health = Validate::new().response::<Status>().wrap(status)?;

    Ok(ValidatedRouter::new()
        .route("books.list", "/books", &[Method::GET], list.clone())
        .route("books.list", "/shelves/{shelf}/books", &[Method::GET], list)
        .route("books.create", "/books", &[Method::POST], create)
        .route("books.update", "/books/{id}", &[Method::PUT], update)
        .route("books.reprice", "/books/{id}/price", &[Method::PATCH], reprice)
        .route("books.status", "/status", &[Method::GET, Method::HEAD], health)
        .on_validation_error(|failure| {
            let body = json!({
                "source": failure.source.key(),
                "detail": failure.error.errors(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }))
}

async fn list_books(service: BookService, ctx: RequestContext) -> Response {
    let Some(query) = ctx.query_params::<BookQuery>() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let books = service.list(query).await;
    Json(BookList {
        count: books.len(),
        books,
    })
    .into_response()
}

async fn create_book(service: BookService, ctx: RequestContext) -> Response {
    let Some(new) = ctx.body_params::<NewBook>() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match service.create(new).await {
        Ok(book) => (StatusCode::CREATED, Json(book)).into_response(),
        Err(err) => {
            tracing::error!(%err, "failed to store book");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn update_book(service: BookService, ctx: RequestContext) -> Response {
    let Some(update) = ctx.body_params::<BookUpdate>() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match service.update(update).await {
        Some(book) => Json(book).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn reprice_book(service: BookService, ctx: RequestContext) -> Response {
    let Some(reprice) = ctx.body_params::<Reprice>() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match service.reprice(reprice.id, reprice.price).await {
        Some(book) => Json(book).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn status(_ctx: RequestContext) -> Json<Status> {
    Json(Status {
        status: "ok".to_string(),
    })
}
