//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use shelf_http::error::AppError;

use super::models::Book;
use super::service::{BookError, BookPage, BookService, ListParams};

type BookState = Arc<BookService>;

pub fn router(service: BookState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .with_state(service)
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound => AppError::not_found(err.to_string()),
            BookError::Storage(store) => AppError::storage(store.details(), store.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
}

fn json_object(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::bad_request("request body must be a JSON object")),
    }
}

async fn create_book(
    State(service): State<BookState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = service.create(&json_object(body)?).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<BookState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Book>, AppError> {
    let book = service.update(&id, &json_object(body)?).await?;
    Ok(Json(book))
}

async fn delete_book(
    State(service): State<BookState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = service.soft_delete(&id).await?;
    Ok(Json(book))
}

async fn list_books(
    State(service): State<BookState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookPage>, AppError> {
    let params = ListParams {
        page: query.page,
        limit: query.limit,
        search: query.search,
    };
    let page = service.list(&params).await?;
    Ok(Json(page))
}
