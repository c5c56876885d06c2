pub mod models;
pub mod query;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use once_cell::sync::OnceCell;
use shelf_db::Database;
use shelf_kernel::{InitCtx, Migration, Module};

use service::BookService;
use store::{BookStore, MemoryBookStore, SurrealBookStore};

/// Books module: CRUD and search over the `book` collection
pub struct BooksModule {
    service: OnceCell<Arc<BookService>>,
}

impl BooksModule {
    pub const fn new() -> Self {
        Self {
            service: OnceCell::new(),
        }
    }

    /// The service built during `init`
    pub fn service(&self) -> Option<Arc<BookService>> {
        self.service.get().cloned()
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let store: Arc<dyn BookStore> = match ctx.db {
            Database::Memory => Arc::new(MemoryBookStore::new()),
            Database::Surreal(client) => Arc::new(SurrealBookStore::new(client.clone())),
        };

        let service = BookService::new(store, ctx.settings.books.default_limit);
        self.service
            .set(Arc::new(service))
            .map_err(|_| anyhow!("books module initialized twice"))?;

        tracing::info!(
            module = self.name(),
            backend = ?ctx.db.backend(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.service() {
            Some(service) => routes::router(service),
            None => {
                tracing::warn!(module = self.name(), "routes requested before init, mounting nothing");
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List active books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "string" }, "description": "1-based page, echoed back as currentPage" },
                            { "name": "limit", "in": "query", "schema": { "type": "string" }, "description": "Page size, default 10" },
                            { "name": "search", "in": "query", "schema": { "type": "string" }, "description": "Matches bookName, authorName or publishedYear" }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookPage" } } }
                            },
                            "500": {
                                "description": "Storage error",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } } }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
                            },
                            "500": {
                                "description": "Storage error",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
                            }
                        }
                    }
                },
                "/books/{id}": {
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "requestBody": {
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } } }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            },
                            "500": {
                                "description": "Storage error",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Soft-delete a book",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Book with status 0",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Store-assigned identifier" },
                            "bookId": { "type": "string" },
                            "bookName": { "type": "string" },
                            "authorName": { "type": "string" },
                            "publishedYear": { "type": "integer" },
                            "price": { "type": "number" },
                            "status": { "type": "integer", "enum": [0, 1], "description": "1 active, 0 deleted" }
                        },
                        "required": ["id", "status"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string" },
                            "bookName": { "type": "string" },
                            "authorName": { "type": "string" },
                            "publishedYear": { "type": "integer" },
                            "price": { "type": "number" },
                            "status": { "type": "integer", "enum": [0, 1] }
                        }
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "totalPages": { "type": "integer" },
                            "currentPage": { "oneOf": [{ "type": "string" }, { "type": "integer" }] },
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                        },
                        "required": ["totalPages", "currentPage", "books"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE IF NOT EXISTS book SCHEMALESS;
                DEFINE FIELD IF NOT EXISTS status ON book TYPE int DEFAULT 1;
                DEFINE INDEX IF NOT EXISTS book_status ON book FIELDS status;
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
