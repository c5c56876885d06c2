//! Persistence seam for books.

mod memory;
mod surreal;

pub use memory::MemoryBookStore;
pub use surreal::SurrealBookStore;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use super::models::{Book, BookPatch, CastError, NewBook};
use super::query::{BookFilter, Window};

/// Failure reported by the persistence layer, schema casts included.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("surrealdb: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("book {0} was written but could not be read back")]
    Unreadable(String),
}

impl StoreError {
    /// Structured detail entries for error bodies
    pub fn details(&self) -> Vec<serde_json::Value> {
        match self {
            StoreError::Cast(cast) => vec![json!({
                "kind": "cast",
                "path": cast.path,
                "expected": cast.expected,
                "value": cast.value,
            })],
            StoreError::Surreal(_) => vec![json!({ "kind": "surrealdb" })],
            StoreError::Unreadable(id) => vec![json!({ "kind": "unreadable", "id": id })],
        }
    }
}

/// Document operations the book service needs.
///
/// Implementations assign ids on create and apply each update atomically per
/// document. Listing order is the store's natural order.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Merge `patch` into the book; `None` when no book has this id.
    async fn update(&self, id: &str, patch: BookPatch) -> Result<Option<Book>, StoreError>;

    /// Matching books in store order, restricted to `window`.
    async fn find_many(&self, filter: &BookFilter, window: Window) -> Result<Vec<Book>, StoreError>;

    async fn count(&self, filter: &BookFilter) -> Result<u64, StoreError>;
}
