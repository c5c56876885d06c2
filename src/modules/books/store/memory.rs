use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookPatch, NewBook};
use crate::modules::books::query::{BookFilter, Window};

/// In-process store keeping books in insertion order.
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<IndexMap<String, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let book = book.into_book(Uuid::now_v7().to_string());
        self.books
            .write()
            .await
            .insert(book.id.clone(), book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: BookPatch) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        Ok(books.get_mut(id).map(|book| {
            patch.apply(book);
            book.clone()
        }))
    }

    async fn find_many(&self, filter: &BookFilter, window: Window) -> Result<Vec<Book>, StoreError> {
        let skip = usize::try_from(window.start).unwrap_or(usize::MAX);
        let take = usize::try_from(window.take).unwrap_or(usize::MAX);

        Ok(self
            .books
            .read()
            .await
            .values()
            .filter(|book| filter.matches(book))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &BookFilter) -> Result<u64, StoreError> {
        let books = self.books.read().await;
        Ok(books.values().filter(|book| filter.matches(book)).count() as u64)
    }
}
