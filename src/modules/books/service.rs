use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::{Book, BookPatch, NewBook};
use super::query::{BookFilter, PageRequest};
use super::store::{BookStore, StoreError};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Book not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Raw listing parameters, exactly as the caller sent them.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// One page of matching books.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub total_pages: u64,
    /// The caller's `page` value echoed back untouched, `1` when absent
    pub current_page: Value,
    pub books: Vec<Book>,
}

/// Stateless book operations over a [`BookStore`].
pub struct BookService {
    store: Arc<dyn BookStore>,
    default_limit: u64,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, default_limit: u64) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    pub async fn create(&self, payload: &Map<String, Value>) -> Result<Book, BookError> {
        let book = NewBook::from_payload(payload).map_err(StoreError::from)?;
        let created = self.store.create(book).await?;
        tracing::debug!(id = %created.id, "book created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, payload: &Map<String, Value>) -> Result<Book, BookError> {
        let patch = BookPatch::from_payload(payload).map_err(StoreError::from)?;
        self.apply(id, patch).await
    }

    /// Mark a book deleted. Deleting twice succeeds both times.
    pub async fn soft_delete(&self, id: &str) -> Result<Book, BookError> {
        self.apply(id, BookPatch::soft_delete()).await
    }

    pub async fn list(&self, params: &ListParams) -> Result<BookPage, BookError> {
        let page = PageRequest::from_raw(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.default_limit,
        );
        let filter = BookFilter::from_search(params.search.as_deref().unwrap_or_default());

        let matching = self.store.count(&filter).await?;
        let books = match page.window(matching) {
            Some(window) => self.store.find_many(&filter, window).await?,
            None => Vec::new(),
        };

        Ok(BookPage {
            total_pages: page.total_pages(matching),
            current_page: params
                .page
                .clone()
                .map_or_else(|| Value::from(1), Value::String),
            books,
        })
    }

    async fn apply(&self, id: &str, patch: BookPatch) -> Result<Book, BookError> {
        let updated = self.store.update(id, patch).await?;
        updated.ok_or(BookError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::Status;
    use crate::modules::books::store::MemoryBookStore;
    use serde_json::json;

    fn service() -> BookService {
        BookService::new(Arc::new(MemoryBookStore::new()), 10)
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn search(term: &str) -> ListParams {
        ListParams {
            search: Some(term.to_string()),
            ..ListParams::default()
        }
    }

    async fn seed(service: &BookService) -> (Book, Book) {
        let dune = service
            .create(&payload(json!({"bookName": "Dune", "authorName": "Herbert", "publishedYear": 1965})))
            .await
            .unwrap();
        let foundation = service
            .create(&payload(json!({"bookName": "Foundation", "authorName": "Asimov", "publishedYear": 1951})))
            .await
            .unwrap();
        (dune, foundation)
    }

    #[tokio::test]
    async fn created_book_is_listed_as_active() {
        let service = service();
        let (dune, _) = seed(&service).await;

        let page = service.list(&ListParams::default()).await.unwrap();
        assert!(page.books.contains(&dune));
        assert!(page.books.iter().all(|book| book.status == Status::Active));
        assert_eq!(page.current_page, json!(1));
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn soft_deleted_book_leaves_listing_but_stays_updatable() {
        let service = service();
        let (dune, _) = seed(&service).await;

        service.soft_delete(&dune.id).await.unwrap();
        let page = service.list(&ListParams::default()).await.unwrap();
        assert!(page.books.iter().all(|book| book.id != dune.id));

        let updated = service
            .update(&dune.id, &payload(json!({"price": 9})))
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Deleted);
        assert_eq!(updated.price, Some(9.0));
    }

    #[tokio::test]
    async fn soft_delete_is_idempotent() {
        let service = service();
        let (dune, _) = seed(&service).await;

        let first = service.soft_delete(&dune.id).await.unwrap();
        let second = service.soft_delete(&dune.id).await.unwrap();
        assert_eq!(first.status, Status::Deleted);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let service = service();

        let update = service.update("nope", &payload(json!({"price": 1}))).await;
        assert!(matches!(update, Err(BookError::NotFound)));

        let delete = service.soft_delete("nope").await;
        assert!(matches!(delete, Err(BookError::NotFound)));
    }

    #[tokio::test]
    async fn update_can_reactivate() {
        let service = service();
        let (dune, _) = seed(&service).await;

        service.soft_delete(&dune.id).await.unwrap();
        let restored = service
            .update(&dune.id, &payload(json!({"status": 1})))
            .await
            .unwrap();
        assert_eq!(restored.status, Status::Active);
        assert_eq!(service.list(&search("dune")).await.unwrap().books, vec![restored]);
    }

    #[tokio::test]
    async fn cast_failure_is_a_storage_error() {
        let service = service();
        let result = service.create(&payload(json!({"publishedYear": "soon"}))).await;
        assert!(matches!(result, Err(BookError::Storage(StoreError::Cast(_)))));
    }

    #[tokio::test]
    async fn pagination_reports_total_pages() {
        let service = service();
        for i in 0..7 {
            service
                .create(&payload(json!({"bookName": format!("Book {i}")})))
                .await
                .unwrap();
        }

        let params = |page: &str| ListParams {
            page: Some(page.to_string()),
            limit: Some("3".to_string()),
            search: None,
        };

        let last = service.list(&params("3")).await.unwrap();
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.books.len(), 1);
        assert_eq!(last.current_page, json!("3"));

        let beyond = service.list(&params("9")).await.unwrap();
        assert_eq!(beyond.total_pages, 3);
        assert!(beyond.books.is_empty());

        let decimal = service.list(&params("2.0")).await.unwrap();
        assert_eq!(decimal.books.len(), 3);
        assert_eq!(decimal.current_page, json!("2.0"));
    }

    #[tokio::test]
    async fn search_matches_name_year_or_nothing() {
        let service = service();
        let (dune, _) = seed(&service).await;

        assert_eq!(service.list(&search("dune")).await.unwrap().books, vec![dune.clone()]);
        assert_eq!(service.list(&search("1965")).await.unwrap().books, vec![dune]);
        assert!(service.list(&search("xyz")).await.unwrap().books.is_empty());
    }
}
