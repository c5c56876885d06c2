use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use shelf_db::SurrealClient;
use uuid::Uuid;

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookPatch, NewBook, Status};
use crate::modules::books::query::{BookFilter, Window};

const TABLE: &str = "book";

/// Columns read back for every book; the record key is exposed as `key`.
const PROJECTION: &str =
    "record::id(id) AS key, bookId, bookName, authorName, publishedYear, price, status";

/// SurrealDB-backed store. Record keys are time-ordered UUIDs, so table order
/// is creation order.
pub struct SurrealBookStore {
    client: Arc<SurrealClient>,
}

impl SurrealBookStore {
    pub fn new(client: Arc<SurrealClient>) -> Self {
        Self { client }
    }

    async fn select_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let mut response = self
            .client
            .query(format!("SELECT {PROJECTION} FROM type::thing($table, $id)"))
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;

        let rows: Vec<BookRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(Book::from))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRow {
    key: String,
    #[serde(default)]
    book_id: Option<String>,
    #[serde(default)]
    book_name: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    published_year: Option<i64>,
    #[serde(default)]
    price: Option<f64>,
    status: Status,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.key,
            book_id: row.book_id,
            book_name: row.book_name,
            author_name: row.author_name,
            published_year: row.published_year,
            price: row.price,
            status: row.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

/// `WHERE` clause for a filter. Binds `$needle` and, when present, `$year`.
fn where_clause(filter: &BookFilter) -> String {
    let mut clause = format!("status = {}", i64::from(Status::Active));

    if let Some(term) = &filter.search {
        clause.push_str(
            " AND (string::contains(string::lowercase(bookName ?? ''), $needle) \
             OR string::contains(string::lowercase(authorName ?? ''), $needle)",
        );
        if term.year.is_some() {
            clause.push_str(" OR publishedYear = $year");
        }
        clause.push(')');
    }

    clause
}

#[async_trait]
impl BookStore for SurrealBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = Uuid::now_v7().to_string();

        let mut response = self
            .client
            .query(format!(
                "CREATE type::thing($table, $id) CONTENT $data RETURN {PROJECTION}"
            ))
            .bind(("table", TABLE))
            .bind(("id", id.clone()))
            .bind(("data", book))
            .await?
            .check()?;

        let rows: Vec<BookRow> = response.take(0)?;
        rows.into_iter()
            .next()
            .map(Book::from)
            .ok_or(StoreError::Unreadable(id))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        self.select_by_id(id).await
    }

    async fn update(&self, id: &str, patch: BookPatch) -> Result<Option<Book>, StoreError> {
        // UPDATE on a record id never creates it; a missing book returns no row.
        let mut response = self
            .client
            .query(format!(
                "UPDATE type::thing($table, $id) MERGE $data RETURN {PROJECTION}"
            ))
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .bind(("data", patch))
            .await?
            .check()?;

        let rows: Vec<BookRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(Book::from))
    }

    async fn find_many(&self, filter: &BookFilter, window: Window) -> Result<Vec<Book>, StoreError> {
        let sql = format!(
            "SELECT {PROJECTION} FROM {TABLE} WHERE {} LIMIT $limit START $start",
            where_clause(filter)
        );

        let mut query = self
            .client
            .query(sql)
            .bind(("limit", window.take))
            .bind(("start", window.start));
        if let Some(term) = &filter.search {
            query = query.bind(("needle", term.needle.clone()));
            if let Some(year) = term.year {
                query = query.bind(("year", year));
            }
        }

        let mut response = query.await?.check()?;
        let rows: Vec<BookRow> = response.take(0)?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn count(&self, filter: &BookFilter) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT count() FROM {TABLE} WHERE {} GROUP ALL",
            where_clause(filter)
        );

        let mut query = self.client.query(sql);
        if let Some(term) = &filter.search {
            query = query.bind(("needle", term.needle.clone()));
            if let Some(year) = term.year {
                query = query.bind(("year", year));
            }
        }

        let mut response = query.await?.check()?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map_or(0, |row| row.count))
    }
}
