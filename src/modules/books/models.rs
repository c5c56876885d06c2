use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Lifecycle flag of a book, stored as `1` (active) or `0` (soft-deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Status {
    #[default]
    Active,
    Deleted,
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => 1,
            Status::Deleted => 0,
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Status::Active),
            0 => Ok(Status::Deleted),
            other => Err(format!("status must be 0 or 1, got {}", other)),
        }
    }
}

/// Book document as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub status: Status,
}

/// Fields of a book that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub status: Status,
}

impl NewBook {
    /// Cast a loosely typed payload. Missing `status` means active.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, CastError> {
        let status = match payload.get(fields::STATUS) {
            Some(value) => cast_status(value)?,
            None => Status::Active,
        };

        Ok(Self {
            book_id: optional(payload, fields::BOOK_ID, cast_string)?.flatten(),
            book_name: optional(payload, fields::BOOK_NAME, cast_string)?.flatten(),
            author_name: optional(payload, fields::AUTHOR_NAME, cast_string)?.flatten(),
            published_year: optional(payload, fields::PUBLISHED_YEAR, cast_integer)?.flatten(),
            price: optional(payload, fields::PRICE, cast_number)?.flatten(),
            status,
        })
    }

    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            book_id: self.book_id,
            book_name: self.book_name,
            author_name: self.author_name,
            published_year: self.published_year,
            price: self.price,
            status: self.status,
        }
    }
}

/// Partial update. The outer `Option` says whether a field was sent, the
/// inner one whether it was sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl BookPatch {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, CastError> {
        Ok(Self {
            book_id: optional(payload, fields::BOOK_ID, cast_string)?,
            book_name: optional(payload, fields::BOOK_NAME, cast_string)?,
            author_name: optional(payload, fields::AUTHOR_NAME, cast_string)?,
            published_year: optional(payload, fields::PUBLISHED_YEAR, cast_integer)?,
            price: optional(payload, fields::PRICE, cast_number)?,
            status: payload.get(fields::STATUS).map(cast_status).transpose()?,
        })
    }

    /// Patch that only flips the book to soft-deleted.
    pub fn soft_delete() -> Self {
        Self {
            status: Some(Status::Deleted),
            ..Self::default()
        }
    }

    pub fn apply(self, book: &mut Book) {
        if let Some(book_id) = self.book_id {
            book.book_id = book_id;
        }
        if let Some(book_name) = self.book_name {
            book.book_name = book_name;
        }
        if let Some(author_name) = self.author_name {
            book.author_name = author_name;
        }
        if let Some(published_year) = self.published_year {
            book.published_year = published_year;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(status) = self.status {
            book.status = status;
        }
    }
}

/// Document field names as stored and exchanged.
pub mod fields {
    pub const BOOK_ID: &str = "bookId";
    pub const BOOK_NAME: &str = "bookName";
    pub const AUTHOR_NAME: &str = "authorName";
    pub const PUBLISHED_YEAR: &str = "publishedYear";
    pub const PRICE: &str = "price";
    pub const STATUS: &str = "status";
}

/// A payload value that does not fit the book schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cast to {expected} failed for value {value} at path \"{path}\"")]
pub struct CastError {
    pub path: &'static str,
    pub expected: &'static str,
    pub value: Value,
}

impl CastError {
    fn new(path: &'static str, expected: &'static str, value: &Value) -> Self {
        Self {
            path,
            expected,
            value: value.clone(),
        }
    }
}

type Cast<T> = fn(&'static str, &Value) -> Result<Option<T>, CastError>;

fn optional<T>(
    payload: &Map<String, Value>,
    path: &'static str,
    cast: Cast<T>,
) -> Result<Option<Option<T>>, CastError> {
    payload.get(path).map(|value| cast(path, value)).transpose()
}

fn cast_string(path: &'static str, value: &Value) -> Result<Option<String>, CastError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(CastError::new(path, "string", value)),
    }
}

fn cast_number(path: &'static str, value: &Value) -> Result<Option<f64>, CastError> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(CastError::new(path, "Number", value)),
    }
}

fn cast_integer(path: &'static str, value: &Value) -> Result<Option<i64>, CastError> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Ok(Some(i));
        }
    }

    match cast_number(path, value) {
        Ok(Some(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(Some(n as i64)),
        Ok(None) => Ok(None),
        _ => Err(CastError::new(path, "Integer", value)),
    }
}

fn cast_status(value: &Value) -> Result<Status, CastError> {
    let fail = || CastError::new(fields::STATUS, "Status", value);

    cast_integer(fields::STATUS, value)
        .map_err(|_| fail())?
        .ok_or_else(fail)
        .and_then(|raw| Status::try_from(raw).map_err(|_| fail()))
}
