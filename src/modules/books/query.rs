//! Search filter and paging for book listings.

use super::models::{Book, Status};

/// Filter applied to list and count queries.
///
/// Only active books are eligible. With a search term, a book matches when its
/// name or author contains the term (case-insensitive, literal substring) or
/// its published year equals the term read as an integer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub search: Option<SearchTerm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchTerm {
    /// Lowercased search text
    pub needle: String,
    /// Year clause; absent when the text has no usable leading integer
    pub year: Option<i64>,
}

impl BookFilter {
    /// Build a filter from the raw `search` query value. Empty means "all".
    pub fn from_search(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        Self {
            search: Some(SearchTerm {
                needle: raw.to_lowercase(),
                year: parse_leading_int(raw).filter(|year| *year != 0),
            }),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        if book.status != Status::Active {
            return false;
        }

        match &self.search {
            None => true,
            Some(term) => term.matches(book),
        }
    }
}

impl SearchTerm {
    fn matches(&self, book: &Book) -> bool {
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&self.needle))
        };

        contains(&book.book_name)
            || contains(&book.author_name)
            || (self.year.is_some() && book.published_year == self.year)
    }
}

/// One page of a listing: skip `(page - 1) * limit`, take `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Read raw `page` / `limit` query values.
    ///
    /// Values are read as numbers and truncated toward zero, so `"2.0"` is
    /// page 2. Values that are not numbers fall back to page 1 and
    /// `default_limit`. Pages below 1 read as page 1; limits below 1 read as
    /// `default_limit`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        let page = page.and_then(parse_number).unwrap_or(1);
        let limit = limit
            .and_then(parse_number)
            .unwrap_or(default_limit.max(1));

        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, matching: u64) -> u64 {
        matching.div_ceil(self.limit)
    }

    /// Rows to read for this page out of `matching` results, or `None` when
    /// the page starts past the last one. Both bounds stay below `matching`.
    pub fn window(&self, matching: u64) -> Option<Window> {
        let start = self.offset();
        if start >= matching {
            return None;
        }

        Some(Window {
            start,
            take: self.limit.min(matching - start),
        })
    }
}

/// Concrete slice of the filtered result set handed to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub take: u64,
}

/// Read a query value the way a loosely typed client means it: a decimal
/// number, truncated. Values below 1, non-finite or out of range do not parse.
fn parse_number(raw: &str) -> Option<u64> {
    let value = raw.trim().parse::<f64>().ok()?.trunc();
    if !value.is_finite() || value < 1.0 || value >= u64::MAX as f64 {
        return None;
    }
    Some(value as u64)
}

/// Read the integer at the start of `raw`: leading whitespace, an optional
/// sign, then digits. Anything after the digits is ignored.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value = rest[..digits_end].parse::<i64>().ok()?;

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::NewBook;

    fn book(name: &str, author: &str, year: i64) -> Book {
        NewBook {
            book_name: Some(name.to_string()),
            author_name: Some(author.to_string()),
            published_year: Some(year),
            ..NewBook::default()
        }
        .into_book(format!("{name}-id"))
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(parse_leading_int("1965"), Some(1965));
        assert_eq!(parse_leading_int("  1965 edition"), Some(1965));
        assert_eq!(parse_leading_int("-12"), Some(-12));
        assert_eq!(parse_leading_int("+7x"), Some(7));
        assert_eq!(parse_leading_int("12.9"), Some(12));
        assert_eq!(parse_leading_int("dune"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn empty_search_matches_every_active_book() {
        let filter = BookFilter::from_search("");
        assert!(filter.search.is_none());
        assert!(filter.matches(&book("Dune", "Herbert", 1965)));

        let mut deleted = book("Dune", "Herbert", 1965);
        deleted.status = Status::Deleted;
        assert!(!filter.matches(&deleted));
    }

    #[test]
    fn search_is_case_insensitive_on_name_and_author() {
        let dune = book("Dune", "Herbert", 1965);
        let foundation = book("Foundation", "Asimov", 1951);

        let filter = BookFilter::from_search("dune");
        assert!(filter.matches(&dune));
        assert!(!filter.matches(&foundation));

        let filter = BookFilter::from_search("ASIM");
        assert!(filter.matches(&foundation));
        assert!(!filter.matches(&dune));
    }

    #[test]
    fn numeric_search_matches_published_year() {
        let dune = book("Dune", "Herbert", 1965);
        let foundation = book("Foundation", "Asimov", 1951);

        let filter = BookFilter::from_search("1965");
        assert!(filter.matches(&dune));
        assert!(!filter.matches(&foundation));
    }

    #[test]
    fn non_numeric_search_has_no_year_clause() {
        let filter = BookFilter::from_search("xyz");
        assert_eq!(filter.search.as_ref().unwrap().year, None);
        assert!(!filter.matches(&book("Dune", "Herbert", 1965)));
    }

    #[test]
    fn zero_never_matches_by_year() {
        let filter = BookFilter::from_search("0");
        assert_eq!(filter.search.as_ref().unwrap().year, None);
        assert!(!filter.matches(&book("Dune", "Herbert", 0)));
    }

    #[test]
    fn search_text_is_literal() {
        let filter = BookFilter::from_search("d.ne");
        assert!(!filter.matches(&book("Dune", "Herbert", 1965)));
        assert!(filter.matches(&book("d.ne", "Herbert", 1965)));
    }

    #[test]
    fn page_request_defaults_and_clamping() {
        assert_eq!(
            PageRequest::from_raw(None, None, 10),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("3"), Some("5"), 10),
            PageRequest { page: 3, limit: 5 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("-2"), Some("0"), 10),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("abc"), Some("x"), 25),
            PageRequest { page: 1, limit: 25 }
        );
    }

    #[test]
    fn page_values_are_read_as_numbers() {
        assert_eq!(
            PageRequest::from_raw(Some("2.0"), Some(" 5 "), 10),
            PageRequest { page: 2, limit: 5 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("2.9"), Some("1e1"), 25),
            PageRequest { page: 2, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("NaN"), Some("inf"), 10),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("0.5"), None, 10),
            PageRequest { page: 1, limit: 10 }
        );
    }

    #[test]
    fn window_stays_inside_the_result_set() {
        let page = PageRequest { page: 2, limit: 5 };
        assert_eq!(page.window(12), Some(Window { start: 5, take: 5 }));
        assert_eq!(page.window(7), Some(Window { start: 5, take: 2 }));
        assert_eq!(page.window(5), None);

        let huge_limit = PageRequest::from_raw(None, Some("5000000000"), 10);
        assert_eq!(huge_limit.window(3), Some(Window { start: 0, take: 3 }));

        let huge_page = PageRequest::from_raw(Some("9223372036854775807"), None, 10);
        assert_eq!(huge_page.window(3), None);
        assert_eq!(huge_page.total_pages(3), 1);
    }

    #[test]
    fn offset_and_total_pages() {
        let page = PageRequest { page: 3, limit: 4 };
        assert_eq!(page.offset(), 8);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(8), 2);
        assert_eq!(page.total_pages(9), 3);
    }
}
