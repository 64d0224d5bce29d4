use crate::models::Book;
use chrono::{DateTime, Datelike, Utc};

/// Year reported for a book whose first highlight has no parseable timestamp.
pub const UNKNOWN_YEAR: i32 = 0;

/// Parses an RFC 3339 timestamp. Anything unparseable maps to the earliest instant.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn first_highlight_year(book: &Book) -> i32 {
    book.highlights
        .first()
        .and_then(|h| DateTime::parse_from_rfc3339(h.highlighted_at.trim()).ok())
        .map(|dt| dt.year())
        .unwrap_or(UNKNOWN_YEAR)
}

pub fn last_highlighted_at(book: &Book) -> DateTime<Utc> {
    book.highlights
        .last()
        .map(|h| parse_timestamp(&h.highlighted_at))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Attaches each book's first-highlight year, then orders the collection by the
/// timestamp of its last highlight, oldest first. Equal timestamps keep their
/// input order. Every book must carry at least one highlight.
pub fn derive_order(mut books: Vec<Book>) -> Vec<Book> {
    debug_assert!(books.iter().all(Book::has_highlights));

    for book in books.iter_mut() {
        book.first_highlight_year = first_highlight_year(book);
    }

    // stable
    books.sort_by_cached_key(last_highlighted_at);

    for (index, book) in books.iter_mut().enumerate() {
        book.display_index = index;
    }

    books
}
