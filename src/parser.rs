use crate::models::{nullable, Book, OpaqueToken};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Export page is not a JSON object envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),
    #[error("Book record could not be decoded: {0}")]
    InvalidRecord(#[source] serde_json::Error),
}

/// One page of the export API, with its records still undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPage {
    pub results: Vec<Value>,
    pub next_page_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default, deserialize_with = "nullable")]
    results: Vec<Value>,
    #[serde(default)]
    next_page_cursor: Option<OpaqueToken>,
}

pub fn parse_page(body: &str) -> Result<ExportPage, ParseError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(ParseError::InvalidEnvelope)?;

    Ok(ExportPage {
        results: envelope.results,
        next_page_cursor: envelope.next_page_cursor.and_then(OpaqueToken::into_token),
    })
}

pub fn parse_book(record: Value) -> Result<Book, ParseError> {
    serde_json::from_value(record).map_err(ParseError::InvalidRecord)
}

/// Drops books that carry no highlights.
pub fn retain_with_highlights(books: Vec<Book>) -> Vec<Book> {
    books.into_iter().filter(Book::has_highlights).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_PAGE: &str = r#"
{
    "count": 2,
    "nextPageCursor": "cursor-2",
    "results": [
        {
            "user_book_id": 11,
            "title": "Test Book",
            "author": "Test Author",
            "readable_title": "Test Book",
            "source": "kindle",
            "category": "books",
            "book_tags": [{"id": 3, "name": "fiction"}],
            "asin": null,
            "unexpected_field": {"nested": true},
            "highlights": [
                {
                    "id": 101,
                    "text": "This is a highlighted text",
                    "location": 42,
                    "location_type": "location",
                    "highlighted_at": "2021-01-01T00:00:00Z",
                    "book_id": 11,
                    "tags": ["quote"],
                    "is_favorite": true
                }
            ]
        },
        {
            "user_book_id": 12,
            "title": "Empty Book",
            "highlights": []
        }
    ]
}
"#;

    #[test]
    fn test_parse_page_keeps_records_and_cursor() {
        let page = parse_page(SAMPLE_PAGE).unwrap();

        assert_eq!(page.results.len(), 2);
        assert_eq!(page.next_page_cursor, Some("cursor-2".to_string()));
    }

    #[test]
    fn test_parse_page_numeric_cursor() {
        let page = parse_page(r#"{"results": [], "nextPageCursor": 98765}"#).unwrap();

        assert_eq!(page.next_page_cursor, Some("98765".to_string()));
    }

    #[test]
    fn test_parse_page_missing_fields() {
        let page = parse_page("{}").unwrap();

        assert!(page.results.is_empty());
        assert_eq!(page.next_page_cursor, None);
    }

    #[test]
    fn test_parse_page_null_fields() {
        let page = parse_page(r#"{"results": null, "nextPageCursor": null}"#).unwrap();

        assert!(page.results.is_empty());
        assert_eq!(page.next_page_cursor, None);
    }

    #[test]
    fn test_parse_page_empty_cursor_ends_pagination() {
        let page = parse_page(r#"{"results": [], "nextPageCursor": ""}"#).unwrap();

        assert_eq!(page.next_page_cursor, None);
    }

    #[test]
    fn test_parse_page_rejects_non_json() {
        let result = parse_page("<html>Bad Gateway</html>");

        assert!(matches!(result, Err(ParseError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_parse_page_rejects_non_object() {
        let result = parse_page("[1, 2, 3]");

        assert!(matches!(result, Err(ParseError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_parse_book_valid_record() {
        let page = parse_page(SAMPLE_PAGE).unwrap();
        let book = parse_book(page.results[0].clone()).unwrap();

        assert_eq!(book.user_book_id, 11);
        assert_eq!(book.title, "Test Book");
        assert_eq!(book.author, "Test Author");
        assert_eq!(book.asin, "");
        assert!(book.book_tags.contains("fiction"));
        assert_eq!(book.highlights.len(), 1);

        let h = &book.highlights[0];
        assert_eq!(h.id, 101);
        assert_eq!(h.location, 42);
        assert_eq!(h.text, "This is a highlighted text");
        assert_eq!(h.highlighted_at, "2021-01-01T00:00:00Z");
        assert!(h.tags.contains("quote"));
        assert!(h.is_favorite);
        assert!(!h.is_discard);
    }

    #[test]
    fn test_parse_book_preserves_malformed_timestamp() {
        let book = parse_book(json!({
            "title": "Odd Dates",
            "highlights": [{"text": "x", "highlighted_at": "last tuesday"}]
        }))
        .unwrap();

        assert_eq!(book.highlights[0].highlighted_at, "last tuesday");
    }

    #[test]
    fn test_parse_book_rejects_wrong_shape() {
        let result = parse_book(json!({ "title": "Broken", "highlights": "not a list" }));

        assert!(matches!(result, Err(ParseError::InvalidRecord(_))));
    }

    #[test]
    fn test_parse_book_rejects_highlight_without_text() {
        let result = parse_book(json!({ "highlights": [{ "id": 1 }] }));

        assert!(matches!(result, Err(ParseError::InvalidRecord(_))));
    }

    #[test]
    fn test_retain_with_highlights_drops_empty_books() {
        let page = parse_page(SAMPLE_PAGE).unwrap();
        let books: Vec<Book> = page
            .results
            .into_iter()
            .map(|r| parse_book(r).unwrap())
            .collect();

        let kept = retain_with_highlights(books);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Test Book");
    }

    #[test]
    fn test_retain_with_highlights_is_idempotent() {
        let page = parse_page(SAMPLE_PAGE).unwrap();
        let books: Vec<Book> = page
            .results
            .into_iter()
            .map(|r| parse_book(r).unwrap())
            .collect();

        let once = retain_with_highlights(books);
        let twice = retain_with_highlights(once.clone());

        assert_eq!(once, twice);
    }
}
