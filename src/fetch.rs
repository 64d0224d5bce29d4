//! Walks the paginated export API until the cursor runs out.

use crate::models::Book;
use crate::parser::{parse_book, parse_page, ParseError};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

pub const DEFAULT_EXPORT_URL: &str = "https://readwise.io/api/v2/export/";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Export API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Export API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Token cannot be sent as an HTTP header")]
    InvalidToken,
    #[error("Page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: ParseError,
    },
    #[error("Page {page}, record {index}: {source}")]
    Record {
        page: usize,
        index: usize,
        #[source]
        source: ParseError,
    },
}

/// Query parameters for a single export request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub page_cursor: Option<String>,
    pub updated_after: Option<String>,
}

impl PageQuery {
    /// Only the parameters that are set, in the order the API documents them.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(cursor) = &self.page_cursor {
            params.push(("pageCursor", cursor.as_str()));
        }
        if let Some(updated_after) = &self.updated_after {
            params.push(("updatedAfter", updated_after.as_str()));
        }
        params
    }
}

/// Something that can return the raw body of one export page.
pub trait PageSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<String, FetchError>;
}

/// Blocking HTTP transport for the export endpoint.
pub struct HttpPageSource {
    client: Client,
    endpoint: String,
}

impl HttpPageSource {
    pub fn new(token: &str, endpoint: &str) -> Result<Self, FetchError> {
        let auth = format!("Token {}", token.trim());
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| FetchError::InvalidToken)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<String, FetchError> {
        let params = query.params();
        tracing::debug!(endpoint = %self.endpoint, ?params, "making export api request");

        let response = self.client.get(&self.endpoint).query(&params).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text()?)
    }
}

pub struct Fetcher<S> {
    source: S,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Collects every book across all pages. Any failing page or record aborts
    /// the whole export and nothing collected so far is returned.
    pub fn fetch_all(&self, updated_after: Option<&str>) -> Result<Vec<Book>, FetchError> {
        let mut books = Vec::new();
        let mut query = PageQuery {
            page_cursor: None,
            updated_after: updated_after.map(str::to_string),
        };
        let mut page_number = 0;

        loop {
            page_number += 1;
            let body = self.source.fetch_page(&query)?;
            let page = parse_page(&body).map_err(|source| FetchError::Page {
                page: page_number,
                source,
            })?;

            tracing::info!(
                page = page_number,
                results = page.results.len(),
                more = page.next_page_cursor.is_some(),
                "fetched export page"
            );

            books.reserve(page.results.len());
            for (index, record) in page.results.into_iter().enumerate() {
                let book = parse_book(record).map_err(|source| FetchError::Record {
                    page: page_number,
                    index,
                    source,
                })?;
                books.push(book);
            }

            match page.next_page_cursor {
                Some(cursor) => query.page_cursor = Some(cursor),
                None => break,
            }
        }

        Ok(books)
    }
}
