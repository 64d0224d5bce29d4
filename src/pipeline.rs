use crate::chronology::derive_order;
use crate::config::{CliArgs, Config, ConfigError};
use crate::fetch::{FetchError, Fetcher, HttpPageSource, PageSource};
use crate::models::Book;
use crate::parser::retain_with_highlights;
use crate::render::{render, write_document, OutputError};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub rendered: usize,
    pub output_path: PathBuf,
}

/// Full export, highlight-less books dropped, ordered for rendering.
pub fn collect_books<S: PageSource>(fetcher: &Fetcher<S>) -> Result<(usize, Vec<Book>), FetchError> {
    let books = fetcher.fetch_all(None)?;
    let fetched = books.len();
    let books = derive_order(retain_with_highlights(books));
    Ok((fetched, books))
}

/// Fetches, orders and renders everything from `source` into `output_path`.
/// Nothing is written unless every page was fetched and decoded.
pub fn export<S: PageSource>(source: S, output_path: &Path) -> Result<RunSummary, PipelineError> {
    let fetcher = Fetcher::new(source);
    let (fetched, books) = collect_books(&fetcher)?;
    tracing::info!(
        fetched,
        with_highlights = books.len(),
        "export complete"
    );

    let html = render(&books);
    write_document(output_path, &html)?;

    Ok(RunSummary {
        fetched,
        rendered: books.len(),
        output_path: output_path.to_path_buf(),
    })
}

pub fn run(cli: CliArgs) -> Result<RunSummary, PipelineError> {
    let config = Config::load(cli)?;
    tracing::debug!(?config, "configuration resolved");

    let source = HttpPageSource::new(&config.token, &config.base_url)?;
    export(source, &config.output_path)
}
