//! Static HTML rendering of the ordered book collection.

use crate::models::{Book, Highlight};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const STYLE: &str = r#"
    <style>
    body {
        max-width: 1024px;
        margin: auto;
        font-family: Iowan Old Style, Apple Garamond, Baskerville, Times New Roman, Droid Serif, Times, Source Serif Pro, serif, Apple Color Emoji, Segoe UI Emoji, Segoe UI Symbol;
    }

    aside, li {
        line-height: 2;
        font-weight: 600;
        letter-spacing: -0.2px;
    }
    </style>"#;

const COPY_SCRIPT: &str = r#"
    <script>
    function copyToClipboard(copyText) {
        var textArea = document.createElement("textarea");
        textArea.value = copyText;
        document.body.appendChild(textArea);
        textArea.select();
        document.execCommand("Copy");
        textArea.remove();
    }
    </script>"#;

const HEADER: &str = r#"
    <h1>All the Highlights</h1>
    <p>
        <i>
            Highlights exported from
            <a href="https://read.readwise.io" target="_blank">Readwise</a>
            and formatted for easy copy &amp; paste into a notes app.
        </i>
    </p>"#;

/// Renders the whole document. Books are expected in display order.
pub fn render(books: &[Book]) -> String {
    let mut html = String::new();
    html.push_str("<html>\n<head>\n    <meta charset=\"UTF-8\">\n    <title>all-the-highlights</title>");
    html.push_str(STYLE);
    html.push_str("\n</head>\n<body>");
    html.push_str(COPY_SCRIPT);
    html.push_str(HEADER);
    for book in books {
        render_book(&mut html, book);
    }
    html.push_str("\n</body>\n</html>\n");
    html
}

/// `title, author, year` with colons removed, as pasted into a notes app.
pub fn title_line(book: &Book) -> String {
    format!(
        "{}, {}, {}",
        book.title, book.author, book.first_highlight_year
    )
    .replace(':', "")
}

fn render_book(html: &mut String, book: &Book) {
    let index = book.display_index;
    let title = title_line(book);
    let copy_title = js_string(&format!("read/{}", title));
    let copy_source = js_string(&book.source_url);
    let source_attr = encode_double_quoted_attribute(&book.source_url);

    html.push_str(&format!(
        r##"
    <a id="{index}" href="#{index}">#{index}</a>
    <h2 style="cursor:copy;" onclick="copyToClipboard({copy_title})">{title}</h2>
    <span onclick="copyToClipboard({copy_source})" style="cursor:copy;">{source}</span>
    <a href="{source_attr}" target="_blank">&raquo;&raquo;&raquo;</a>
    <ul>"##,
        index = index,
        copy_title = encode_double_quoted_attribute(&copy_title),
        title = encode_text(&title),
        copy_source = encode_double_quoted_attribute(&copy_source),
        source = encode_text(&book.source_url),
        source_attr = source_attr,
    ));
    for highlight in &book.highlights {
        render_highlight(html, highlight);
    }
    html.push_str("\n    </ul>\n    <hr/>");
}

fn render_highlight(html: &mut String, highlight: &Highlight) {
    html.push_str(&format!("\n        <li>{}</li>", encode_text(&highlight.text)));
}

/// Quotes a value as a single-quoted JavaScript string literal.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3C"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Writes the rendered document, creating missing parent directories.
pub fn write_document(path: &Path, html: &str) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, html).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
