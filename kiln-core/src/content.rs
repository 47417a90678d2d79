//! Turns a page's source file into its HTML body.

use crate::error::PageError;
use crate::header::strip_header_block;
use crate::markdown;
use crate::site::Page;

/// Read the page's source and return its body as HTML.
///
/// The header block is dropped. `.html` sources are returned as they are,
/// everything else goes through the Markdown converter.
pub fn render_content(page: &Page) -> Result<String, PageError> {
    let path = &page.source_path;
    let bytes = std::fs::read(path).map_err(|e| PageError::io(path, e))?;

    let body = strip_header_block(&bytes);
    let body = std::str::from_utf8(body).map_err(|_| PageError::Encoding { path: path.clone() })?;

    if page.is_html() {
        return Ok(body.to_string());
    }

    Ok(markdown::to_html(body))
}
