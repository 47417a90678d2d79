//! The `+++` delimited TOML header block at the top of content files.
//!
//! ```text
//! +++
//! title = "Hello"
//! tags = ["rust", "web"]
//! +++
//!
//! Body starts here.
//! ```

use std::io::Read;
use std::path::Path;

use crate::error::PageError;
use crate::schema::{self, Field};
use crate::site::Page;

pub const DELIMITER: &[u8] = b"+++";

/// How much of a file is read when looking for its header block.
const PREFIX_LIMIT: u64 = 1024;

/// Keys a header block may set on a page.
const PAGE_SCHEMA: &[Field<Page>] = &[
    Field::new("title", |p, v| {
        p.title = schema::string("title", v)?;
        Ok(())
    }),
    Field::new("tags", |p, v| {
        p.tags = schema::string_set("tags", v)?;
        Ok(())
    }),
    Field::new("category", |p, v| {
        p.category = schema::string("category", v)?;
        Ok(())
    }),
    Field::new("template", |p, v| {
        p.template_name = schema::string("template", v)?;
        Ok(())
    }),
];

/// Read the header block of the page's source file, if any, and apply it onto the page.
///
/// Files without a header block leave the page untouched.
pub fn apply_header_block(page: &mut Page) -> Result<(), PageError> {
    let path = page.source_path.clone();
    let prefix = read_prefix(&path)?;

    let Some(block) = find_block(&prefix, &path)? else {
        return Ok(());
    };

    let text = std::str::from_utf8(block).map_err(|_| PageError::Encoding { path: path.clone() })?;
    let doc: toml::Table = toml::from_str(text).map_err(|e| PageError::HeaderBlock {
        path: path.clone(),
        message: e.to_string(),
    })?;

    schema::overlay(page, &doc, PAGE_SCHEMA).map_err(|e| PageError::header_field(&path, e))
}

fn read_prefix(path: &Path) -> Result<Vec<u8>, PageError> {
    let file = std::fs::File::open(path).map_err(|e| PageError::io(path, e))?;
    let mut buf = Vec::with_capacity(PREFIX_LIMIT as usize);
    file.take(PREFIX_LIMIT)
        .read_to_end(&mut buf)
        .map_err(|e| PageError::io(path, e))?;
    Ok(buf)
}

/// Locate the bytes between the opening and closing delimiters.
fn find_block<'a>(prefix: &'a [u8], path: &Path) -> Result<Option<&'a [u8]>, PageError> {
    let Some(rest) = prefix.strip_prefix(DELIMITER) else {
        return Ok(None);
    };

    match find(rest, DELIMITER) {
        Some(pos) => Ok(Some(&rest[..pos])),
        None => Err(PageError::MalformedHeaderBlock {
            path: path.to_path_buf(),
        }),
    }
}

/// Everything after the closing delimiter, or the whole input if there is no header block.
pub fn strip_header_block(content: &[u8]) -> &[u8] {
    content
        .strip_prefix(DELIMITER)
        .and_then(|rest| find(rest, DELIMITER).map(|pos| &rest[pos + DELIMITER.len()..]))
        .unwrap_or(content)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn page_from(contents: &str) -> (tempfile::NamedTempFile, Page) {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let page = Page::new(file.path().to_path_buf());
        (file, page)
    }

    #[test]
    fn header_overrides_fields() {
        let (_file, mut page) = page_from(
            "+++\ntitle = \"X\"\ntags = [\"rust\", \"ssg\"]\ncategory = \"notes\"\ntemplate = \"post.html\"\n+++\n\nBody",
        );
        page.category = "blog".into();

        apply_header_block(&mut page).unwrap();

        assert_eq!(page.title, "X");
        assert!(page.tags.contains("rust") && page.tags.contains("ssg"));
        assert_eq!(page.category, "notes");
        assert_eq!(page.template_name, "post.html");
    }

    #[test]
    fn absent_keys_keep_defaults() {
        let (_file, mut page) = page_from("+++\ntitle = \"Only title\"\n+++\nBody");
        page.category = "blog".into();

        apply_header_block(&mut page).unwrap();

        assert_eq!(page.title, "Only title");
        assert_eq!(page.category, "blog");
        assert_eq!(page.template_name, "default.html");
        assert!(page.tags.is_empty());
    }

    #[test]
    fn no_header_is_a_no_op() {
        let (_file, mut page) = page_from("# Just markdown\n\n+++ not a header +++");
        apply_header_block(&mut page).unwrap();
        assert_eq!(page.title, "");
    }

    #[test]
    fn empty_file_is_a_no_op() {
        let (_file, mut page) = page_from("");
        apply_header_block(&mut page).unwrap();
        assert_eq!(page.template_name, "default.html");
    }

    #[test]
    fn unclosed_header_is_malformed() {
        let (file, mut page) = page_from("+++\ntitle = \"never closed\"\n\nBody");
        let err = apply_header_block(&mut page).unwrap_err();
        assert!(matches!(err, PageError::MalformedHeaderBlock { .. }));
        assert_eq!(err.path(), file.path());
    }

    #[test]
    fn closing_delimiter_past_the_prefix_is_malformed() {
        let padding = "a".repeat(2000);
        let (_file, mut page) = page_from(&format!("+++\n# {padding}\n+++\n"));
        assert!(matches!(
            apply_header_block(&mut page),
            Err(PageError::MalformedHeaderBlock { .. })
        ));
    }

    #[test]
    fn wrongly_typed_key_is_rejected() {
        let (_file, mut page) = page_from("+++\ntags = \"rust\"\n+++\n");
        let err = apply_header_block(&mut page).unwrap_err();
        assert!(matches!(err, PageError::HeaderBlock { .. }));
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let (_file, mut page) = page_from("+++\ntitle = \n+++\n");
        assert!(matches!(
            apply_header_block(&mut page),
            Err(PageError::HeaderBlock { .. })
        ));
    }

    #[test]
    fn strip_keeps_body_only() {
        assert_eq!(strip_header_block(b"+++\ntitle = \"a\"\n+++\nbody"), b"\nbody");
        assert_eq!(strip_header_block(b"no header"), b"no header");
        assert_eq!(strip_header_block(b"+++ unclosed"), b"+++ unclosed");
        assert_eq!(strip_header_block(b"++++++"), b"");
    }
}
