//! URL and publish date derivation from content file paths.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

/// Length of the `YYYY-MM-DD-` prefix that marks a dated file.
const DATE_PREFIX_LEN: usize = 11;

/// Resolve the site-relative URL path and optional publish date of a content file.
///
/// `content/blog/2023-05-01-hello.md` becomes `("blog/hello/", Some(2023-05-01))`,
/// `content/about.md` becomes `("about/", None)` and `content/index.md` becomes
/// `("", None)`.
pub fn parse_filename(path: &Path, content_root: &Path) -> (String, Option<DateTime<Utc>>) {
    let path = to_slash(path);
    let root = to_slash(content_root);
    let root = root.trim_end_matches('/');

    let mut path = path.as_str();
    if !root.is_empty() {
        if let Some(rest) = path
            .strip_prefix(root)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        {
            path = rest.trim_start_matches('/');
        }
    }
    let path = path.strip_suffix(".md").unwrap_or(path);
    let path = path.strip_suffix(".html").unwrap_or(path);
    let path = strip_index(path);

    let (dir, filename) = split_last_segment(path.trim_end_matches('/'));
    if let Some(date) = parse_date_prefix(filename) {
        let url = format!("{}{}/", dir, &filename[DATE_PREFIX_LEN..]);
        return (url, Some(date));
    }

    let mut url = path.to_string();
    if !url.is_empty() && !url.ends_with('/') {
        url.push('/');
    }
    (url, None)
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Drop a final `index` segment, keeping the slash in front of it.
fn strip_index(path: &str) -> &str {
    if path == "index" {
        ""
    } else if let Some(parent) = path.strip_suffix("/index") {
        &path[..parent.len() + 1]
    } else {
        path
    }
}

/// Split `a/b/c` into `("a/b/", "c")`.
fn split_last_segment(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos + 1], &path[pos + 1..]),
        None => ("", path),
    }
}

fn parse_date_prefix(filename: &str) -> Option<DateTime<Utc>> {
    let bytes = filename.as_bytes();
    if bytes.len() <= DATE_PREFIX_LEN || bytes[4] != b'-' || bytes[7] != b'-' || bytes[10] != b'-' {
        return None;
    }

    let date = NaiveDate::parse_from_str(filename.get(..10)?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
