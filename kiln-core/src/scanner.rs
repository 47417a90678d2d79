use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::error::{BuildError, PageError};
use crate::filename::parse_filename;
use crate::header::apply_header_block;
use crate::site::{PAGE_CATEGORY, Page, Site};

/// Walks the content directory and assembles the page registry for one build.
pub struct SiteScanner {
    content_dir: PathBuf,
}

impl SiteScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            content_dir: path.as_ref().to_path_buf(),
        }
    }

    /// Register every regular file below the content directory.
    ///
    /// Files that cannot be registered are logged and skipped. Only a failure to
    /// read a directory aborts the scan.
    pub fn scan(&self, config: &SiteConfig) -> Result<Site, BuildError> {
        debug!(dir = %self.content_dir.display(), "scanning content");

        let mut site = Site::new(config);
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.content_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| BuildError::Content {
                path: self.content_dir.clone(),
                source,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            // follows symlinks; fifos, sockets and devices would block or fail on open
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    debug!(path = %entry.path().display(), "skipping non-regular file");
                    continue;
                }
                Err(err) => {
                    warn!(path = %entry.path().display(), "skipping page: {err}");
                    continue;
                }
            }

            let page = match self.scan_page(entry.path(), &config.url) {
                Ok(page) => page,
                Err(err) => {
                    warn!(path = %err.path().display(), "skipping page: {err}");
                    continue;
                }
            };

            if let Some(previous) = seen.insert(page.url_path.clone(), page.source_path.clone()) {
                warn!(
                    url = %page.url_path,
                    first = %previous.display(),
                    second = %page.source_path.display(),
                    "two pages share a URL, the later one overwrites the earlier"
                );
            }

            debug!(path = %page.source_path.display(), url = %page.url_path, "registered page");
            site.add_page(page);
        }

        site.sort_posts();

        info!(
            pages = site.pages().len(),
            posts = site.posts().len(),
            "scanned content"
        );

        Ok(site)
    }

    fn scan_page(&self, path: &Path, base_url: &str) -> Result<Page, PageError> {
        let metadata = std::fs::metadata(path).map_err(|e| PageError::io(path, e))?;
        let modified = metadata.modified().map_err(|e| PageError::io(path, e))?;

        let (url_path, date_published) = parse_filename(path, &self.content_dir);

        let mut page = Page::new(path.to_path_buf());
        page.category = self.category(path);
        page.permalink = format!("{}{}", base_url, url_path);
        page.url_path = url_path;
        page.date_published = date_published;
        page.date_modified = DateTime::<Utc>::from(modified);

        apply_header_block(&mut page)?;

        Ok(page)
    }

    /// First path segment below the content root, or `page` for Markdown files
    /// sitting directly in the root.
    ///
    /// Root-level `.html` files end up with their file name as category.
    fn category(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.content_dir).unwrap_or(path);
        let first = relative
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_default();

        if first.ends_with(".md") {
            PAGE_CATEGORY.to_string()
        } else {
            first
        }
    }
}
