use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SiteConfig;

pub const DEFAULT_TEMPLATE: &str = "default.html";

/// Category given to bare Markdown files in the content root.
pub const PAGE_CATEGORY: &str = "page";

/// One content file and everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub title: String,
    pub tags: BTreeSet<String>,
    pub category: String,
    /// Template this page renders with. Set with `template` in the header block.
    pub template_name: String,
    /// Parsed from the file name. Only posts have one.
    pub date_published: Option<DateTime<Utc>>,
    /// Filesystem modification time at discovery.
    pub date_modified: DateTime<Utc>,
    /// Full URL of the page, including the site URL.
    pub permalink: String,
    /// URL path relative to the site URL. Empty or ending in `/`.
    pub url_path: String,
    pub source_path: PathBuf,
}

impl Page {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            title: String::new(),
            tags: BTreeSet::new(),
            category: String::new(),
            template_name: DEFAULT_TEMPLATE.to_string(),
            date_published: None,
            date_modified: DateTime::<Utc>::default(),
            permalink: String::new(),
            url_path: String::new(),
            source_path,
        }
    }

    pub fn is_post(&self) -> bool {
        self.date_published.is_some()
    }

    /// Sources ending in `.html` skip Markdown conversion.
    pub fn is_html(&self) -> bool {
        self.source_path
            .extension()
            .is_some_and(|ext| ext == "html")
    }

    /// Where the rendered page lands below the output root.
    pub fn out_path(&self) -> PathBuf {
        PathBuf::from(&self.url_path).join("index.html")
    }
}

/// The registry of one build: every page, plus the dated ones newest first.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub title: String,
    pub base_url: String,
    pages: Vec<Page>,
    posts: Vec<Page>,
}

impl Site {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            base_url: config.url.clone(),
            pages: Vec::new(),
            posts: Vec::new(),
        }
    }

    /// All pages in discovery order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Dated pages, newest first.
    pub fn posts(&self) -> &[Page] {
        &self.posts
    }

    pub(crate) fn add_page(&mut self, page: Page) {
        if page.is_post() {
            self.posts.push(page.clone());
        }
        self.pages.push(page);
    }

    /// Order posts newest first. Posts sharing a date keep discovery order.
    pub(crate) fn sort_posts(&mut self) {
        self.posts
            .sort_by(|a, b| b.date_published.cmp(&a.date_published));
    }
}
