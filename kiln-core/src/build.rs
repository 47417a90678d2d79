//! Runs one complete build of a site.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::assets::copy_dir;
use crate::config::SiteConfig;
use crate::error::{BuildError, report};
use crate::feed::write_feed;
use crate::render::Renderer;
use crate::scanner::SiteScanner;
use crate::sitemap::write_sitemap;
use crate::template::TemplateSet;

pub const CONTENT_DIR: &str = "content";
pub const TEMPLATES_DIR: &str = "templates";
pub const PUBLIC_DIR: &str = "public";
pub const OUTPUT_DIR: &str = "build";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Where a build reads from and how it treats the output directory.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root: PathBuf,
    /// Config file, relative to `root`.
    pub config_file: PathBuf,
    /// Remove the output directory before writing.
    pub clean: bool,
}

impl BuildOptions {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            clean: false,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = path.as_ref().to_path_buf();
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(CONTENT_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(PUBLIC_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }
}

/// What a finished build did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub posts: usize,
    pub rendered: usize,
    pub failed: usize,
    pub sitemap_written: bool,
    pub feed_written: bool,
    pub static_files: usize,
    pub elapsed: Duration,
}

/// State loaded fresh for every build.
pub struct BuildContext<'a> {
    options: &'a BuildOptions,
    templates: TemplateSet,
    config: SiteConfig,
    /// Build clock. Exposed to templates as `now` and used for the feed's build date.
    now: DateTime<Utc>,
}

impl<'a> BuildContext<'a> {
    /// Load the templates and the site configuration.
    pub fn load(options: &'a BuildOptions, now: DateTime<Utc>) -> Result<Self, BuildError> {
        let templates = TemplateSet::load(&options.templates_dir())?;
        debug!(templates = templates.len(), "loaded templates");

        let config_path = options.config_path();
        let config = SiteConfig::read(&config_path).map_err(|source| BuildError::Config {
            path: config_path,
            source,
        })?;

        Ok(Self {
            options,
            templates,
            config,
            now,
        })
    }

    pub fn run(self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let output_dir = self.options.output_dir();

        self.prepare_output(&output_dir)?;

        let site = SiteScanner::new(self.options.content_dir()).scan(&self.config)?;

        let rendered = Renderer::new(&site, &self.templates, &output_dir, self.now).render_all();

        let sitemap_written = match write_sitemap(&site, &output_dir) {
            Ok(()) => true,
            Err(err) => {
                warn!("error creating sitemap: {}", report(&err));
                false
            }
        };

        let feed_written = match write_feed(&site, &output_dir, self.now) {
            Ok(()) => true,
            Err(err) => {
                warn!("error creating feed: {}", report(&err));
                false
            }
        };

        let static_files = self.copy_public(&output_dir)?;

        let summary = BuildReport {
            pages: site.pages().len(),
            posts: site.posts().len(),
            rendered: rendered.rendered,
            failed: rendered.failed.len(),
            sitemap_written,
            feed_written,
            static_files,
            elapsed: started.elapsed(),
        };

        info!(
            pages = summary.pages,
            posts = summary.posts,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "built site"
        );

        Ok(summary)
    }

    fn prepare_output(&self, output_dir: &Path) -> Result<(), BuildError> {
        let fail = |source| BuildError::Output {
            path: output_dir.to_path_buf(),
            source,
        };

        if self.options.clean && output_dir.exists() {
            debug!(dir = %output_dir.display(), "cleaning output directory");
            std::fs::remove_dir_all(output_dir).map_err(fail)?;
        }
        std::fs::create_dir_all(output_dir).map_err(fail)
    }

    fn copy_public(&self, output_dir: &Path) -> Result<usize, BuildError> {
        let public_dir = self.options.public_dir();
        if !public_dir.is_dir() {
            info!(dir = %public_dir.display(), "no static files directory, skipping");
            return Ok(0);
        }

        let copied = copy_dir(&public_dir, output_dir).map_err(|source| BuildError::Assets {
            path: public_dir.clone(),
            source,
        })?;
        debug!(files = copied, "copied static files");
        Ok(copied)
    }
}

/// Build the site described by `options`.
///
/// Templates and configuration are read again on every call.
pub fn build_site(options: &BuildOptions, now: DateTime<Utc>) -> Result<BuildReport, BuildError> {
    BuildContext::load(options, now)?.run()
}
