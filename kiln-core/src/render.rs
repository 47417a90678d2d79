//! Renders every page of a site to disk in parallel.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tera::Context;
use tracing::{debug, info, warn};

use crate::content::render_content;
use crate::error::{PageError, report};
use crate::site::{Page, Site};
use crate::template::TemplateSet;

#[derive(Debug, Serialize)]
struct SiteInfo<'a> {
    title: &'a str,
    url: &'a str,
}

/// Least number of pages handled by one template context during `render_all`.
const PAGES_PER_CONTEXT: usize = 8;

/// Outcome of rendering every page.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub rendered: usize,
    pub failed: Vec<PageError>,
    /// Template contexts built from the shared base.
    pub contexts: usize,
}

/// Renders pages from a finished registry into an output directory.
pub struct Renderer<'a> {
    site: &'a Site,
    templates: &'a TemplateSet,
    output_dir: &'a Path,
    /// Shared part of every page's template context.
    base: Context,
}

impl<'a> Renderer<'a> {
    pub fn new(site: &'a Site, templates: &'a TemplateSet, output_dir: &'a Path, now: DateTime<Utc>) -> Self {
        let mut base = Context::new();
        base.insert(
            "site",
            &SiteInfo {
                title: &site.title,
                url: &site.base_url,
            },
        );
        base.insert("posts", site.posts());
        base.insert("pages", site.pages());
        base.insert("now", &now);

        Self {
            site,
            templates,
            output_dir,
            base,
        }
    }

    /// Render every page. Returns once all pages are done.
    ///
    /// A failing page is logged and recorded in the report; the others still render.
    ///
    /// The base context holds every page and post, so it is cloned once per
    /// rayon job rather than once per page. Each page then overwrites its own
    /// keys in that copy.
    pub fn render_all(&self) -> RenderReport {
        let contexts = AtomicUsize::new(0);
        let results: Vec<Result<PathBuf, PageError>> = self
            .site
            .pages()
            .par_iter()
            .with_min_len(PAGES_PER_CONTEXT)
            .map_init(
                || {
                    contexts.fetch_add(1, Ordering::Relaxed);
                    self.base.clone()
                },
                |context, page| self.render_with(context, page),
            )
            .collect();

        let mut outcome = RenderReport {
            contexts: contexts.into_inner(),
            ..RenderReport::default()
        };
        for result in results {
            match result {
                Ok(dest) => {
                    debug!(dest = %dest.display(), "wrote page");
                    outcome.rendered += 1;
                }
                Err(err) => {
                    warn!(path = %err.path().display(), "error processing page: {}", report(&err));
                    outcome.failed.push(err);
                }
            }
        }

        info!(
            rendered = outcome.rendered,
            failed = outcome.failed.len(),
            contexts = outcome.contexts,
            "rendered pages"
        );

        outcome
    }

    pub fn render_page(&self, page: &Page) -> Result<PathBuf, PageError> {
        self.render_with(&mut self.base.clone(), page)
    }

    /// Render `page` using `context`, which already holds the shared keys.
    fn render_with(&self, context: &mut Context, page: &Page) -> Result<PathBuf, PageError> {
        if !self.templates.contains(&page.template_name) {
            return Err(PageError::UnknownTemplate {
                path: page.source_path.clone(),
                name: page.template_name.clone(),
            });
        }

        let content = render_content(page)?;

        context.insert("page", page);
        context.insert("title", &page.title);
        context.insert("category", &page.category);
        context.insert("content", &content);

        let html = self
            .templates
            .render(&page.template_name, context)
            .map_err(|source| PageError::Template {
                path: page.source_path.clone(),
                source,
            })?;

        let dest = self.output_dir.join(page.out_path());
        write_atomic(&dest, html.as_bytes()).map_err(|source| PageError::Write {
            path: page.source_path.clone(),
            dest: dest.clone(),
            source,
        })?;

        Ok(dest)
    }
}

/// Write `contents` to `dest` through a temporary file in the same directory.
///
/// Concurrent writers to the same destination each replace the file whole.
pub(crate) fn write_atomic(dest: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;

    // temp files are created 0600; output has to be readable by the web server
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::scanner::SiteScanner;
    use std::fs;

    const LAYOUT: &str = "<title>{{ title }}</title>{{ content | safe }}|{{ site.title }}|{{ posts | length }}/{{ pages | length }}";

    fn fixture() -> (tempfile::TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("blog")).unwrap();
        fs::write(content.join("about.md"), "+++\ntitle = \"About\"\n+++\n*hi*").unwrap();
        fs::write(content.join("raw.html"), "+++\ntitle = \"Raw\"\n+++<b>**raw**</b>").unwrap();
        fs::write(content.join("blog/2023-05-01-hello.md"), "+++\ntitle = \"Hello\"\n+++\nHello").unwrap();
        fs::write(
            content.join("blog/2023-06-01-other.md"),
            "+++\ntemplate = \"missing.html\"\n+++\n",
        )
        .unwrap();

        let config = SiteConfig {
            title: "My Site".into(),
            url: "https://example.com/".into(),
        };
        let site = SiteScanner::new(&content).scan(&config).unwrap();
        (dir, site)
    }

    #[test]
    fn renders_pages_and_reports_failures() {
        let (dir, site) = fixture();
        let templates = TemplateSet::from_sources([("default.html", LAYOUT)]).unwrap();
        let out = dir.path().join("build");

        let report = Renderer::new(&site, &templates, &out, Utc::now()).render_all();

        assert_eq!(report.rendered, 3);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            &report.failed[0],
            PageError::UnknownTemplate { name, .. } if name == "missing.html"
        ));

        let about = fs::read_to_string(out.join("about/index.html")).unwrap();
        assert!(about.starts_with("<title>About</title>"));
        assert!(about.contains("<em>hi</em>"));
        assert!(about.ends_with("|My Site|2/4"));

        let raw = fs::read_to_string(out.join("raw/index.html")).unwrap();
        assert!(raw.contains("<b>**raw**</b>"));

        assert!(out.join("blog/hello/index.html").exists());
        assert!(!out.join("blog/other/index.html").exists());
    }

    #[test]
    fn template_errors_are_per_page() {
        let (dir, site) = fixture();
        let templates = TemplateSet::from_sources([("default.html", "{{ page.nope.deeper }}")]).unwrap();
        let out = dir.path().join("build");

        let report = Renderer::new(&site, &templates, &out, Utc::now()).render_all();

        assert_eq!(report.rendered, 0);
        assert_eq!(report.failed.len(), 4);
        assert!(
            report
                .failed
                .iter()
                .filter(|e| matches!(e, PageError::Template { .. }))
                .count()
                == 3
        );
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b/index.html");
        write_atomic(&dest, b"first").unwrap();
        write_atomic(&dest, b"second").unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "second");
        assert_eq!(fs::read_dir(dest.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("index.html");
        write_atomic(&dest, b"page").unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn shared_context_is_not_copied_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("blog")).unwrap();
        for day in 0..400 {
            let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(day);
            fs::write(
                content.join(format!("blog/{}-post-{day}.md", date.format("%Y-%m-%d"))),
                format!("+++\ntitle = \"Post {day}\"\n+++\nbody {day}"),
            )
            .unwrap();
        }
        let config = SiteConfig {
            title: "Big".into(),
            url: "https://example.com/".into(),
        };
        let site = SiteScanner::new(&content).scan(&config).unwrap();
        let templates =
            TemplateSet::from_sources([("default.html", "{{ title }}|{{ content | safe }}|{{ posts | length }}")])
                .unwrap();
        let out = dir.path().join("build");

        let report = Renderer::new(&site, &templates, &out, Utc::now()).render_all();

        assert_eq!(report.rendered, 400);
        assert!(report.failed.is_empty());
        assert!(report.contexts >= 1);
        assert!(
            report.contexts <= 400 / PAGES_PER_CONTEXT,
            "{} contexts for 400 pages",
            report.contexts
        );

        // keys from one page never leak into the next
        for day in [0, 199, 399] {
            let html = fs::read_to_string(out.join(format!("blog/post-{day}/index.html"))).unwrap();
            assert!(html.starts_with(&format!("Post {day}|")));
            assert!(html.contains(&format!("<p>body {day}</p>")));
            assert!(html.ends_with("|400"));
        }
    }
}
