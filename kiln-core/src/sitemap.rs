//! `sitemap.xml` for search engines, plus the stylesheet that makes it readable in a browser.

use std::path::Path;

use chrono::SecondsFormat;
use tracing::debug;

use crate::error::ManifestError;
use crate::render::write_atomic;
use crate::site::Site;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";
const SCHEMA_LOCATION: &str = "http://www.sitemaps.org/schemas/sitemap/0.9 \
    http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd \
    http://www.google.com/schemas/sitemap-image/1.1 \
    http://www.google.com/schemas/sitemap-image/1.1/sitemap-image.xsd";

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const STYLESHEET_FILE: &str = "sitemap.xsl";

const STYLESHEET: &str = include_str!("../assets/sitemap.xsl");

/// One `<url>` per page, in registry order.
pub fn sitemap_xml(site: &Site) -> String {
    let mut xml = String::with_capacity(256 + site.pages().len() * 128);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(&format!(
        r#"<?xml-stylesheet type="text/xsl" href="/{STYLESHEET_FILE}"?>"#
    ));
    xml.push('\n');
    xml.push_str(&format!(
        r#"<urlset xmlns="{SITEMAP_NS}" xmlns:xsi="{XSI_NS}" xmlns:image="{IMAGE_NS}" xsi:schemaLocation="{SCHEMA_LOCATION}">"#
    ));
    xml.push('\n');

    for page in site.pages() {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&page.permalink)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            page.date_modified.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Write `sitemap.xml` and `sitemap.xsl` into the output directory.
pub fn write_sitemap(site: &Site, output_dir: &Path) -> Result<(), ManifestError> {
    for (name, contents) in [
        (SITEMAP_FILE, sitemap_xml(site)),
        (STYLESHEET_FILE, STYLESHEET.to_string()),
    ] {
        let path = output_dir.join(name);
        write_atomic(&path, contents.as_bytes()).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote sitemap file");
    }
    Ok(())
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
