//! RSS 2.0 feed of the most recent posts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::{debug, warn};

use crate::content::render_content;
use crate::error::{ManifestError, PageError, report};
use crate::render::write_atomic;
use crate::site::{Page, Site};

pub const FEED_FILE: &str = "feed.xml";

/// How many posts make it into the feed.
pub const FEED_LIMIT: usize = 10;

const GENERATOR: &str = "kiln";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Build the feed channel for the newest posts.
///
/// Posts whose body cannot be rendered are logged and left out.
pub fn feed_channel(site: &Site, now: DateTime<Utc>) -> Channel {
    let items: Vec<Item> = site
        .posts()
        .iter()
        .take(FEED_LIMIT)
        .filter_map(|post| match post_to_item(post) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(path = %post.source_path.display(), "leaving post out of feed: {}", report(&err));
                None
            }
        })
        .collect();

    debug!(items = items.len(), "generating feed");

    ChannelBuilder::default()
        .title(site.title.clone())
        .link(site.base_url.clone())
        .description(site.title.clone())
        .generator(Some(GENERATOR.to_string()))
        .last_build_date(Some(now.to_rfc2822()))
        .namespaces(BTreeMap::from([("atom".to_string(), ATOM_NS.to_string())]))
        .items(items)
        .build()
}

fn post_to_item(post: &Page) -> Result<Item, PageError> {
    let description = render_content(post)?;

    let guid = GuidBuilder::default()
        .value(post.permalink.clone())
        .permalink(true)
        .build();

    let mut builder = ItemBuilder::default();
    builder
        .title(Some(post.title.clone()))
        .link(Some(post.permalink.clone()))
        .description(Some(description))
        .guid(Some(guid));

    if let Some(date) = post.date_published {
        builder.pub_date(Some(date.to_rfc2822()));
    }

    Ok(builder.build())
}

/// Write `feed.xml` into the output directory.
pub fn write_feed(site: &Site, output_dir: &Path, now: DateTime<Utc>) -> Result<(), ManifestError> {
    let channel = feed_channel(site, now);
    let xml = channel
        .write_to(Vec::new())
        .map_err(|e| ManifestError::Feed(e.to_string()))?;

    let path = output_dir.join(FEED_FILE);
    write_atomic(&path, &xml).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "wrote feed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use chrono::TimeZone;
    use std::fs;

    fn site_in(dir: &Path, posts: usize) -> Site {
        let mut site = Site::new(&SiteConfig {
            title: "My Blog".into(),
            url: "https://example.com/".into(),
        });
        for day in 1..=posts {
            let path = dir.join(format!("2024-01-{day:02}-post.md"));
            fs::write(&path, format!("+++\ntitle = \"Post {day}\"\n+++\nBody *{day}*")).unwrap();

            let mut page = Page::new(path);
            page.title = format!("Post {day}");
            page.permalink = format!("https://example.com/blog/post-{day}/");
            page.date_published = Some(Utc.with_ymd_and_hms(2024, 1, day as u32, 0, 0, 0).unwrap());
            site.add_page(page);
        }
        site.sort_posts();
        site
    }

    #[test]
    fn channel_describes_the_site() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let channel = feed_channel(&site_in(dir.path(), 1), now);

        assert_eq!(channel.title(), "My Blog");
        assert_eq!(channel.link(), "https://example.com/");
        assert_eq!(channel.description(), "My Blog");
        assert_eq!(channel.generator(), Some("kiln"));
        assert_eq!(channel.last_build_date(), Some(now.to_rfc2822().as_str()));
        assert_eq!(channel.namespaces().get("atom").map(String::as_str), Some(ATOM_NS));
    }

    #[test]
    fn items_are_newest_posts_capped() {
        let dir = tempfile::tempdir().unwrap();
        let channel = feed_channel(&site_in(dir.path(), 12), Utc::now());

        assert_eq!(channel.items().len(), FEED_LIMIT);
        let first = &channel.items()[0];
        assert_eq!(first.title(), Some("Post 12"));
        assert_eq!(first.link(), Some("https://example.com/blog/post-12/"));
        assert_eq!(first.guid().map(|g| g.value()), Some("https://example.com/blog/post-12/"));
        assert!(first.guid().is_some_and(|g| g.is_permalink()));
        assert!(first.description().is_some_and(|d| d.contains("<em>12</em>")));
        assert!(first.pub_date().is_some_and(|d| d.contains("12 Jan 2024")));
    }

    #[test]
    fn unreadable_post_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let site = site_in(dir.path(), 2);
        fs::remove_file(&site.posts()[0].source_path).unwrap();

        let channel = feed_channel(&site, Utc::now());
        assert_eq!(channel.items().len(), 1);
        assert_eq!(channel.items()[0].title(), Some("Post 1"));
    }

    #[test]
    fn writes_feed_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build");
        write_feed(&site_in(dir.path(), 1), &out, Utc::now()).unwrap();

        let xml = fs::read_to_string(out.join(FEED_FILE)).unwrap();
        let channel = Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.items().len(), 1);
        assert!(xml.contains("xmlns:atom"));
    }
}
