use std::collections::HashMap;
use std::path::Path;

use tera::{Context, Tera, Value};

use crate::error::{BuildError, report};
use crate::site::PAGE_CATEGORY;

/// The templates of one build, with the site's helper functions registered.
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Load every `*.html` file in `dir`.
    pub fn load(dir: &Path) -> Result<Self, BuildError> {
        let fail = |message: String| BuildError::Templates {
            path: dir.to_path_buf(),
            message,
        };

        if !dir.is_dir() {
            return Err(fail("directory does not exist".into()));
        }

        let glob = dir.join("*.html");
        let mut tera = Tera::new(&glob.to_string_lossy()).map_err(|e| fail(report(&e)))?;

        if tera.get_template_names().next().is_none() {
            return Err(fail("no templates found".into()));
        }

        register_helpers(&mut tera);

        Ok(Self { tera })
    }

    /// Build a template set from in-memory sources.
    pub fn from_sources<'a, I>(templates: I) -> Result<Self, tera::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        register_helpers(&mut tera);
        Ok(Self { tera })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.tera.get_template_names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }
}

fn register_helpers(tera: &mut Tera) {
    tera.register_function("contains", contains);
    tera.register_function("string_contains", string_contains);
    tera.register_filter("filter_posts", filter_posts);
}

fn arg<'a>(args: &'a HashMap<String, Value>, fn_name: &str, key: &str) -> tera::Result<&'a Value> {
    args.get(key)
        .ok_or_else(|| tera::Error::msg(format!("`{fn_name}` is missing the `{key}` argument")))
}

/// `contains(items=page.tags, item="rust")`
fn contains(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let items = arg(args, "contains", "items")?;
    let item = arg(args, "contains", "item")?;

    let found = match items {
        Value::Array(items) => items.contains(item),
        Value::Null => false,
        other => {
            return Err(tera::Error::msg(format!(
                "`contains` expects a sequence for `items`, got {other}"
            )));
        }
    };

    Ok(Value::Bool(found))
}

/// `string_contains(haystack=page.title, needle="Rust")`
fn string_contains(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = |key: &str| {
        arg(args, "string_contains", key)?
            .as_str()
            .ok_or_else(|| tera::Error::msg(format!("`string_contains` expects `{key}` to be a string")))
    };

    Ok(Value::Bool(text("haystack")?.contains(text("needle")?)))
}

/// `posts | filter_posts(tag="blog")`
///
/// Keeps the posts whose category equals `tag`. The `page` tag keeps everything.
fn filter_posts(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let tag = arg(args, "filter_posts", "tag")?
        .as_str()
        .ok_or_else(|| tera::Error::msg("`filter_posts` expects `tag` to be a string"))?;

    if tag == PAGE_CATEGORY {
        return Ok(value.clone());
    }

    let posts = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("`filter_posts` can only filter a sequence"))?;

    Ok(Value::Array(
        posts
            .iter()
            .filter(|post| post.get("category").and_then(Value::as_str) == Some(tag))
            .cloned()
            .collect(),
    ))
}
