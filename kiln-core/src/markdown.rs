use std::sync::LazyLock;

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};
use regex::Regex;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://|www\.)[^\s<>]+").expect("bare URL pattern is valid")
});

const HIGHLIGHT_THEME: &str = "base16-ocean.dark";

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Convert Markdown to an HTML fragment.
///
/// Raw HTML in the input is passed through untouched.
pub fn to_html(markdown: &str) -> String {
    let parser = TextMergeStream::new(Parser::new_ext(markdown, options()));
    let events: Vec<Event> = parser.collect();

    let mut processed_events = Vec::with_capacity(events.len());
    let mut link_depth = 0usize;
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };

                // Collect all text events until the end of the code block
                let mut code_content = String::new();
                i += 1;
                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code_content.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }

                processed_events.push(Event::Html(highlight(&code_content, &lang).into()));
            }
            Event::Start(Tag::Link { .. }) => {
                link_depth += 1;
                processed_events.push(events[i].clone());
            }
            Event::End(TagEnd::Link) => {
                link_depth = link_depth.saturating_sub(1);
                processed_events.push(events[i].clone());
            }
            Event::InlineHtml(tag) => {
                match anchor_tag(tag) {
                    Some(true) => link_depth += 1,
                    Some(false) => link_depth = link_depth.saturating_sub(1),
                    None => {}
                }
                processed_events.push(events[i].clone());
            }
            Event::Text(text) if link_depth == 0 => {
                linkify(text, &mut processed_events);
            }
            _ => {
                processed_events.push(events[i].clone());
            }
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, processed_events.into_iter());
    out
}

/// `Some(true)` for a raw `<a ...>` tag, `Some(false)` for `</a>`.
fn anchor_tag(html: &str) -> Option<bool> {
    let lower = html.trim_start().to_ascii_lowercase();
    let (closing, rest) = match lower.strip_prefix("</") {
        Some(rest) => (true, rest),
        None => (false, lower.strip_prefix('<')?),
    };
    let rest = rest.strip_prefix('a')?;
    match rest.chars().next() {
        Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace() => Some(!closing),
        _ => None,
    }
}

fn highlight(code: &str, lang: &str) -> String {
    // The info string may carry more than the language, e.g. "rust,ignore"
    let token = lang.split([',', ' ']).next().unwrap_or_default();

    let syntax = if token.is_empty() {
        None
    } else {
        SYNTAX_SET.find_syntax_by_token(token).or_else(|| {
            // Fallback mappings for unsupported languages
            match token {
                "nix" => SYNTAX_SET.find_syntax_by_name("JavaScript"),
                "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
                _ => None,
            }
        })
    };

    let plain = || format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(code));

    match syntax {
        Some(syntax) => {
            let theme = &THEME_SET.themes[HIGHLIGHT_THEME];
            highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme).unwrap_or_else(|_| plain())
        }
        None => plain(),
    }
}

/// Turn bare `http(s)://` and `www.` URLs in a text run into links.
fn linkify<'a>(text: &CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let mut last = 0;

    for found in BARE_URL.find_iter(text) {
        let url = trim_url(found.as_str());
        if url.is_empty() {
            continue;
        }
        let start = found.start();
        let end = start + url.len();

        if start > last {
            out.push(Event::Text(text[last..start].to_string().into()));
        }

        let href = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: href.into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(url.to_string().into()));
        out.push(Event::End(TagEnd::Link));

        last = end;
    }

    if last == 0 {
        out.push(Event::Text(text.clone()));
    } else if last < text.len() {
        out.push(Event::Text(text[last..].to_string().into()));
    }
}

/// Drop trailing punctuation that belongs to the sentence, not the URL.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let trim = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | '*' | '_' | '~' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !trim {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}
