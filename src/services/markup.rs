//! Minimal class-selector extraction over raw HTML.
//!
//! Press-release pages are matched with a handful of fixed selectors, so this
//! only supports "elements of (optional) tag T carrying class C" plus
//! "first descendant of tag T". Anything fancier belongs in the page adapter.

use regex::Regex;
use std::sync::OnceLock;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>").expect("open tag pattern"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("tag pattern"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bdatetime\s*=\s*["']([^"']+)["']"#).expect("datetime pattern"))
}

/// A matched element: its tag name, raw attribute text and inner HTML
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: String,
    pub inner: String,
}

impl Element {
    /// Value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<String> {
        attr_value(&self.attrs, name)
    }

    /// Whitespace-collapsed text content
    pub fn text(&self) -> String {
        strip_tags(&self.inner)
    }

    /// First descendant element with the given tag name
    pub fn first(&self, tag: &str) -> Option<Element> {
        elements(&self.inner, Some(tag), None).into_iter().next()
    }

    /// First `datetime="..."` attribute on the element or anywhere inside it
    pub fn datetime(&self) -> Option<String> {
        self.attr("datetime").or_else(|| {
            datetime_re()
                .captures(&self.inner)
                .map(|c| c[1].to_string())
        })
    }
}

fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r#"(?i)(?:^|\s){}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| decode_entities(m.as_str()))
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr_value(attrs, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Find the end of the element whose opening tag ends at `open_end`.
/// Returns the byte range of its inner HTML.
fn inner_range(html: &str, tag: &str, open_end: usize) -> Option<(usize, usize)> {
    let pattern = format!(r"(?is)<(/?){}\b[^>]*?(/?)>", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;

    let mut depth = 1usize;
    for caps in re.captures_iter(&html[open_end..]) {
        let whole = caps.get(0)?;
        let closing = !caps[1].is_empty();
        let self_closing = !caps[2].is_empty();

        if closing {
            depth -= 1;
            if depth == 0 {
                return Some((open_end, open_end + whole.start()));
            }
        } else if !self_closing {
            depth += 1;
        }
    }
    None
}

/// All elements matching an optional tag name and an optional class.
pub fn elements(html: &str, tag: Option<&str>, class: Option<&str>) -> Vec<Element> {
    let mut found = Vec::new();

    for caps in open_tag_re().captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps[1].to_lowercase();
        let attrs = caps[2].to_string();

        if let Some(wanted) = tag {
            if !name.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        if let Some(class) = class {
            if !has_class(&attrs, class) {
                continue;
            }
        }

        let inner = if VOID_TAGS.contains(&name.as_str()) || attrs.trim_end().ends_with('/') {
            String::new()
        } else {
            match inner_range(html, &name, whole.end()) {
                Some((start, end)) => html[start..end].to_string(),
                None => continue,
            }
        };

        found.push(Element {
            tag: name,
            attrs: attrs.trim_end_matches('/').to_string(),
            inner,
        });
    }

    found
}

/// Drop tags, decode common entities and collapse whitespace
pub fn strip_tags(html: &str) -> String {
    let without_tags = tag_re().replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    whitespace_re().replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#8217;", "\u{2019}")
        .replace("&#8220;", "\u{201c}")
        .replace("&#8221;", "\u{201d}")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
