//! Markup sanitizer run before rule evaluation.
//!
//! Mirrors the defaults of a conventional HTML cleaner: comments, scripts,
//! embedded objects, frames, form controls, `<link>` and `<meta>` are killed
//! with their content; `<form>` and legacy presentational wrappers are
//! unwrapped; only attributes on the safe list survive, and URL attributes
//! pointing at script schemes are dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom;

/// Elements removed together with their content.
const KILL_TAGS: &[&str] = &[
    "script", "noscript", "embed", "object", "applet", "param", "iframe", "frame",
    "frameset", "button", "input", "select", "textarea", "link", "meta",
];

/// Elements replaced by their children.
const UNWRAP_TAGS: &[&str] = &["form", "blink", "marquee"];

/// Attributes kept on every element.
const SAFE_ATTRS: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt", "axis",
    "border", "cellpadding", "cellspacing", "char", "charoff", "charset", "checked",
    "cite", "class", "clear", "color", "cols", "colspan", "compact", "coords", "datetime",
    "dir", "disabled", "enctype", "for", "frame", "headers", "height", "href", "hreflang",
    "hspace", "id", "ismap", "label", "lang", "longdesc", "maxlength", "media", "method",
    "multiple", "name", "nohref", "noshade", "nowrap", "prompt", "readonly", "rel", "rev",
    "rows", "rowspan", "rules", "scope", "selected", "shape", "size", "span", "src",
    "start", "summary", "tabindex", "target", "title", "type", "usemap", "valign", "value",
    "vspace", "width",
];

/// Attributes holding URLs.
const URL_ATTRS: &[&str] = &["href", "src", "action", "cite", "longdesc", "usemap"];

#[allow(clippy::expect_used)]
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("COMMENT_RE regex"));

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

/// Sanitize raw page markup, returning the cleaned document serialization.
#[must_use]
pub fn sanitize(html: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(html, "");
    let doc = dom::parse(&without_comments);
    let Some(root) = dom::root_element(&doc) else {
        return String::new();
    };

    for node in dom::descendant_elements(&root) {
        if dom::tag_name(&node).is_some_and(|tag| KILL_TAGS.contains(&tag.as_str())) {
            dom::remove(&node);
        }
    }

    dom::strip_tags(&doc.select("html"), UNWRAP_TAGS);

    for node in std::iter::once(root).chain(dom::descendant_elements(&root)) {
        for (name, value) in dom::get_all_attributes(&node) {
            let name_lower = name.to_ascii_lowercase();
            let unsafe_attr = !SAFE_ATTRS.contains(&name_lower.as_str());
            let script_url = URL_ATTRS.contains(&name_lower.as_str()) && is_script_url(&value);
            if unsafe_attr || script_url {
                dom::remove_attribute(&node, &name);
            }
        }
    }

    dom::document_html(&doc).to_string()
}
