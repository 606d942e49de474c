//! Rule engine: applies a site rule set to a raw page.
//!
//! Phases run in a fixed order, each only when the rule set asks for it:
//!
//! 1. literal find/replace over the raw text
//! 2. sanitize (unless `lxml_clean: no`)
//! 3. parse
//! 4. `date`, `title`, `footnotes`: first selector with a match, first match
//! 5. `author`: every match of every selector, joined with `", "`
//! 6. `body`: first selector with a node match, else the whole document
//! 7. `strip`, 8. `strip_id_or_class`, 9. `strip_image_src`: deletions
//! 10. prune (unless `prune: no`)
//! 11. serialize the body root
//!
//! Every selector is compiled before the page is touched, so a malformed
//! expression fails the whole call and no partial result escapes.

use tracing::debug;

use crate::clean;
use crate::dom::{self, NodeRef};
use crate::error::Result;
use crate::prune;
use crate::result::ExtractionResult;
use crate::rules::RuleSet;
use crate::xpath::Selector;

/// Separator between author names.
const AUTHOR_SEPARATOR: &str = ", ";

/// Apply `rules` to `raw_html` with the default prune threshold.
///
/// # Example
///
/// ```rust
/// use sitespec::{engine, RuleSet};
///
/// let rules = RuleSet::parse("title: //h1\nbody: //div[@id='content']\nprune: no");
/// let html = r#"<h1> Hello </h1><div id="content"><p>Body text.</p></div><p>Elsewhere</p>"#;
///
/// let result = engine::apply(&rules, html)?;
/// assert_eq!(result.title.as_deref(), Some("Hello"));
/// assert!(result.body_html.contains("Body text."));
/// assert!(!result.body_html.contains("Elsewhere"));
/// # Ok::<(), sitespec::Error>(())
/// ```
pub fn apply(rules: &RuleSet, raw_html: &str) -> Result<ExtractionResult> {
    RuleEngine::new(rules)?.apply(raw_html)
}

/// Literal substring replacement, one left-to-right pass per pair.
///
/// Each pair operates on the output of the previous one; replacements are
/// never rescanned for the pattern they just inserted.
#[must_use]
pub fn find_replace<'a>(source: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .fold(source.to_string(), |text, (find, replace)| text.replace(find, replace))
}

/// Strip surrounding spaces and quote characters from a directive value.
fn unquote(value: &str) -> &str {
    value.trim_matches([' ', '"', '\''])
}

fn compile_all(expressions: &[String]) -> Result<Vec<Selector>> {
    expressions.iter().map(|e| Selector::compile(e)).collect()
}

/// A rule set with every selector compiled.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    find_replace: Vec<(String, String)>,
    sanitize: bool,
    prune: bool,
    threshold: f64,
    date: Vec<Selector>,
    title: Vec<Selector>,
    footnotes: Vec<Selector>,
    author: Vec<Selector>,
    body: Vec<Selector>,
    strip: Vec<Selector>,
    strip_id_or_class: Vec<String>,
    strip_image_src: Vec<String>,
}

impl RuleEngine {
    /// Compile `rules`. Fails with [`Error::Selector`](crate::Error::Selector)
    /// on the first malformed expression.
    pub fn new(rules: &RuleSet) -> Result<Self> {
        Ok(Self {
            find_replace: rules
                .find_replace()
                .map(|(f, r)| (f.to_string(), r.to_string()))
                .collect(),
            sanitize: rules.lxml_clean,
            prune: rules.prune,
            threshold: prune::DEFAULT_THRESHOLD,
            date: compile_all(&rules.date)?,
            title: compile_all(&rules.title)?,
            footnotes: compile_all(&rules.footnotes)?,
            author: compile_all(&rules.author)?,
            body: compile_all(&rules.body)?,
            strip: compile_all(&rules.strip)?,
            strip_id_or_class: rules.strip_id_or_class.iter().map(|v| unquote(v).to_string()).collect(),
            strip_image_src: rules.strip_image_src.iter().map(|v| unquote(v).to_string()).collect(),
        })
    }

    /// Use a different prune threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Run every phase over `raw_html`.
    pub fn apply(&self, raw_html: &str) -> Result<ExtractionResult> {
        if raw_html.trim().is_empty() {
            return Ok(ExtractionResult::default());
        }

        let source = find_replace(
            raw_html,
            self.find_replace.iter().map(|(f, r)| (f.as_str(), r.as_str())),
        );
        let source = if self.sanitize { clean::sanitize(&source) } else { source };

        let doc = dom::parse(&source);
        let Some(root) = dom::root_element(&doc) else {
            return Ok(ExtractionResult::default());
        };

        let mut result = ExtractionResult {
            date: first_text(&self.date, root)?,
            title: first_text(&self.title, root)?,
            footnotes: first_text(&self.footnotes, root)?,
            authors: self.authors(root)?,
            ..ExtractionResult::default()
        };

        let body = match first_node(&self.body, root)? {
            Some(node) => node,
            None => {
                if !self.body.is_empty() {
                    debug!("no body selector matched, using whole document");
                }
                root
            }
        };

        self.strip_selected(body)?;
        self.strip_id_or_class(root);
        self.strip_image_src(root);

        if self.prune {
            prune::prune_children(&body, self.threshold);
        }

        result.body_html = dom::outer_html(&body).to_string();
        Ok(result)
    }

    fn authors(&self, root: NodeRef<'_>) -> Result<Option<String>> {
        let mut names = Vec::new();
        for selector in &self.author {
            for item in selector.select(root)? {
                names.push(item.string_value().trim().to_string());
            }
        }
        Ok((!names.is_empty()).then(|| names.join(AUTHOR_SEPARATOR)))
    }

    fn strip_selected(&self, body: NodeRef<'_>) -> Result<()> {
        for selector in &self.strip {
            let nodes = selector.select_nodes(body)?;
            debug!(selector = %selector, count = nodes.len(), "strip");
            for node in nodes {
                dom::remove(&node);
            }
        }
        Ok(())
    }

    /// Substring match on `id` or `class`: `class1` also removes `notclass1`.
    fn strip_id_or_class(&self, root: NodeRef<'_>) {
        for needle in self.strip_id_or_class.iter().filter(|n| !n.is_empty()) {
            for node in std::iter::once(root).chain(dom::descendant_elements(&root)) {
                let hit = ["id", "class"]
                    .iter()
                    .any(|attr| dom::get_attribute(&node, attr).is_some_and(|v| v.contains(needle.as_str())));
                if hit {
                    dom::remove(&node);
                }
            }
        }
    }

    fn strip_image_src(&self, root: NodeRef<'_>) {
        for needle in self.strip_image_src.iter().filter(|n| !n.is_empty()) {
            for node in dom::descendant_elements(&root) {
                let hit = dom::tag_name(&node).as_deref() == Some("img")
                    && dom::get_attribute(&node, "src").is_some_and(|src| src.contains(needle.as_str()));
                if hit {
                    dom::remove(&node);
                }
            }
        }
    }
}

/// Trimmed string value of the first match of the first selector that matches.
fn first_text(selectors: &[Selector], context: NodeRef<'_>) -> Result<Option<String>> {
    for selector in selectors {
        if let Some(item) = selector.select(context)?.first() {
            return Ok(Some(item.string_value().trim().to_string()));
        }
    }
    Ok(None)
}

/// First tree node matched by the first selector that matches a node.
fn first_node<'a>(selectors: &[Selector], context: NodeRef<'a>) -> Result<Option<NodeRef<'a>>> {
    for selector in selectors {
        if let Some(node) = selector.select_nodes(context)?.first() {
            return Ok(Some(*node));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn rules(text: &str) -> RuleSet {
        RuleSet::parse(text)
    }

    #[test]
    fn test_find_replace_single_pass() {
        assert_eq!(find_replace("ab", [("ab", "abab")]), "abab");
    }

    #[test]
    fn test_find_replace_chains_in_order() {
        assert_eq!(find_replace("a-b", [("a", "b"), ("b", "c")]), "c-c");
        assert_eq!(find_replace("a.b", [("a.b", "x")]), "x");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""class1""#), "class1");
        assert_eq!(unquote(" 'ad' "), "ad");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_scalar_fields_first_match_wins() {
        let r = rules("title: //h2\ntitle: //h1\ntitle: //title\ndate: //time/@datetime");
        let html = r#"<html><head><title>Doc</title></head><body>
            <h1> First </h1><h1>Second</h1><time datetime="2014-01-02">Jan</time></body></html>"#;
        let result = apply(&r, html).unwrap();
        assert_eq!(result.title.as_deref(), Some("First"));
        assert_eq!(result.date.as_deref(), Some("2014-01-02"));
        assert!(result.footnotes.is_none());
    }

    #[test]
    fn test_authors_collect_all_selectors() {
        let r = rules("author: //span[@class='a']\nauthor: //em[@class='b']");
        let html = r#"<p><em class="b">Cy</em><span class="a"> Ann </span><span class="a">Bob</span></p>"#;
        let result = apply(&r, html).unwrap();
        assert_eq!(result.authors.as_deref(), Some("Ann, Bob, Cy"));
    }

    #[test]
    fn test_no_author_match_leaves_authors_unset() {
        let result = apply(&rules("author: //address"), "<p>Nobody</p>").unwrap();
        assert!(result.authors.is_none());
    }

    #[test]
    fn test_body_falls_back_to_whole_document() {
        let r = rules("body: //article\nprune: no");
        let result = apply(&r, "<div><p>Everything</p></div>").unwrap();
        assert!(result.body_html.starts_with("<html>"));
        assert!(result.body_html.contains("Everything"));
    }

    #[test]
    fn test_strip_removes_selected_subtrees() {
        let r = rules(r#"body: //div[@id="content"]
strip: //*[@class="ad"]
prune: no"#);
        let html = r#"<div id="content"><p>Story text</p><div class="ad"><p>Buy now</p></div></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.contains("Story text"));
        assert!(!result.body_html.contains("Buy now"));
    }

    #[test]
    fn test_strip_relative_to_body() {
        let r = rules("body: //div[@id='content']\nstrip: p[2]\nprune: no");
        let html = r#"<p>outside</p><div id="content"><p>one</p><p>two</p></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.contains("one"));
        assert!(!result.body_html.contains("two"));
    }

    #[test]
    fn test_strip_id_or_class_is_substring_match() {
        let r = rules("body: //div[@id='content']\nstrip_id_or_class: \"class1\"\nprune: no");
        let html = r#"<div id="content"><p class="notclass1">gone</p><p id="x-class1-y">also gone</p><p class="other">kept</p></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(!result.body_html.contains("gone"));
        assert!(result.body_html.contains("kept"));
    }

    #[test]
    fn test_strip_image_src() {
        let r = rules("body: //div[@id='content']\nstrip_image_src: 'pixel.gif'\nprune: no");
        let html = r#"<div id="content"><img src="/t/pixel.gif"><img src="/photo.jpg"></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(!result.body_html.contains("pixel.gif"));
        assert!(result.body_html.contains("photo.jpg"));
    }

    #[test]
    fn test_empty_strip_values_are_ignored() {
        let r = rules("body: //div[@id='content']\nstrip_id_or_class: \"\"\nstrip_image_src: ''\nprune: no");
        let html = r#"<div id="content"><p class="x">kept</p><img src="a.png"></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.contains("kept"));
        assert!(result.body_html.contains("a.png"));
    }

    #[test]
    fn test_prune_runs_by_default() {
        let r = rules("body: //div[@id='content']");
        let html = r#"<div id="content"><p>Real sentence here.</p><span>| * |</span></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.contains("Real sentence here."));
        assert!(!result.body_html.contains("<span>"));
    }

    #[test]
    fn test_prune_disabled() {
        let r = rules("body: //div[@id='content']\nprune: no");
        let html = r#"<div id="content"><p>Real sentence here.</p><span>| * |</span></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.contains("<span>"));
    }

    #[test]
    fn test_sanitize_default_and_disabled() {
        let html = r#"<div id="content"><script>var x;</script><p>Text body.</p></div>"#;

        let cleaned = apply(&rules("body: //div[@id='content']\nprune: no"), html).unwrap();
        assert!(!cleaned.body_html.contains("<script"));

        let raw = apply(&rules("body: //div[@id='content']\nprune: no\nlxml_clean: no"), html).unwrap();
        assert!(raw.body_html.contains("<script"));
    }

    #[test]
    fn test_find_replace_before_parse() {
        let r = rules("find_string: <div class=\"wrap\">\nreplace_string: <div id=\"content\">\nbody: //div[@id='content']\nprune: no");
        let html = r#"<div class="wrap"><p>Moved</p></div>"#;
        let result = apply(&r, html).unwrap();
        assert!(result.body_html.starts_with(r#"<div id="content">"#));
    }

    #[test]
    fn test_malformed_selector_fails_whole_call() {
        let r = rules("title: //h1\nstrip: //div[@class='x'");
        let err = apply(&r, "<h1>T</h1>").unwrap_err();
        assert!(matches!(err, Error::Selector { expression, .. } if expression == "//div[@class='x'"));
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        let result = apply(&rules("title: //h1\nbody: //div"), "").unwrap();
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_custom_threshold() {
        let r = rules("body: //div[@id='content']");
        let html = r#"<div id="content"><p>ab|#</p></div>"#;

        let strict = RuleEngine::new(&r).unwrap().with_threshold(0.4).apply(html).unwrap();
        assert!(!strict.body_html.contains("ab|#"));

        let lenient = RuleEngine::new(&r).unwrap().apply(html).unwrap();
        assert!(lenient.body_html.contains("ab|#"));
    }
}
