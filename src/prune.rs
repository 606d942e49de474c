//! Content-density pruning.
//!
//! Removes leaf elements whose text is mostly punctuation and markup noise
//! relative to word characters. Children are judged before their parents, and
//! an element that keeps any child element is never removed itself.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{self, NodeRef};

/// Default special-character ratio above which a leaf is pruned.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Tags that are never pruned.
const EXEMPT_TAGS: &[&str] = &["br"];

/// Word characters plus comma and period.
#[allow(clippy::expect_used)]
static NONSPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w,.]").expect("NONSPECIAL_RE regex"));

#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("WHITESPACE_RE regex"));

/// Character-class counts over a trimmed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub nonspecial: usize,
    pub whitespace: usize,
    pub special: usize,
}

impl Density {
    #[must_use]
    pub fn measure(text: &str) -> Self {
        let text = text.trim();
        let nonspecial = NONSPECIAL_RE.find_iter(text).count();
        let whitespace = WHITESPACE_RE.find_iter(text).count();
        let special = text.chars().count().saturating_sub(nonspecial + whitespace);
        Self {
            nonspecial,
            whitespace,
            special,
        }
    }

    /// True when the text is empty of non-whitespace or too noisy.
    #[must_use]
    pub fn is_noise(&self, threshold: f64) -> bool {
        let meaningful = self.special + self.nonspecial;
        meaningful == 0 || self.special as f64 / meaningful as f64 > threshold
    }
}

/// Whether a leaf with this tag and text content should go.
#[must_use]
pub fn should_prune(tag: &str, text: &str, threshold: f64) -> bool {
    !EXEMPT_TAGS.contains(&tag) && Density::measure(text).is_noise(threshold)
}

fn prune_leaf(node: &NodeRef, threshold: f64) {
    if !dom::has_only_text_children(node) {
        return;
    }
    let tag = dom::tag_name(node).unwrap_or_default();
    if should_prune(&tag, &dom::text_content(node), threshold) {
        dom::remove(node);
    }
}

/// Prune `node` and its subtree in place; `node` itself may be removed.
pub fn prune_element(node: &NodeRef, threshold: f64) {
    // Reverse pre-order visits every element after all of its descendants.
    let mut order = vec![*node];
    order.extend(dom::descendant_elements(node));
    for element in order.iter().rev() {
        prune_leaf(element, threshold);
    }
}

/// Prune every element child of `root`, leaving `root` itself in place.
pub fn prune_children(root: &NodeRef, threshold: f64) {
    for child in dom::element_children(root) {
        prune_element(&child, threshold);
    }
}
