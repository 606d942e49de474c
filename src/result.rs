//! Result types for extraction output.

use serde::{Deserialize, Serialize};

/// Structured article extracted from one page.
///
/// Created fresh per request by the [`Cascade`](crate::Cascade). The text
/// renditions are always derived from the final `body_html`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Publication date as found on the page (not normalized).
    pub date: Option<String>,

    /// Article title.
    pub title: Option<String>,

    /// Footnotes block text.
    pub footnotes: Option<String>,

    /// Author names joined with `", "`.
    pub authors: Option<String>,

    /// Serialized markup of the article body.
    pub body_html: String,

    /// Markdown rendition of `body_html`.
    pub markdown: String,

    /// HTML rendered back from `markdown`.
    pub markdown_html: String,

    /// Plain text rendition.
    pub plaintext: String,
}

/// A scalar field counts for merging only when it holds a non-empty string.
fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

impl ExtractionResult {
    /// Baseline used when the generic extractor yields nothing: the raw page.
    #[must_use]
    pub fn from_raw(html: &str) -> Self {
        Self {
            body_html: html.to_string(),
            ..Self::default()
        }
    }

    /// Overwrite fields with every present field of `other`.
    ///
    /// Empty or missing fields of `other` leave `self` untouched. Renditions
    /// are not merged; they are regenerated from the merged body.
    pub fn merge_from(&mut self, other: Self) {
        if present(other.date.as_ref()) {
            self.date = other.date;
        }
        if present(other.title.as_ref()) {
            self.title = other.title;
        }
        if present(other.footnotes.as_ref()) {
            self.footnotes = other.footnotes;
        }
        if present(other.authors.as_ref()) {
            self.authors = other.authors;
        }
        if !other.body_html.is_empty() {
            self.body_html = other.body_html;
        }
    }

    /// Drop any renditions so they cannot outlive the body they came from.
    pub(crate) fn clear_renditions(&mut self) {
        self.markdown.clear();
        self.markdown_html.clear();
        self.plaintext.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_override_does_not_overwrite() {
        let mut baseline = ExtractionResult {
            title: Some("A".into()),
            body_html: "<p>x</p>".into(),
            ..ExtractionResult::default()
        };
        let over = ExtractionResult {
            title: Some(String::new()),
            body_html: "<p>y</p>".into(),
            ..ExtractionResult::default()
        };

        baseline.merge_from(over);
        assert_eq!(baseline.title.as_deref(), Some("A"));
        assert_eq!(baseline.body_html, "<p>y</p>");
    }

    #[test]
    fn test_present_fields_win() {
        let mut baseline = ExtractionResult {
            authors: Some("Generic Guess".into()),
            date: None,
            body_html: "<p>x</p>".into(),
            ..ExtractionResult::default()
        };
        baseline.merge_from(ExtractionResult {
            authors: Some("Ann, Bob".into()),
            date: Some("2014-03-01".into()),
            ..ExtractionResult::default()
        });

        assert_eq!(baseline.authors.as_deref(), Some("Ann, Bob"));
        assert_eq!(baseline.date.as_deref(), Some("2014-03-01"));
        assert_eq!(baseline.body_html, "<p>x</p>");
    }

    #[test]
    fn test_renditions_not_merged() {
        let mut baseline = ExtractionResult::from_raw("<p>x</p>");
        baseline.merge_from(ExtractionResult {
            markdown: "stale".into(),
            ..ExtractionResult::default()
        });
        assert!(baseline.markdown.is_empty());
    }

    #[test]
    fn test_serializes_to_json() {
        let result = ExtractionResult {
            title: Some("T".into()),
            ..ExtractionResult::from_raw("<p>x</p>")
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["body_html"], "<p>x</p>");
        assert!(json["date"].is_null());
    }
}
