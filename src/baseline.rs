//! Generic extraction used as the cascade baseline.
//!
//! The baseline is whatever a site-agnostic article extractor can make of the
//! page. Rule-set fields are later layered on top of it.

use crate::result::ExtractionResult;

/// Site-agnostic article extraction.
///
/// Implementations swallow their own failures: `None` means "nothing usable",
/// and the cascade falls back to the unprocessed page.
pub trait GenericExtractor: Send + Sync {
    fn extract(&self, url: &str, html: &str) -> Option<ExtractionResult>;
}

/// Readability-style extraction backed by `dom_smoothie`.
#[cfg(feature = "readability")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityExtractor;

#[cfg(feature = "readability")]
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(feature = "readability")]
impl GenericExtractor for ReadabilityExtractor {
    fn extract(&self, url: &str, html: &str) -> Option<ExtractionResult> {
        use dom_smoothie::Readability;
        use tracing::debug;

        let document_url = (!url.is_empty()).then_some(url);
        let mut reader = match Readability::new(html, document_url, None) {
            Ok(reader) => reader,
            Err(err) => {
                debug!(url = %url, error = %err, "readability setup failed");
                return None;
            }
        };
        let article = match reader.parse() {
            Ok(article) => article,
            Err(err) => {
                debug!(url = %url, error = %err, "readability found no article");
                return None;
            }
        };

        Some(ExtractionResult {
            title: non_empty(Some(article.title)),
            authors: non_empty(article.byline),
            date: non_empty(article.published_time),
            body_html: article.content.to_string(),
            ..ExtractionResult::default()
        })
    }
}

#[cfg(all(test, feature = "readability"))]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><title>Field Notes</title></head><body>
        <nav><a href="/">Home</a> | <a href="/about">About</a></nav>
        <article>
          <h1>Field Notes</h1>
          <p>The first paragraph is long enough to look like prose, with commas, clauses and a point to make about rivers.</p>
          <p>The second paragraph continues the argument at similar length so the scorer treats this block as the article body.</p>
          <p>A third paragraph adds yet more ordinary sentences, which is what readability scoring looks for in a body.</p>
          <p>The fourth paragraph follows the river down to the estuary, where the water slows and the banks widen out.</p>
          <p>A fifth and final paragraph closes the piece, so the article comfortably clears any minimum length check.</p>
        </article>
        <footer>Copyright</footer></body></html>"#;

    #[test]
    fn test_readability_extracts_body() {
        let result = ReadabilityExtractor
            .extract("https://example.com/notes", ARTICLE)
            .unwrap();
        assert!(result.body_html.contains("rivers"));
        assert_eq!(result.title.as_deref(), Some("Field Notes"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" Ann ".into())).as_deref(), Some("Ann"));
        assert_eq!(non_empty(None), None);
    }
}
