//! Extraction cascade.
//!
//! A site-agnostic baseline is computed first, the hostname's rule set (if
//! any) is applied on top, and the renditions are generated last from the
//! body that survived the merge.

use tracing::{debug, info};
use url::Url;

use crate::baseline::GenericExtractor;
use crate::engine::RuleEngine;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::options::Options;
use crate::render::{MarkdownRenderer, Renderer};
use crate::result::ExtractionResult;
use crate::rules::{DirectoryStore, DomainResolver, RuleSetStore};

/// Hostname of `url`, lowercased, without port.
#[must_use]
pub fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
}

fn resolver_for(store: impl RuleSetStore + 'static, options: &Options) -> DomainResolver {
    if options.cache_rule_sets {
        DomainResolver::with_cache_capacity(store, options.rule_cache_capacity)
    } else {
        DomainResolver::new(store)
    }
}

#[cfg(feature = "readability")]
fn default_generic(options: &Options) -> Option<Box<dyn GenericExtractor>> {
    options
        .use_generic_extractor
        .then(|| Box::new(crate::baseline::ReadabilityExtractor) as Box<dyn GenericExtractor>)
}

#[cfg(not(feature = "readability"))]
fn default_generic(_options: &Options) -> Option<Box<dyn GenericExtractor>> {
    None
}

/// Baseline extraction plus per-site overrides.
///
/// # Example
///
/// ```rust
/// use sitespec::{Cascade, MemoryStore, Options};
///
/// let store = MemoryStore::new().with_text(
///     "example.com",
///     "title: //h1\nbody: //div[@id='content']\nprune: no",
/// );
/// let cascade = Cascade::new(Options::default())
///     .with_store(store)
///     .without_generic_extractor();
///
/// let html = r#"<h1>Headline</h1><div id="content"><p>Story.</p></div>"#;
/// let result = cascade.extract("https://news.example.com/a/1", html)?;
///
/// assert_eq!(result.title.as_deref(), Some("Headline"));
/// assert!(result.plaintext.contains("Story."));
/// # Ok::<(), sitespec::Error>(())
/// ```
pub struct Cascade {
    options: Options,
    resolver: DomainResolver,
    generic: Option<Box<dyn GenericExtractor>>,
    renderer: Box<dyn Renderer>,
}

impl Cascade {
    /// Rule sets from `options.sitespec_dir`, readability baseline (when the
    /// feature is on and enabled), markdown renderer.
    #[must_use]
    pub fn new(options: Options) -> Self {
        let resolver = resolver_for(DirectoryStore::new(options.sitespec_dir.clone()), &options);
        Self {
            generic: default_generic(&options),
            renderer: Box::new(MarkdownRenderer::from_options(&options)),
            resolver,
            options,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: impl RuleSetStore + 'static) -> Self {
        self.resolver = resolver_for(store, &self.options);
        self
    }

    #[must_use]
    pub fn with_generic_extractor(mut self, extractor: impl GenericExtractor + 'static) -> Self {
        self.generic = Some(Box::new(extractor));
        self
    }

    /// Always use the unprocessed page as the baseline.
    #[must_use]
    pub fn without_generic_extractor(mut self) -> Self {
        self.generic = None;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    /// Extract an article from `raw_html` served at `url`.
    ///
    /// Fails only when the hostname's rule set cannot be applied (for
    /// example a malformed selector); no partial result is returned then.
    pub fn extract(&self, url: &str, raw_html: &str) -> Result<ExtractionResult> {
        let mut result = self.baseline(url, raw_html);

        match hostname_of(url) {
            Some(hostname) => {
                if let Some(rules) = self.resolver.resolve(&hostname) {
                    let overrides = RuleEngine::new(&rules)?
                        .with_threshold(self.options.prune_threshold)
                        .apply(raw_html)?;
                    debug!(hostname = %hostname, "applied rule set");
                    result.merge_from(overrides);
                }
            }
            None => debug!(url = %url, "no hostname, skipping rule sets"),
        }

        result.clear_renditions();
        let rendered = self.renderer.render(&result.body_html);
        result.markdown = rendered.markdown;
        result.markdown_html = rendered.markdown_html;
        result.plaintext = rendered.plaintext;
        Ok(result)
    }

    /// Fetch `url` and extract it.
    pub fn extract_url<F: Fetcher + ?Sized>(&self, fetcher: &F, url: &str) -> Result<ExtractionResult> {
        info!(url = %url, "fetching");
        let raw_html = fetcher.fetch(url)?;
        self.extract(url, &raw_html)
    }

    fn baseline(&self, url: &str, raw_html: &str) -> ExtractionResult {
        self.generic
            .as_ref()
            .and_then(|generic| generic.extract(url, raw_html))
            .unwrap_or_else(|| {
                debug!(url = %url, "no generic result, baseline is the raw page");
                ExtractionResult::from_raw(raw_html)
            })
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field("options", &self.options)
            .field("resolver", &self.resolver)
            .field("generic", &self.generic.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::render::Rendered;
    use crate::rules::MemoryStore;

    struct FixedBaseline(ExtractionResult);

    impl GenericExtractor for FixedBaseline {
        fn extract(&self, _url: &str, _html: &str) -> Option<ExtractionResult> {
            Some(self.0.clone())
        }
    }

    struct NoBaseline;

    impl GenericExtractor for NoBaseline {
        fn extract(&self, _url: &str, _html: &str) -> Option<ExtractionResult> {
            None
        }
    }

    /// Echoes the body so tests can see which body was rendered.
    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, body_html: &str) -> Rendered {
            Rendered {
                markdown: format!("md:{body_html}"),
                markdown_html: format!("html:{body_html}"),
                plaintext: format!("text:{body_html}"),
            }
        }
    }

    fn cascade(store: MemoryStore) -> Cascade {
        Cascade::new(Options::default())
            .with_store(store)
            .with_renderer(EchoRenderer)
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("https://News.Example.com:8080/a?b=c").as_deref(), Some("news.example.com"));
        assert_eq!(hostname_of("http://example.com./").as_deref(), Some("example.com"));
        assert_eq!(hostname_of("not a url"), None);
        assert_eq!(hostname_of("file:///tmp/x.html"), None);
    }

    #[test]
    fn test_raw_page_baseline_without_rules() {
        let cascade = cascade(MemoryStore::new()).with_generic_extractor(NoBaseline);
        let result = cascade.extract("https://example.com/", "<p>raw</p>").unwrap();
        assert_eq!(result.body_html, "<p>raw</p>");
        assert_eq!(result.plaintext, "text:<p>raw</p>");
        assert!(result.title.is_none());
    }

    #[test]
    fn test_override_merges_onto_generic_baseline() {
        let baseline = ExtractionResult {
            title: Some("Generic".into()),
            authors: Some("Guess".into()),
            body_html: "<p>generic</p>".into(),
            markdown: "stale".into(),
            ..ExtractionResult::default()
        };
        let store = MemoryStore::new().with_text("example.com", "title: //h1\nbody: //article\nprune: no");
        let cascade = cascade(store).with_generic_extractor(FixedBaseline(baseline));

        let result = cascade
            .extract("https://www.example.com/", "<h1>Site</h1><article><p>site body</p></article>")
            .unwrap();
        assert_eq!(result.title.as_deref(), Some("Site"));
        assert_eq!(result.authors.as_deref(), Some("Guess"));
        assert!(result.body_html.contains("site body"));
        assert_eq!(result.markdown, format!("md:{}", result.body_html));
    }

    #[test]
    fn test_selector_error_propagates() {
        let store = MemoryStore::new().with_text("example.com", "title: //h1[");
        let cascade = cascade(store).without_generic_extractor();
        let err = cascade.extract("https://example.com/", "<h1>x</h1>").unwrap_err();
        assert!(matches!(err, Error::Selector { .. }));
    }

    #[test]
    fn test_url_without_host_skips_rules() {
        let store = MemoryStore::new().with_text("example.com", "title: //h1[");
        let cascade = cascade(store).without_generic_extractor();
        let result = cascade.extract("about:blank", "<h1>x</h1>").unwrap();
        assert_eq!(result.body_html, "<h1>x</h1>");
    }

    #[test]
    fn test_extract_url_uses_fetcher() {
        let mut pages = std::collections::HashMap::new();
        pages.insert("https://example.com/a".to_string(), "<p>fetched</p>".to_string());
        let cascade = cascade(MemoryStore::new()).without_generic_extractor();

        let result = cascade.extract_url(&pages, "https://example.com/a").unwrap();
        assert_eq!(result.body_html, "<p>fetched</p>");
        assert!(matches!(
            cascade.extract_url(&pages, "https://example.com/missing"),
            Err(Error::Fetch(_))
        ));
    }
}
