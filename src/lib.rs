//! # sitespec
//!
//! Site-specific article extraction driven by per-domain directive files.
//!
//! Every page first goes through a generic, site-agnostic extractor. If a
//! rule file exists for the page's hostname (or any of its superdomains), its
//! directives are applied to the raw page and every field they produce
//! overrides the generic result. Markdown, HTML and plain-text renditions are
//! then generated from the final body.
//!
//! ## Quick Start
//!
//! ```rust
//! use sitespec::{Cascade, MemoryStore, Options};
//!
//! let rules = r#"
//! title: //h1
//! author: //span[@class="byline"]
//! body: //div[@id="content"]
//! strip: //*[@class="ad"]
//! "#;
//! let cascade = Cascade::new(Options::default())
//!     .with_store(MemoryStore::new().with_text("example.com", rules))
//!     .without_generic_extractor();
//!
//! let html = r#"<html><body>
//!   <h1>Headline</h1><span class="byline">Ann</span>
//!   <div id="content"><p>The story, told in full.</p><div class="ad">Buy now</div></div>
//! </body></html>"#;
//!
//! let result = cascade.extract("https://www.example.com/story", html)?;
//! assert_eq!(result.title.as_deref(), Some("Headline"));
//! assert_eq!(result.authors.as_deref(), Some("Ann"));
//! assert!(!result.body_html.contains("Buy now"));
//! # Ok::<(), sitespec::Error>(())
//! ```
//!
//! ## Features
//!
//! - `readability` (default): generic baseline via `dom_smoothie`
//! - `fetch` (default): blocking HTTP fetcher via `reqwest`

mod error;
mod options;
mod result;

/// Generic extraction used as the cascade baseline.
pub mod baseline;
/// Baseline extraction plus per-site overrides.
pub mod cascade;
/// Markup sanitizer.
pub mod clean;
/// DOM operations adapter over dom_query.
pub mod dom;
/// Character encoding detection and transcoding.
pub mod encoding;
/// Rule engine.
pub mod engine;
/// Page retrieval.
pub mod fetch;
/// Content-density pruning.
pub mod prune;
/// Text renditions.
pub mod render;
/// Rule sets, stores and superdomain resolution.
pub mod rules;
/// Expectation runner.
pub mod spectest;
/// Tree-selector expressions.
pub mod xpath;

// Public API - re-exports
pub use baseline::GenericExtractor;
#[cfg(feature = "readability")]
pub use baseline::ReadabilityExtractor;
pub use cascade::Cascade;
pub use engine::RuleEngine;
pub use error::{Error, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use fetch::Fetcher;
pub use options::Options;
pub use render::{MarkdownRenderer, Rendered, Renderer};
pub use result::ExtractionResult;
pub use rules::{DirectoryStore, DomainResolver, MemoryStore, RuleSet, RuleSetStore};
pub use spectest::{Expectation, SpecTestRunner, Status, TestOutcome};

/// Extract from `raw_html` with rule files from `options.sitespec_dir`.
///
/// Builds a fresh [`Cascade`]; keep one around instead when extracting many
/// pages so resolved rule sets stay cached.
pub fn extract(url: &str, raw_html: &str, options: Options) -> Result<ExtractionResult> {
    Cascade::new(options).extract(url, raw_html)
}
