//! Configuration options for the extraction cascade.
//!
//! The `Options` struct controls where rule files live, how aggressively the
//! prune heuristic runs, which collaborators take part, and how the final
//! renditions are produced.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for the extraction cascade.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use sitespec::Options;
///
/// // Use defaults
/// let options = Options::default();
///
/// // Customize specific fields
/// let options = Options {
///     sitespec_dir: "config/sites".into(),
///     use_generic_extractor: false,
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Directory holding one `<hostname>.txt` directive file per site.
    ///
    /// Default: `"sitespecs"`
    pub sitespec_dir: PathBuf,

    /// Special-character ratio above which a content leaf is pruned.
    ///
    /// The comparison is strict: a leaf exactly at the threshold is kept.
    ///
    /// Default: `0.5`
    pub prune_threshold: f64,

    /// Run the generic (readability) extractor to build the baseline result.
    ///
    /// When disabled, or when the `readability` feature is off, the baseline
    /// is always the unprocessed page.
    ///
    /// Default: `true`
    pub use_generic_extractor: bool,

    /// Cache resolved rule sets per hostname.
    ///
    /// Without the cache every request performs one store lookup per
    /// superdomain label.
    ///
    /// Default: `true`
    pub cache_rule_sets: bool,

    /// Most hostnames the resolution cache remembers before evicting the oldest.
    ///
    /// Default: `1024`
    pub rule_cache_capacity: usize,

    /// Keep link targets in the markdown rendition.
    ///
    /// Default: `true`
    pub include_links: bool,

    /// Keep image references in the markdown rendition.
    ///
    /// Default: `true`
    pub include_images: bool,

    /// Render tables as GFM tables in the markdown rendition.
    ///
    /// Default: `true`
    pub include_tables: bool,

    /// Request timeout for the HTTP fetcher.
    ///
    /// Default: `30s`
    pub fetch_timeout: Duration,

    /// User agent sent by the HTTP fetcher.
    ///
    /// Default: `"sitespec/<version>"`
    pub user_agent: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sitespec_dir: PathBuf::from("sitespecs"),
            prune_threshold: crate::prune::DEFAULT_THRESHOLD,
            use_generic_extractor: true,
            cache_rule_sets: true,
            rule_cache_capacity: crate::rules::DEFAULT_CACHE_CAPACITY,
            include_links: true,
            include_images: true,
            include_tables: true,
            fetch_timeout: Duration::from_secs(30),
            user_agent: concat!("sitespec/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
