//! Site rule sets.
//!
//! A rule set is the parsed directive collection for one hostname key. Rule
//! files are newline-delimited `label: content` lines; every recognized label
//! maps to a typed field of [`RuleSet`], everything else is ignored so newer
//! files keep loading.
//!
//! ```text
//! title: //h1[@class="headline"]
//! body: //div[@id="content"]
//! strip: //*[@class="ad"]
//! strip_id_or_class: "share"
//! prune: no
//! ```

pub mod resolver;
pub mod store;

pub use resolver::{hostname_chain, DomainResolver, DEFAULT_CACHE_CAPACITY};
pub use store::{DirectoryStore, MemoryStore, RuleSetStore};

/// Literal value that switches a boolean directive off.
const DISABLED: &str = "no";

/// The closed directive vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    FindString,
    ReplaceString,
    Strip,
    StripIdOrClass,
    StripImageSrc,
    Title,
    Date,
    Footnotes,
    Author,
    Body,
    LxmlClean,
    Prune,
}

impl Directive {
    /// Map a file label to its directive, `None` for unrecognized labels.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let directive = match label {
            "find_string" => Self::FindString,
            "replace_string" => Self::ReplaceString,
            "strip" => Self::Strip,
            "strip_id_or_class" => Self::StripIdOrClass,
            "strip_image_src" => Self::StripImageSrc,
            "title" => Self::Title,
            "date" => Self::Date,
            "footnotes" => Self::Footnotes,
            "author" => Self::Author,
            "body" => Self::Body,
            "lxml_clean" => Self::LxmlClean,
            "prune" => Self::Prune,
            _ => return None,
        };
        Some(directive)
    }
}

/// Split one directive-file line into `(label, content)`.
///
/// The first colon separates label from content. A line without a colon is
/// all label with empty content. Returns `None` for blank lines.
#[must_use]
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let (label, content) = line.split_once(':').unwrap_or((line, ""));
    Some((label.trim(), content.trim_start()))
}

/// Parsed directives for one hostname.
///
/// List directives keep every occurrence in file order, duplicates included.
/// The two flags are true unless the file sets them to exactly `no`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub find_string: Vec<String>,
    pub replace_string: Vec<String>,
    pub strip: Vec<String>,
    pub strip_id_or_class: Vec<String>,
    pub strip_image_src: Vec<String>,
    pub title: Vec<String>,
    pub date: Vec<String>,
    pub footnotes: Vec<String>,
    pub author: Vec<String>,
    pub body: Vec<String>,

    /// Run the sanitizer before parsing.
    pub lxml_clean: bool,

    /// Run the prune heuristic over the body.
    pub prune: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            find_string: Vec::new(),
            replace_string: Vec::new(),
            strip: Vec::new(),
            strip_id_or_class: Vec::new(),
            strip_image_src: Vec::new(),
            title: Vec::new(),
            date: Vec::new(),
            footnotes: Vec::new(),
            author: Vec::new(),
            body: Vec::new(),
            lxml_clean: true,
            prune: true,
        }
    }
}

impl RuleSet {
    /// Parse a directive file.
    ///
    /// Never fails: unknown labels and blank lines are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut rules = Self::default();
        for (label, content) in text.lines().filter_map(split_line) {
            if let Some(directive) = Directive::from_label(label) {
                rules.push(directive, content);
            }
        }
        rules
    }

    /// Record one directive occurrence.
    pub fn push(&mut self, directive: Directive, value: &str) {
        let list = match directive {
            Directive::LxmlClean => {
                self.lxml_clean = value.trim() != DISABLED;
                return;
            }
            Directive::Prune => {
                self.prune = value.trim() != DISABLED;
                return;
            }
            Directive::FindString => &mut self.find_string,
            Directive::ReplaceString => &mut self.replace_string,
            Directive::Strip => &mut self.strip,
            Directive::StripIdOrClass => &mut self.strip_id_or_class,
            Directive::StripImageSrc => &mut self.strip_image_src,
            Directive::Title => &mut self.title,
            Directive::Date => &mut self.date,
            Directive::Footnotes => &mut self.footnotes,
            Directive::Author => &mut self.author,
            Directive::Body => &mut self.body,
        };
        list.push(value.to_string());
    }

    /// Find/replace pairs, matched positionally. Unpaired values are ignored.
    pub fn find_replace(&self) -> impl Iterator<Item = (&str, &str)> {
        self.find_string
            .iter()
            .zip(&self.replace_string)
            .map(|(find, replace)| (find.as_str(), replace.as_str()))
    }

    /// A rule set with no list values and no explicit `no` flag.
    ///
    /// Empty rule sets are indistinguishable from missing ones during
    /// resolution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let lists = [
            &self.find_string,
            &self.replace_string,
            &self.strip,
            &self.strip_id_or_class,
            &self.strip_image_src,
            &self.title,
            &self.date,
            &self.footnotes,
            &self.author,
            &self.body,
        ];
        lists.iter().all(|list| list.is_empty()) && self.lxml_clean && self.prune
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("title: //h1"), Some(("title", "//h1")));
        assert_eq!(split_line("body://div[@id='x']"), Some(("body", "//div[@id='x']")));
        assert_eq!(split_line("prune"), Some(("prune", "")));
        assert_eq!(split_line("   "), None);
        assert_eq!(split_line(""), None);
    }

    #[test]
    fn test_split_line_keeps_colons_in_content() {
        let (label, content) = split_line("test_url: http://example.com/a").unwrap();
        assert_eq!(label, "test_url");
        assert_eq!(content, "http://example.com/a");
    }

    #[test]
    fn test_split_line_trims_leading_whitespace_only() {
        assert_eq!(split_line("find_string:   <br /> \r\n"), Some(("find_string", "<br /> ")));
    }

    #[test]
    fn test_parse_lists_keep_order_and_duplicates() {
        let rules = RuleSet::parse("strip: //a\nstrip: //b\nstrip: //a\n");
        assert_eq!(rules.strip, vec!["//a", "//b", "//a"]);
    }

    #[test]
    fn test_parse_ignores_unknown_labels() {
        let rules = RuleSet::parse("# comment\nsingle_page_link: //a\ntest_url: http://x.com\ntitle: //h1\n");
        assert_eq!(rules.title, vec!["//h1"]);
        assert!(rules.strip.is_empty());
    }

    #[test]
    fn test_flags_default_true() {
        let rules = RuleSet::parse("title: //h1");
        assert!(rules.lxml_clean);
        assert!(rules.prune);
    }

    #[test]
    fn test_flags_disabled_only_by_no() {
        let rules = RuleSet::parse("prune: no\nlxml_clean: yes");
        assert!(!rules.prune);
        assert!(rules.lxml_clean);

        let rules = RuleSet::parse("prune: false\nlxml_clean: NO");
        assert!(rules.prune);
        assert!(rules.lxml_clean);
    }

    #[test]
    fn test_find_replace_pairs_positionally() {
        let rules = RuleSet::parse(
            "find_string: a\nreplace_string: 1\nfind_string: b\nreplace_string: 2\nfind_string: c",
        );
        let pairs: Vec<_> = rules.find_replace().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_is_empty() {
        assert!(RuleSet::default().is_empty());
        assert!(RuleSet::parse("# only comments\nunknown: x").is_empty());
        assert!(RuleSet::parse("prune: yes").is_empty());
        assert!(!RuleSet::parse("prune: no").is_empty());
        assert!(!RuleSet::parse("lxml_clean: no").is_empty());
        assert!(!RuleSet::parse("author: //span").is_empty());
    }
}
