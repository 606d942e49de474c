//! Text renditions of the final body.
//!
//! The body is converted to markdown, the markdown is rendered back to HTML,
//! and the plain-text form is the markdown flattened onto one line.

use pulldown_cmark::{html, Options as CmarkOptions, Parser};
use quick_html2md::{html_to_markdown_with_options, MarkdownOptions};

use crate::options::Options;

/// The three renditions derived from one body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub markdown: String,
    pub markdown_html: String,
    pub plaintext: String,
}

/// Produces renditions from body markup.
pub trait Renderer: Send + Sync {
    fn render(&self, body_html: &str) -> Rendered;
}

/// Plain text is the markdown with every newline replaced by a space.
#[must_use]
pub fn flatten(markdown: &str) -> String {
    markdown.replace('\n', " ")
}

/// Markdown rendering via quick_html2md, HTML back via pulldown-cmark.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    include_links: bool,
    include_images: bool,
    include_tables: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

impl MarkdownRenderer {
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self {
            include_links: options.include_links,
            include_images: options.include_images,
            include_tables: options.include_tables,
        }
    }

    /// HTML to markdown.
    #[must_use]
    pub fn to_markdown(&self, body_html: &str) -> String {
        let md_options = MarkdownOptions::new()
            .include_links(self.include_links)
            .include_images(self.include_images)
            .preserve_tables(self.include_tables);
        html_to_markdown_with_options(body_html, &md_options)
    }

    /// Markdown back to HTML.
    #[must_use]
    pub fn to_html(&self, markdown: &str) -> String {
        let mut cmark_options = CmarkOptions::empty();
        if self.include_tables {
            cmark_options.insert(CmarkOptions::ENABLE_TABLES);
        }
        cmark_options.insert(CmarkOptions::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(markdown, cmark_options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, body_html: &str) -> Rendered {
        let markdown = self.to_markdown(body_html);
        Rendered {
            markdown_html: self.to_html(&markdown),
            plaintext: flatten(&markdown),
            markdown,
        }
    }
}
