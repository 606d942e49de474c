//! Tree-selector expressions.
//!
//! Rule files address nodes with XPath. This module compiles XPath 1.0
//! expressions (every axis, the core function library, plus `ends-with`)
//! and evaluates them over a dom_query tree. HTML trees have no namespace
//! nodes, so the `namespace` axis is always empty.
//!
//! ```rust
//! use sitespec::xpath::Selector;
//! use sitespec::dom;
//!
//! let doc = dom::parse(r#"<div id="content"><p>One</p><p class="ad">Two</p></div>"#);
//! let selector = Selector::compile(r#"//div[@id="content"]/p[not(@class)]"#)?;
//!
//! let items = selector.select(doc.root())?;
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].string_value(), "One");
//! # Ok::<(), sitespec::Error>(())
//! ```

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

use dom_query::NodeRef;

use crate::error::{Error, Result};
use eval::Evaluator;
use parser::{Expr, Parser};

pub use eval::Item;

/// A compiled tree-selector expression.
#[derive(Clone)]
pub struct Selector {
    source: String,
    expr: Expr,
}

impl Selector {
    /// Compile an expression, failing with [`Error::Selector`] when malformed.
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = lexer::tokenize(source).map_err(|msg| Error::selector(source, msg))?;
        let expr = Parser::new(tokens)
            .parse()
            .map_err(|msg| Error::selector(source, msg))?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The expression text this selector was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every item selected with `context` as the context node, in document order.
    ///
    /// Absolute paths start from the document node that owns `context`.
    pub fn select<'a>(&self, context: NodeRef<'a>) -> Result<Vec<Item<'a>>> {
        Evaluator::new(context)
            .select(&self.expr, context)
            .map_err(|msg| Error::selector(&self.source, msg))
    }

    /// Like [`select`](Self::select), keeping only tree nodes.
    pub fn select_nodes<'a>(&self, context: NodeRef<'a>) -> Result<Vec<NodeRef<'a>>> {
        Ok(self.select(context)?.iter().filter_map(Item::node).collect())
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
