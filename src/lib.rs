//! treeq: a selector-based query engine for hierarchical, attribute-bearing
//! data.
//!
//! A compact, jQuery-inspired selector syntax (`a/b[@id="2"]:first`) is
//! compiled into an ordered program of filter segments and resolved against
//! any tree implementing the [`Node`] contract. The XML backend ships here;
//! raw text parsing is delegated to `roxmltree`.
//!
//! ```
//! use treeq::{Document, Format, Node};
//!
//! let doc = Document::parse(r#"<root><a id="1">x</a><a id="2">y</a></root>"#, Format::Xml)?;
//! let id = doc.root().first("a:first/@id")?;
//! assert_eq!(id.as_scalar(), Some("1"));
//! # Ok::<(), treeq::Error>(())
//! ```

pub use treeq_selector::{
    AttrStep, AttrTest, AttrValue, Cursor, Item, Node, Resolution, SelectorError,
    SelectorProgram, SelectorSegment, SuffixKind, SuffixSet, SuffixValue, compile, resolve,
};
pub use treeq_xml::{NamespaceTable, XmlDocument, XmlError, XmlNode};

use thiserror::Error;

/// A comprehensive error type for compiling and resolving queries against a
/// parsed document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("document error: {0}")]
    Xml(#[from] XmlError),
}

/// The structured-data format of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
}

/// A parsed document of any supported format.
pub enum Document<'input> {
    Xml(XmlDocument<'input>),
}

impl<'input> Document<'input> {
    /// Parses raw document text. All-or-nothing: a malformed document yields
    /// an error and no tree.
    pub fn parse(text: &'input str, format: Format) -> Result<Self, Error> {
        log::debug!("parsing {} byte(s) as {format:?}", text.len());
        match format {
            Format::Xml => Ok(Document::Xml(XmlDocument::parse(text)?)),
        }
    }

    /// The root node, against which selectors are resolved.
    pub fn root(&self) -> XmlNode<'_, 'input> {
        match self {
            Document::Xml(doc) => doc.root(),
        }
    }
}
