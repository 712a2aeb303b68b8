//! Defines the capability contract any backend tree must satisfy.

use crate::engine::{self, Item, Resolution};
use crate::error::SelectorError;
use crate::parser;
use crate::program::SelectorProgram;

/// The result of an attribute lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// The attribute does not exist. Never an error; distinct from a
    /// malformed query.
    Absent,
    /// A single named attribute's value.
    Scalar(String),
    /// All attributes as an ordered name → value map, returned when no name
    /// was asked for.
    Map(Vec<(String, String)>),
}

impl AttrValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AttrValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AttrValue::Absent)
    }
}

/// The contract for a node in a hierarchical, attribute-bearing tree.
///
/// The resolver is written exclusively against this trait, so any backend
/// (XML today, others later) that implements it can be queried with the same
/// selector language. This is a closed capability surface: backends expose
/// children, attributes and a text rendering, never an arbitrary
/// pass-through to the underlying parser's API.
///
/// Structural parsing is the backend document constructor (all-or-nothing, a
/// `Result`); no half-built tree ever reaches the resolver.
pub trait Node: Clone + std::fmt::Debug + Sized {
    /// Children matching `selector`, in document order. The selector may be
    /// namespace-qualified (`"ns:local"`); `None` or an empty name returns
    /// all children.
    fn children(&self, selector: Option<&str>) -> Vec<Self>;

    /// A named attribute's value, or the full map when `selector` is `None`.
    fn attribute(&self, selector: Option<&str>) -> AttrValue;

    /// The text rendering of this node's subtree.
    fn to_text(&self) -> String;

    /// Compiles `selector` and resolves it against this node.
    fn get(&self, selector: &str) -> Result<Resolution<Self>, SelectorError> {
        Ok(engine::resolve(self, &parser::compile(selector)?, None))
    }

    /// Like [`Node::get`], truncating the result to `limit` items.
    fn get_limited(&self, selector: &str, limit: usize) -> Result<Resolution<Self>, SelectorError> {
        Ok(engine::resolve(self, &parser::compile(selector)?, Some(limit)))
    }

    /// The first item matched by `selector`, or the absent sentinel.
    fn first(&self, selector: &str) -> Result<Item<Self>, SelectorError> {
        Ok(self.get(selector)?.into_first())
    }

    /// Resolves a precompiled program against this node.
    fn resolve(&self, program: &SelectorProgram, limit: Option<usize>) -> Resolution<Self> {
        engine::resolve(self, program, limit)
    }
}

// Mock tree - publicly available for engine unit tests and integration
// testing in downstream crates.
pub mod tests {
    use super::*;

    #[derive(Debug)]
    struct MockNodeData {
        name: String,
        text: String,
        attributes: Vec<(String, String)>,
        children: Vec<usize>,
    }

    #[derive(Debug)]
    pub struct MockTree {
        nodes: Vec<MockNodeData>,
    }

    /// A simple in-memory node holding a reference to its tree so it can
    /// navigate itself.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> Node for MockNode<'a> {
        fn children(&self, selector: Option<&str>) -> Vec<Self> {
            let tree = self.tree;
            self.tree.nodes[self.id]
                .children
                .iter()
                .filter(|&&id| match selector {
                    None | Some("") => true,
                    Some(name) => tree.nodes[id].name == name,
                })
                .map(|&id| MockNode { id, tree })
                .collect()
        }

        fn attribute(&self, selector: Option<&str>) -> AttrValue {
            let attributes = &self.tree.nodes[self.id].attributes;
            match selector {
                None | Some("") => AttrValue::Map(attributes.clone()),
                Some(name) => attributes
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| AttrValue::Scalar(v.clone()))
                    .unwrap_or(AttrValue::Absent),
            }
        }

        fn to_text(&self) -> String {
            self.tree.nodes[self.id].text.clone()
        }
    }

    /// Creates a mock tree for testing:
    /// ```xml
    /// <root> <!-- id 0 -->
    ///   <a id="1" class="hello-world">x</a> <!-- id 1 -->
    ///   <a id="2">y</a>                     <!-- id 2 -->
    ///   <b lang="en fr">z</b>               <!-- id 3 -->
    ///   <item n="0"/> .. <item n="4"/>      <!-- ids 4..=8 -->
    /// </root>
    /// ```
    pub fn create_test_tree() -> MockTree {
        let mut nodes = vec![
            MockNodeData {
                name: "root".to_string(),
                text: "xyz".to_string(),
                attributes: vec![],
                children: vec![1, 2, 3, 4, 5, 6, 7, 8],
            },
            MockNodeData {
                name: "a".to_string(),
                text: "x".to_string(),
                attributes: vec![
                    ("id".to_string(), "1".to_string()),
                    ("class".to_string(), "hello-world".to_string()),
                ],
                children: vec![],
            },
            MockNodeData {
                name: "a".to_string(),
                text: "y".to_string(),
                attributes: vec![("id".to_string(), "2".to_string())],
                children: vec![],
            },
            MockNodeData {
                name: "b".to_string(),
                text: "z".to_string(),
                attributes: vec![("lang".to_string(), "en fr".to_string())],
                children: vec![],
            },
        ];
        for n in 0..5 {
            nodes.push(MockNodeData {
                name: "item".to_string(),
                text: String::new(),
                attributes: vec![("n".to_string(), n.to_string())],
                children: vec![],
            });
        }
        MockTree { nodes }
    }
}
