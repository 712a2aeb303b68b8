//! An implementation of the `Node` contract for the `roxmltree` crate.
//!
//! Lookup is namespace agnostic: a bare name is searched across every
//! namespace in table order, so a name is found wherever it lives. Each node
//! lazily builds per-prefix child and attribute indexes on first access;
//! once built they are frozen for the node's lifetime.

use std::cell::OnceCell;
use std::rc::Rc;
use thiserror::Error;
use treeq_selector::{AttrValue, Node};

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// An ordered prefix → URI mapping, discovered once at the document root and
/// shared by every descendant node. The empty prefix is always present and
/// always maps to no URI, shadowing any declared default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: Vec<(String, Option<String>)>,
}

impl NamespaceTable {
    fn discover(doc: &roxmltree::Document<'_>) -> Self {
        let mut entries: Vec<(String, Option<String>)> = Vec::new();
        for node in doc.root().descendants().filter(|n| n.is_element()) {
            for ns in node.namespaces() {
                let prefix = ns.name().unwrap_or("");
                if !entries.iter().any(|(p, _)| p == prefix) {
                    entries.push((prefix.to_string(), Some(ns.uri().to_string())));
                }
            }
        }
        // The default prefix resolves to no URI, whatever the document
        // declared; it collects the children written without a prefix.
        match entries.iter_mut().find(|(p, _)| p.is_empty()) {
            Some(entry) => entry.1 = None,
            None => entries.push((String::new(), None)),
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prefix → URI pairs, in stable declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_deref()))
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .and_then(|(_, u)| u.as_deref())
    }

    fn position(&self, prefix: &str) -> Option<usize> {
        self.entries.iter().position(|(p, _)| p == prefix)
    }
}

/// A parsed XML document, the entry point for queries. Parsing is
/// all-or-nothing: on failure no tree surfaces at all.
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
    namespaces: Rc<NamespaceTable>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, XmlError> {
        let doc = roxmltree::Document::parse(text.trim())?;
        let namespaces = Rc::new(NamespaceTable::discover(&doc));
        log::debug!(
            "parsed document, {} namespace prefix(es) in scope",
            namespaces.len()
        );
        Ok(Self { doc, namespaces })
    }

    /// The document element, carrying the namespace table.
    pub fn root(&self) -> XmlNode<'_, 'input> {
        XmlNode::new(self.doc.root_element(), Rc::clone(&self.namespaces))
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }
}

type ChildIndex<'a, 'input> = Vec<Vec<roxmltree::Node<'a, 'input>>>;
type AttributeIndex = Vec<Vec<(String, String)>>;

/// A node of the tree. Cheap to clone; clones share the namespace table and
/// the lazily built indexes.
#[derive(Debug, Clone)]
pub struct XmlNode<'a, 'input> {
    el: roxmltree::Node<'a, 'input>,
    namespaces: Rc<NamespaceTable>,
    children: Rc<OnceCell<ChildIndex<'a, 'input>>>,
    attributes: Rc<OnceCell<AttributeIndex>>,
}

impl<'a, 'input: 'a> XmlNode<'a, 'input> {
    fn new(el: roxmltree::Node<'a, 'input>, namespaces: Rc<NamespaceTable>) -> Self {
        Self {
            el,
            namespaces,
            children: Rc::new(OnceCell::new()),
            attributes: Rc::new(OnceCell::new()),
        }
    }

    /// The namespace table this node inherited from its parent.
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// The local element name.
    pub fn name(&self) -> &'a str {
        self.el.tag_name().name()
    }

    /// A new child node receives the parent's namespace table instead of
    /// rediscovering it.
    fn adopt(&self, el: roxmltree::Node<'a, 'input>) -> Self {
        Self::new(el, Rc::clone(&self.namespaces))
    }

    /// The prefix an element or attribute was written with, resolved through
    /// the in-scope declarations. Default-namespace names come back as the
    /// empty prefix.
    fn written_prefix(&self, namespace: Option<&str>) -> &str {
        namespace
            .and_then(|uri| self.el.lookup_prefix(uri))
            .unwrap_or("")
    }

    fn child_index(&self) -> &ChildIndex<'a, 'input> {
        self.children.get_or_init(|| {
            let mut buckets: ChildIndex<'a, 'input> = vec![Vec::new(); self.namespaces.len()];
            for child in self.el.children().filter(|c| c.is_element()) {
                let prefix = match child.tag_name().namespace() {
                    None => "",
                    Some(uri) => child.lookup_prefix(uri).unwrap_or(""),
                };
                let bucket = self
                    .namespaces
                    .position(prefix)
                    .or_else(|| self.namespaces.position(""))
                    .unwrap_or(0);
                buckets[bucket].push(child);
            }
            buckets
        })
    }

    fn attribute_index(&self) -> &AttributeIndex {
        self.attributes.get_or_init(|| {
            let mut buckets: AttributeIndex = vec![Vec::new(); self.namespaces.len()];
            for attr in self.el.attributes() {
                let prefix = self.written_prefix(attr.namespace());
                let bucket = self
                    .namespaces
                    .position(prefix)
                    .or_else(|| self.namespaces.position(""))
                    .unwrap_or(0);
                buckets[bucket].push((attr.name().to_string(), attr.value().to_string()));
            }
            buckets
        })
    }
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        self.el == other.el
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

/// Splits an optionally namespace-qualified selector into prefix and local
/// name. A trailing colon degrades to a bare name.
fn split_selector(selector: &str) -> (Option<&str>, &str) {
    match selector.split_once(':') {
        Some((prefix, rest)) if rest.is_empty() => (None, prefix),
        Some((prefix, rest)) => (Some(prefix), rest),
        None => (None, selector),
    }
}

impl<'a, 'input: 'a> Node for XmlNode<'a, 'input> {
    fn children(&self, selector: Option<&str>) -> Vec<Self> {
        let buckets = self.child_index();
        let Some(selector) = selector.filter(|s| !s.is_empty()) else {
            // No namespace and no name: all children, namespace-table order
            // then document order.
            return buckets
                .iter()
                .flatten()
                .map(|&el| self.adopt(el))
                .collect();
        };

        let (prefix, name) = split_selector(selector);
        if let Some(prefix) = prefix
            && let Some(bucket) = self.namespaces.position(prefix)
        {
            return buckets[bucket]
                .iter()
                .filter(|el| el.tag_name().name() == name)
                .map(|&el| self.adopt(el))
                .collect();
        }

        // A bare name, or an unknown prefix: search every namespace in table
        // order so the name is found wherever it lives.
        buckets
            .iter()
            .flatten()
            .filter(|el| el.tag_name().name() == name)
            .map(|&el| self.adopt(el))
            .collect()
    }

    fn attribute(&self, selector: Option<&str>) -> AttrValue {
        let buckets = self.attribute_index();
        let Some(selector) = selector.filter(|s| !s.is_empty()) else {
            // The fully qualified map of every attribute, prefixed unless in
            // the default namespace.
            let mut map = Vec::new();
            for (bucket, (prefix, _)) in buckets.iter().zip(self.namespaces.entries()) {
                for (name, value) in bucket {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}:{name}")
                    };
                    map.push((key, value.clone()));
                }
            }
            return AttrValue::Map(map);
        };

        let (prefix, name) = split_selector(selector);
        if let Some(prefix) = prefix
            && let Some(bucket) = self.namespaces.position(prefix)
        {
            return buckets[bucket]
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| AttrValue::Scalar(v.clone()))
                .unwrap_or(AttrValue::Absent);
        }

        // First namespace in table order that defines the name wins.
        buckets
            .iter()
            .flatten()
            .find(|(n, _)| n == name)
            .map(|(_, v)| AttrValue::Scalar(v.clone()))
            .unwrap_or(AttrValue::Absent)
    }

    fn to_text(&self) -> String {
        self.el
            .descendants()
            .filter_map(|n| if n.is_text() { n.text() } else { None })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[XmlNode<'_, '_>]) -> Vec<String> {
        nodes.iter().map(|n| n.name().to_string()).collect()
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(XmlDocument::parse("<root><a></root>").is_err());
        assert!(XmlDocument::parse("not xml at all").is_err());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let doc = XmlDocument::parse("  <root/>  \n").unwrap();
        assert_eq!(doc.root().name(), "root");
    }

    #[test]
    fn test_children_by_name_and_all() {
        let doc = XmlDocument::parse("<root><a/><b/><a/></root>").unwrap();
        let root = doc.root();

        assert_eq!(names(&root.children(None)), vec!["a", "b", "a"]);
        assert_eq!(names(&root.children(Some("a"))), vec!["a", "a"]);
        assert!(root.children(Some("missing")).is_empty());
    }

    #[test]
    fn test_default_namespace_table_is_single_empty_prefix() {
        let doc = XmlDocument::parse("<root><a/></root>").unwrap();
        let entries: Vec<_> = doc.namespaces().entries().collect();
        assert_eq!(entries, vec![("", None)]);
    }

    #[test]
    fn test_bare_name_searches_all_namespaces_in_table_order() {
        let doc = XmlDocument::parse(
            r#"<root xmlns:one="urn:one" xmlns:two="urn:two">
                 <two:title>second</two:title>
                 <one:title>first</one:title>
               </root>"#,
        )
        .unwrap();
        let root = doc.root();

        let titles = root.children(Some("title"));
        let texts: Vec<String> = titles.iter().map(|t| t.to_text()).collect();
        // Table order (one declared before two), not document order.
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_explicit_prefix_restricts_namespace() {
        let doc = XmlDocument::parse(
            r#"<root xmlns:one="urn:one" xmlns:two="urn:two">
                 <two:title>second</two:title>
                 <one:title>first</one:title>
               </root>"#,
        )
        .unwrap();
        let root = doc.root();

        let titles = root.children(Some("one:title"));
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].to_text(), "first");
    }

    #[test]
    fn test_unknown_prefix_falls_back_to_name_search() {
        let doc = XmlDocument::parse("<root><title>t</title></root>").unwrap();
        let titles = doc.root().children(Some("bogus:title"));
        assert_eq!(titles.len(), 1);
    }

    #[test]
    fn test_default_namespace_children_are_reachable() {
        let doc = XmlDocument::parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#,
        )
        .unwrap();
        let titles = doc.root().children(Some("title"));
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].to_text(), "t");
    }

    #[test]
    fn test_attribute_scalar_and_absent() {
        let doc = XmlDocument::parse(r#"<root><a id="1"/></root>"#).unwrap();
        let a = &doc.root().children(Some("a"))[0];
        assert_eq!(a.attribute(Some("id")), AttrValue::Scalar("1".to_string()));
        assert_eq!(a.attribute(Some("missing")), AttrValue::Absent);
    }

    #[test]
    fn test_attribute_map_is_fully_qualified() {
        let doc = XmlDocument::parse(
            r#"<root xmlns:one="urn:one"><a one:id="5" kind="x"/></root>"#,
        )
        .unwrap();
        let a = &doc.root().children(Some("a"))[0];
        let AttrValue::Map(map) = a.attribute(None) else {
            panic!("expected the full attribute map");
        };
        assert_eq!(
            map,
            vec![
                ("one:id".to_string(), "5".to_string()),
                ("kind".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_prefixed_attribute_lookup() {
        let doc = XmlDocument::parse(
            r#"<root xmlns:one="urn:one"><a one:id="5" id="6"/></root>"#,
        )
        .unwrap();
        let a = &doc.root().children(Some("a"))[0];

        // Bare lookup: first namespace in table order that defines the name.
        assert_eq!(a.attribute(Some("id")), AttrValue::Scalar("5".to_string()));
        assert_eq!(
            a.attribute(Some("one:id")),
            AttrValue::Scalar("5".to_string())
        );
    }

    #[test]
    fn test_children_inherit_namespace_table() {
        let doc = XmlDocument::parse(
            r#"<root xmlns:one="urn:one"><one:a><one:b/></one:a></root>"#,
        )
        .unwrap();
        let root = doc.root();
        let a = &root.children(Some("a"))[0];
        assert_eq!(a.namespaces(), root.namespaces());

        // The grandchild is still reachable through the inherited table.
        let b = a.children(Some("one:b"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_to_text_concatenates_descendant_text() {
        let doc = XmlDocument::parse("<root><a>x<b>y</b></a>z</root>").unwrap();
        assert_eq!(doc.root().to_text(), "xyz");
        assert_eq!(doc.root().children(Some("a"))[0].to_text(), "xy");
    }
}
