//! The resolution engine: consumes a compiled program against a working set
//! of nodes, producing matches.

use crate::ast::{AttrStep, AttrTest, SelectorSegment};
use crate::node::{AttrValue, Node};
use crate::operators;
use crate::program::{Cursor, SelectorProgram};

/// One element of a working list or result collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<N> {
    Node(N),
    Scalar(String),
    /// The absent sentinel: a missing attribute. Not an error.
    Absent,
}

impl<N> Item<N> {
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Item::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Item::Absent)
    }
}

/// The shape of a resolved query: a collection for ordinary selectors, a
/// single scalar (or absent) for attribute-getter queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<N> {
    Set(Vec<Item<N>>),
    Scalar(Option<String>),
}

impl<N> Resolution<N> {
    /// The collection items; a scalar resolution is viewed as a one- or
    /// zero-item slice would be, so use [`Resolution::into_first`] for it.
    pub fn items(&self) -> &[Item<N>] {
        match self {
            Resolution::Set(items) => items,
            Resolution::Scalar(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolution::Set(items) => items.len(),
            Resolution::Scalar(value) => usize::from(value.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first item, or the absent sentinel.
    pub fn into_first(self) -> Item<N> {
        match self {
            Resolution::Set(items) => items.into_iter().next().unwrap_or(Item::Absent),
            Resolution::Scalar(Some(value)) => Item::Scalar(value),
            Resolution::Scalar(None) => Item::Absent,
        }
    }
}

/// Resolves a compiled program against a root node. An empty program yields
/// an empty collection; `limit` truncates the final collection in order.
pub fn resolve<N: Node>(
    root: &N,
    program: &SelectorProgram,
    limit: Option<usize>,
) -> Resolution<N> {
    if program.is_empty() {
        return Resolution::Set(Vec::new());
    }
    log::debug!(
        "resolving {} segment(s), attribute getter: {}",
        program.size(),
        program.is_attribute_getter()
    );

    let mut cursor = program.cursor();
    let seed = vec![Item::Node(root.clone())];
    let resolved = resolve_step(&mut cursor, program.is_attribute_getter(), seed);

    match resolved {
        Resolution::Set(mut items) => {
            if let Some(limit) = limit {
                items.truncate(limit);
            }
            Resolution::Set(items)
        }
        scalar => scalar,
    }
}

/// Applies the segment under the cursor to the working list, then recurses on
/// the remaining segments. Recursion depth equals the segment count.
fn resolve_step<N: Node>(
    cursor: &mut Cursor<'_>,
    attr_getter: bool,
    mut working: Vec<Item<N>>,
) -> Resolution<N> {
    let Some(segment) = cursor.current() else {
        return Resolution::Set(working);
    };

    if let Some(name) = &segment.element {
        working = collect_children(&working, name);
        if working.is_empty() {
            return Resolution::Set(Vec::new());
        }
    }

    match &segment.attr {
        Some(AttrStep::Fetch(name)) => {
            let aggregate = collect_attributes(&working, name);
            if attr_getter {
                // An attribute getter always yields a single scalar (or the
                // absent sentinel), overriding suffixes and later segments.
                let first = match aggregate.into_iter().next() {
                    Some(Item::Scalar(value)) => Some(value),
                    _ => None,
                };
                return Resolution::Scalar(first);
            }
            working = aggregate;
        }
        Some(AttrStep::Filter { name, test }) => {
            working = filter_by_attribute(working, name, test.as_ref());
        }
        None => {}
    }

    working = apply_suffixes(working, segment);
    if working.is_empty() {
        return Resolution::Set(Vec::new());
    }

    cursor.advance();
    if cursor.exhausted() {
        Resolution::Set(working)
    } else {
        resolve_step(cursor, attr_getter, working)
    }
}

/// Stage 1: unions matching children over the node items of the working
/// list, preserving parent order, then within-parent document order.
fn collect_children<N: Node>(working: &[Item<N>], name: &str) -> Vec<Item<N>> {
    let mut aggregate = Vec::new();
    for item in working {
        if let Item::Node(node) = item {
            aggregate.extend(node.children(Some(name)).into_iter().map(Item::Node));
        }
    }
    aggregate
}

/// Stage 2: aggregates attribute values over the node items. A whole-map
/// result is flattened into the aggregate; a single value (or the absent
/// sentinel) is appended as-is.
fn collect_attributes<N: Node>(working: &[Item<N>], name: &str) -> Vec<Item<N>> {
    let mut aggregate = Vec::new();
    for item in working {
        if let Item::Node(node) = item {
            match node.attribute(Some(name)) {
                AttrValue::Map(entries) => {
                    aggregate.extend(entries.into_iter().map(|(_, v)| Item::Scalar(v)));
                }
                AttrValue::Scalar(value) => aggregate.push(Item::Scalar(value)),
                AttrValue::Absent => aggregate.push(Item::Absent),
            }
        }
    }
    aggregate
}

/// Stage 3: retains node items whose named attribute passes the test. A
/// test-less expression is a presence filter.
fn filter_by_attribute<N: Node>(
    working: Vec<Item<N>>,
    name: &str,
    test: Option<&(AttrTest, String)>,
) -> Vec<Item<N>> {
    working
        .into_iter()
        .filter(|item| {
            let actual = item
                .as_node()
                .and_then(|node| match node.attribute(Some(name)) {
                    AttrValue::Scalar(value) => Some(value),
                    _ => None,
                });
            match test {
                Some((op, expected)) => operators::matches(*op, actual.as_deref(), expected),
                None => actual.is_some(),
            }
        })
        .collect()
}

/// Stage 4: positional suffix filters, in fixed priority. `eq` (or the index
/// sugar) selects exactly one position, then `first`/`last`, then ranges,
/// then parity.
fn apply_suffixes<N: Node>(mut working: Vec<Item<N>>, segment: &SelectorSegment) -> Vec<Item<N>> {
    if let Some(position) = segment.eq_position() {
        working = if position < working.len() {
            vec![working.swap_remove(position)]
        } else {
            Vec::new()
        };
    }
    if segment.suffixes.first {
        working.truncate(1);
    }
    if segment.suffixes.last {
        let len = working.len();
        if len > 1 {
            working = vec![working.swap_remove(len - 1)];
        }
    }
    if let Some(position) = segment.suffixes.gt {
        working = working
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| (i > position).then_some(item))
            .collect();
    }
    if let Some(position) = segment.suffixes.lt {
        working.truncate(position);
    }
    if segment.suffixes.even {
        working = keep_parity(working, 0);
    }
    if segment.suffixes.odd {
        working = keep_parity(working, 1);
    }
    working
}

fn keep_parity<N>(working: Vec<Item<N>>, parity: usize) -> Vec<Item<N>> {
    working
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| (i % 2 == parity).then_some(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::{MockNode, create_test_tree};
    use crate::parser::compile;

    fn get<'a>(root: MockNode<'a>, selector: &str) -> Resolution<MockNode<'a>> {
        resolve(&root, &compile(selector).unwrap(), None)
    }

    fn attr_values(resolution: &Resolution<MockNode<'_>>, name: &str) -> Vec<String> {
        resolution
            .items()
            .iter()
            .map(|item| match item.as_node().unwrap().attribute(Some(name)) {
                AttrValue::Scalar(v) => v,
                other => panic!("expected a scalar, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_element_step_collects_matching_children() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let result = get(root, "a");
        assert_eq!(result.len(), 2);
        assert_eq!(attr_values(&result, "id"), vec!["1", "2"]);

        let result = get(root, "missing");
        assert!(result.is_empty());
    }

    #[test]
    fn test_attribute_fetch_aggregates_values() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let result = get(root, "a/@id");
        assert_eq!(
            result.items(),
            &[
                Item::Scalar("1".to_string()),
                Item::Scalar("2".to_string())
            ]
        );
    }

    #[test]
    fn test_attribute_fetch_keeps_absent_sentinel() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        // Only the first <a> carries a class attribute.
        let result = get(root, "a/@class");
        assert_eq!(
            result.items(),
            &[Item::Scalar("hello-world".to_string()), Item::Absent]
        );
    }

    #[test]
    fn test_attribute_getter_always_scalar() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let a1 = MockNode { id: 1, tree: &tree };

        assert_eq!(
            resolve(&a1, &compile("@id").unwrap(), None),
            Resolution::Scalar(Some("1".to_string()))
        );
        assert_eq!(
            resolve(&root, &compile("@nonexistent").unwrap(), None),
            Resolution::Scalar(None)
        );
        // Suffixes and match count do not change the shape.
        assert!(matches!(
            resolve(&a1, &compile("@id:last").unwrap(), None),
            Resolution::Scalar(Some(_))
        ));
    }

    #[test]
    fn test_attribute_expression_filters() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let result = get(root, r#"a[@id="2"]"#);
        assert_eq!(attr_values(&result, "id"), vec!["2"]);

        let result = get(root, r#"a[@class^="hello"]"#);
        assert_eq!(attr_values(&result, "id"), vec!["1"]);

        // Absent attribute passes `!=`.
        let result = get(root, r#"a[@class!="nope"]"#);
        assert_eq!(attr_values(&result, "id"), vec!["1", "2"]);

        // Presence filter.
        let result = get(root, "a[class]");
        assert_eq!(attr_values(&result, "id"), vec!["1"]);
    }

    #[test]
    fn test_index_sugar_equivalent_to_eq_suffix() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        assert_eq!(get(root, "item[2]"), get(root, "item:eq(2)"));
        assert_eq!(attr_values(&get(root, "item[2]"), "n"), vec!["2"]);
    }

    #[test]
    fn test_suffix_semantics_on_five_items() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let cases = [
            (":first", vec!["0"]),
            (":last", vec!["4"]),
            (":gt(2)", vec!["3", "4"]),
            (":lt(2)", vec!["0", "1"]),
            (":even", vec!["0", "2", "4"]),
            (":odd", vec!["1", "3"]),
        ];
        for (suffix, expected) in cases {
            let result = get(root, &format!("item{suffix}"));
            assert_eq!(attr_values(&result, "n"), expected, "suffix {suffix}");
        }

        assert!(get(root, "item:eq(9)").is_empty());
    }

    #[test]
    fn test_short_circuit_on_empty_working_list() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        // The second segment would panic the mock if it were reached with a
        // bogus working list; an empty union must return immediately.
        let result = get(root, "missing/item");
        assert!(result.is_empty());

        let result = get(root, r#"a[@id="9"]/item"#);
        assert!(result.is_empty());
    }

    #[test]
    fn test_limit_truncates_in_order() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let result = resolve(&root, &compile("item").unwrap(), Some(2));
        assert_eq!(attr_values(&result, "n"), vec!["0", "1"]);
    }

    #[test]
    fn test_empty_program_returns_empty_collection() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let program = SelectorProgram::new(Vec::new(), false);
        assert!(resolve(&root, &program, None).is_empty());
    }

    #[test]
    fn test_first_returns_head_or_absent() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        let first = root.first("a/@id").unwrap();
        assert_eq!(first.as_scalar(), Some("1"));

        let first = root.first("missing").unwrap();
        assert!(first.is_absent());
    }

    #[test]
    fn test_scalars_do_not_survive_element_step() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };

        // After fetching scalars, a further element step has no node items
        // to search and yields an empty collection.
        let result = get(root, "a/@id/item");
        assert!(result.is_empty());
    }
}
