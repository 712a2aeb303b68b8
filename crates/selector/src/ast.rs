//! Defines the compiled representation of a selector query.

/// An attribute value test, one of the seven jQuery-style comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrTest {
    /// `|=` — exact match, or prefix followed by a hyphen.
    DashMatch,
    /// `*=` — substring match.
    Contains,
    /// `~=` — whitespace-delimited word match.
    WordMatch,
    /// `$=` — exact suffix match.
    SuffixMatch,
    /// `=` — exact match.
    Exact,
    /// `!=` — not equal; an absent attribute passes.
    NotEqual,
    /// `^=` — exact prefix match.
    PrefixMatch,
}

/// The attribute part of a segment: either a scalar fetch (`@name`) or a
/// bracketed filter (`[@name="value"]`, `[name]`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrStep {
    /// `@name` — fetch the attribute's value into the working list.
    Fetch(String),
    /// `[@name op "value"]` — keep only nodes whose attribute passes the test.
    /// A missing test means "attribute is present".
    Filter {
        name: String,
        test: Option<(AttrTest, String)>,
    },
}

/// A positional suffix kind, e.g. the `first` in `:first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuffixKind {
    Eq,
    First,
    Last,
    Gt,
    Lt,
    Even,
    Odd,
}

/// The argument carried by a suffix: a position for `eq`/`gt`/`lt`, a bare
/// flag for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixValue {
    Position(usize),
    Flag,
}

/// The set of suffixes attached to one segment. A suffix written twice
/// overwrites its earlier occurrence, so plain fields are sufficient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuffixSet {
    pub eq: Option<usize>,
    pub first: bool,
    pub last: bool,
    pub gt: Option<usize>,
    pub lt: Option<usize>,
    pub even: bool,
    pub odd: bool,
}

impl SuffixSet {
    pub fn is_empty(&self) -> bool {
        *self == SuffixSet::default()
    }
}

/// One compiled path-step of a selector, between `/` or whitespace separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSegment {
    /// Element name filter, e.g. `item` or `media:content`.
    pub element: Option<String>,
    /// Index sugar, e.g. the `2` in `item[2]`. Equivalent to `:eq(2)` when no
    /// explicit `eq` suffix is present.
    pub index: Option<usize>,
    /// Scalar fetch or bracketed filter. Repeated attribute captures keep the
    /// last one written.
    pub attr: Option<AttrStep>,
    pub suffixes: SuffixSet,
}

impl SelectorSegment {
    /// The effective `eq` position. An explicit `:eq(n)` suffix wins over the
    /// `[n]` index sugar.
    pub fn eq_position(&self) -> Option<usize> {
        self.suffixes.eq.or(self.index)
    }

    /// Looks up a suffix by kind, resolving the index sugar for `Eq`.
    pub fn suffix(&self, kind: SuffixKind) -> Option<SuffixValue> {
        match kind {
            SuffixKind::Eq => self.eq_position().map(SuffixValue::Position),
            SuffixKind::First => self.suffixes.first.then_some(SuffixValue::Flag),
            SuffixKind::Last => self.suffixes.last.then_some(SuffixValue::Flag),
            SuffixKind::Gt => self.suffixes.gt.map(SuffixValue::Position),
            SuffixKind::Lt => self.suffixes.lt.map(SuffixValue::Position),
            SuffixKind::Even => self.suffixes.even.then_some(SuffixValue::Flag),
            SuffixKind::Odd => self.suffixes.odd.then_some(SuffixValue::Flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_position_prefers_explicit_suffix() {
        let mut segment = SelectorSegment {
            element: Some("a".to_string()),
            index: Some(1),
            ..Default::default()
        };
        assert_eq!(segment.eq_position(), Some(1));

        segment.suffixes.eq = Some(4);
        assert_eq!(segment.eq_position(), Some(4));
    }

    #[test]
    fn test_suffix_lookup() {
        let segment = SelectorSegment {
            element: Some("a".to_string()),
            suffixes: SuffixSet {
                first: true,
                gt: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(segment.suffix(SuffixKind::First), Some(SuffixValue::Flag));
        assert_eq!(segment.suffix(SuffixKind::Gt), Some(SuffixValue::Position(2)));
        assert_eq!(segment.suffix(SuffixKind::Last), None);
        assert_eq!(segment.suffix(SuffixKind::Eq), None);
    }
}
