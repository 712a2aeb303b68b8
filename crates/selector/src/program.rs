//! The compiled, read-only selector program and its consumption cursor.

use crate::ast::{SelectorSegment, SuffixKind, SuffixValue};
use std::ops::Index;

/// An ordered sequence of compiled segments. Immutable once built: the type
/// exposes no mutating API, so the read-only guarantee holds at compile time
/// rather than as a runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorProgram {
    segments: Vec<SelectorSegment>,
    attr_getter: bool,
}

impl SelectorProgram {
    pub(crate) fn new(segments: Vec<SelectorSegment>, attr_getter: bool) -> Self {
        Self {
            segments,
            attr_getter,
        }
    }

    /// The number of segments.
    pub fn size(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Random access to a segment.
    pub fn get(&self, index: usize) -> Option<&SelectorSegment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> impl Iterator<Item = &SelectorSegment> {
        self.segments.iter()
    }

    /// True iff the whole original query began with an unescaped `@`. Governs
    /// only the final result shape: such a query always yields a single
    /// scalar (or the absent sentinel), never a collection.
    pub fn is_attribute_getter(&self) -> bool {
        self.attr_getter
    }

    /// A fresh sequential-consumption cursor over this program.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            program: self,
            pos: 0,
        }
    }
}

impl Index<usize> for SelectorProgram {
    type Output = SelectorSegment;

    fn index(&self, index: usize) -> &SelectorSegment {
        &self.segments[index]
    }
}

impl std::str::FromStr for SelectorProgram {
    type Err = crate::error::SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::compile(s)
    }
}

/// Sequential access to a program's segments. The cursor owns its position;
/// the program itself stays untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'p> {
    program: &'p SelectorProgram,
    pos: usize,
}

impl<'p> Cursor<'p> {
    /// The segment under the cursor, or `None` once exhausted.
    pub fn current(&self) -> Option<&'p SelectorSegment> {
        self.program.get(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn exhausted(&self) -> bool {
        self.pos >= self.program.size()
    }

    /// Looks up a suffix on the current segment, index sugar included.
    pub fn has_suffix(&self, kind: SuffixKind) -> Option<SuffixValue> {
        self.current().and_then(|segment| segment.suffix(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    #[test]
    fn test_size_and_indexing() {
        let program = compile("a/b[@id=\"1\"]/c:first").unwrap();
        assert_eq!(program.size(), 3);
        assert_eq!(program[0].element.as_deref(), Some("a"));
        assert_eq!(program[2].element.as_deref(), Some("c"));
        assert!(program.get(3).is_none());
    }

    #[test]
    fn test_cursor_walks_segments_in_order() {
        let program = compile("a/b/c").unwrap();
        let mut cursor = program.cursor();
        let mut names = Vec::new();
        while let Some(segment) = cursor.current() {
            names.push(segment.element.clone().unwrap());
            cursor.advance();
        }
        assert!(cursor.exhausted());
        assert_eq!(names, vec!["a", "b", "c"]);

        cursor.reset();
        assert_eq!(cursor.position(), 0);
        assert!(!cursor.exhausted());
    }

    #[test]
    fn test_has_suffix_resolves_index_sugar() {
        use crate::ast::{SuffixKind, SuffixValue};

        let program = compile("item[2]").unwrap();
        let cursor = program.cursor();
        assert_eq!(
            cursor.has_suffix(SuffixKind::Eq),
            Some(SuffixValue::Position(2))
        );
        assert_eq!(cursor.has_suffix(SuffixKind::First), None);
    }

    #[test]
    fn test_attribute_getter_flag() {
        assert!(compile("@id").unwrap().is_attribute_getter());
        assert!(!compile("a/@id").unwrap().is_attribute_getter());
        assert!(!compile(r"\@id").unwrap().is_attribute_getter());
    }
}
