//! Compiles raw selector text into a `SelectorProgram`.
//!
//! Grammar, per segment:
//! `segment := element? (attribute | attribute-expression)* suffix*`
//! - `element := name ('[' index ']')?`
//! - `attribute := '@' name`
//! - `attribute-expression := '[' '@'? name (test '"' value '"')? ']'`
//! - `suffix := ':eq(n)' | ':first' | ':last' | ':gt(n)' | ':lt(n)'
//!   | ':even' | ':odd'`
//!
//! Segments are separated by unescaped whitespace or `/`. A name is one or
//! more of `[A-Za-z0-9:.]` or any escaped character; an unescaped `:` belongs
//! to the name only when it does not introduce a trailing suffix chain.

use crate::ast::{AttrStep, AttrTest, SelectorSegment, SuffixSet};
use crate::error::SelectorError;
use crate::lexer::{self, Lexeme};
use crate::program::SelectorProgram;

/// Compiles raw selector text. Fails when the text cannot be split into one
/// or more segments, or when any segment does not fully match the grammar.
pub fn compile(raw: &str) -> Result<SelectorProgram, SelectorError> {
    let lexemes = lexer::lex(raw);
    if lexemes.iter().all(|l| l.is_whitespace()) {
        return Err(SelectorError::EmptyQuery);
    }

    // Computed once from the full original query, not per segment.
    let attr_getter = lexemes.first().is_some_and(|l| l.is('@'));

    let mut segments = Vec::new();
    for raw_segment in lexer::split_segments(&lexemes) {
        segments.push(SegmentParser::new(raw_segment, raw).parse()?);
    }
    log::debug!("compiled '{raw}' into {} segment(s)", segments.len());
    Ok(SelectorProgram::new(segments, attr_getter))
}

struct SegmentParser<'a> {
    input: &'a [Lexeme],
    pos: usize,
    query: &'a str,
}

impl<'a> SegmentParser<'a> {
    fn new(input: &'a [Lexeme], query: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            query,
        }
    }

    fn parse(mut self) -> Result<SelectorSegment, SelectorError> {
        if self.input.is_empty() {
            return Err(self.err("empty segment"));
        }

        let mut segment = SelectorSegment::default();

        let name = self.parse_name();
        if !name.is_empty() {
            segment.element = Some(name);
            segment.index = self.parse_index_sugar()?;
        }

        // Attribute captures repeat; the last one written wins.
        loop {
            match self.peek() {
                Some(l) if l.is('@') => {
                    self.bump();
                    let name = self.parse_name();
                    if name.is_empty() {
                        return Err(self.err("expected attribute name after '@'"));
                    }
                    segment.attr = Some(AttrStep::Fetch(name));
                }
                Some(l) if l.is('[') => {
                    segment.attr = Some(self.parse_attr_expression()?);
                }
                _ => break,
            }
        }

        self.parse_suffixes(&mut segment.suffixes)?;

        if self.pos < self.input.len() {
            let leftover = lexer::render(&self.input[self.pos..]);
            return Err(self.err(format!("unexpected '{leftover}'")));
        }
        Ok(segment)
    }

    // --- Element and names ---

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(l) = self.peek() {
            if l.escaped {
                name.push(l.ch);
                self.bump();
            } else if l.ch.is_ascii_alphanumeric() || l.ch == '.' {
                name.push(l.ch);
                self.bump();
            } else if l.ch == ':' && !is_suffix_chain(&self.input[self.pos..]) {
                name.push(l.ch);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    /// A bracket holding only digits right after an element name is the
    /// index sugar for `:eq(n)`; anything else is an attribute expression.
    fn parse_index_sugar(&mut self) -> Result<Option<usize>, SelectorError> {
        if !self.peek().is_some_and(|l| l.is('[')) {
            return Ok(None);
        }
        let mut probe = self.pos + 1;
        let digits_start = probe;
        while probe < self.input.len()
            && !self.input[probe].escaped
            && self.input[probe].ch.is_ascii_digit()
        {
            probe += 1;
        }
        if probe == digits_start || !self.input.get(probe).is_some_and(|l| l.is(']')) {
            return Ok(None);
        }
        let digits: String = self.input[digits_start..probe].iter().map(|l| l.ch).collect();
        self.pos = probe + 1;
        let index = digits
            .parse::<usize>()
            .map_err(|_| self.err(format!("invalid index '{digits}'")))?;
        Ok(Some(index))
    }

    // --- Attribute expressions ---

    fn parse_attr_expression(&mut self) -> Result<AttrStep, SelectorError> {
        self.bump(); // '['
        if self.peek().is_some_and(|l| l.is('@')) {
            self.bump();
        }
        let name = self.parse_name();
        if name.is_empty() {
            return Err(self.err("expected attribute name in expression"));
        }

        let test = if self.peek().is_some_and(|l| l.is(']')) {
            None
        } else {
            let op = self.parse_test_operator()?;
            let value = self.parse_quoted_value()?;
            Some((op, value))
        };

        if !self.peek().is_some_and(|l| l.is(']')) {
            return Err(self.err("expected ']' to close attribute expression"));
        }
        self.bump();
        Ok(AttrStep::Filter { name, test })
    }

    fn parse_test_operator(&mut self) -> Result<AttrTest, SelectorError> {
        let op = if self.at_pair('|') {
            AttrTest::DashMatch
        } else if self.at_pair('*') {
            AttrTest::Contains
        } else if self.at_pair('~') {
            AttrTest::WordMatch
        } else if self.at_pair('$') {
            AttrTest::SuffixMatch
        } else if self.at_pair('!') {
            AttrTest::NotEqual
        } else if self.at_pair('^') {
            AttrTest::PrefixMatch
        } else if self.peek().is_some_and(|l| l.is('=')) {
            self.bump();
            return Ok(AttrTest::Exact);
        } else {
            return Err(self.err("expected a test operator"));
        };
        self.bump();
        self.bump();
        Ok(op)
    }

    /// True when the next two lexemes are `first` followed by `=`, both
    /// unescaped.
    fn at_pair(&self, first: char) -> bool {
        self.peek().is_some_and(|l| l.is(first))
            && self.input.get(self.pos + 1).is_some_and(|l| l.is('='))
    }

    fn parse_quoted_value(&mut self) -> Result<String, SelectorError> {
        if !self.peek().is_some_and(|l| l.is('"')) {
            return Err(self.err("expected a double-quoted value"));
        }
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated quoted value")),
                Some(l) if l.is('"') => {
                    self.bump();
                    return Ok(value);
                }
                Some(l) => {
                    value.push(l.ch);
                    self.bump();
                }
            }
        }
    }

    // --- Suffixes ---

    fn parse_suffixes(&mut self, suffixes: &mut SuffixSet) -> Result<(), SelectorError> {
        while self.peek().is_some_and(|l| l.is(':')) {
            self.bump();
            let keyword = self.parse_keyword();
            match keyword.as_str() {
                "first" => suffixes.first = true,
                "last" => suffixes.last = true,
                "even" => suffixes.even = true,
                "odd" => suffixes.odd = true,
                "eq" => suffixes.eq = Some(self.parse_position_argument()?),
                "gt" => suffixes.gt = Some(self.parse_position_argument()?),
                "lt" => suffixes.lt = Some(self.parse_position_argument()?),
                _ => return Err(self.err(format!("unknown suffix ':{keyword}'"))),
            }
        }
        Ok(())
    }

    fn parse_keyword(&mut self) -> String {
        let mut keyword = String::new();
        while let Some(l) = self.peek() {
            if !l.escaped && l.ch.is_ascii_lowercase() {
                keyword.push(l.ch);
                self.bump();
            } else {
                break;
            }
        }
        keyword
    }

    fn parse_position_argument(&mut self) -> Result<usize, SelectorError> {
        if !self.peek().is_some_and(|l| l.is('(')) {
            return Err(self.err("expected '(' after positional suffix"));
        }
        self.bump();
        let mut digits = String::new();
        while let Some(l) = self.peek() {
            if !l.escaped && l.ch.is_ascii_digit() {
                digits.push(l.ch);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(self.err("expected a position argument"));
        }
        if !self.peek().is_some_and(|l| l.is(')')) {
            return Err(self.err("expected ')' after position argument"));
        }
        self.bump();
        digits
            .parse::<usize>()
            .map_err(|_| self.err(format!("position '{digits}' is out of range")))
    }

    // --- Plumbing ---

    fn peek(&self) -> Option<Lexeme> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn err(&self, message: impl Into<String>) -> SelectorError {
        SelectorError::syntax(lexer::render(self.input), self.query, message)
    }
}

/// True when the lexemes form a complete suffix chain (`(:suffix)+` to the
/// end). Used to decide whether an unescaped `:` still belongs to a name.
fn is_suffix_chain(rest: &[Lexeme]) -> bool {
    let mut pos = 0;
    if rest.is_empty() {
        return false;
    }
    while pos < rest.len() {
        if !rest[pos].is(':') {
            return false;
        }
        pos += 1;
        let start = pos;
        while pos < rest.len() && !rest[pos].escaped && rest[pos].ch.is_ascii_lowercase() {
            pos += 1;
        }
        let keyword: String = rest[start..pos].iter().map(|l| l.ch).collect();
        match keyword.as_str() {
            "first" | "last" | "even" | "odd" => {}
            "eq" | "gt" | "lt" => {
                if !rest.get(pos).is_some_and(|l| l.is('(')) {
                    return false;
                }
                pos += 1;
                let digits_start = pos;
                while pos < rest.len() && !rest[pos].escaped && rest[pos].ch.is_ascii_digit() {
                    pos += 1;
                }
                if pos == digits_start || !rest.get(pos).is_some_and(|l| l.is(')')) {
                    return false;
                }
                pos += 1;
            }
            _ => return false,
        }
    }
    true
}
