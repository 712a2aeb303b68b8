//! A one-pass, escape-aware lexer for selector text.
//!
//! A backslash before any reserved character marks it as literal: the
//! character loses its grammatical role but survives verbatim into compiled
//! fields. A backslash before anything else is an ordinary character.

/// The reserved characters of the selector grammar. Only these can be
/// backslash-escaped.
pub const RESERVED: &[char] = &[
    '#', ';', '&', ',', '.', '+', '*', '~', '\'', ':', '"', '!', '^', '$', '[', ']', '(', ')',
    '=', '>', '|', '/', '@', ' ',
];

/// One lexed character of a selector. `escaped` characters carry no
/// grammatical meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub ch: char,
    pub escaped: bool,
}

impl Lexeme {
    /// True when this lexeme is the given character in its grammatical role.
    pub fn is(&self, ch: char) -> bool {
        !self.escaped && self.ch == ch
    }

    pub fn is_whitespace(&self) -> bool {
        !self.escaped && self.ch.is_whitespace()
    }
}

/// Lexes a raw selector into characters, resolving backslash escapes.
pub fn lex(raw: &str) -> Vec<Lexeme> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && RESERVED.contains(&next)
        {
            chars.next();
            out.push(Lexeme {
                ch: next,
                escaped: true,
            });
        } else {
            out.push(Lexeme { ch, escaped: false });
        }
    }
    out
}

/// Renders a lexed slice back to source text, re-inserting backslashes, for
/// error messages.
pub fn render(lexemes: &[Lexeme]) -> String {
    let mut out = String::with_capacity(lexemes.len());
    for lexeme in lexemes {
        if lexeme.escaped {
            out.push('\\');
        }
        out.push(lexeme.ch);
    }
    out
}

/// Splits a lexed selector into raw segments.
///
/// A separator is either a run of unescaped whitespace or a single unescaped
/// `/` optionally surrounded by whitespace. A single leading `/` is tolerated
/// and ignored; anything producing an empty segment elsewhere is left for the
/// parser to reject as an empty remainder.
pub fn split_segments(lexemes: &[Lexeme]) -> Vec<&[Lexeme]> {
    let mut segments = Vec::new();
    let mut pos = 0;

    // Leading whitespace and at most one leading slash.
    while pos < lexemes.len() && lexemes[pos].is_whitespace() {
        pos += 1;
    }
    if pos < lexemes.len() && lexemes[pos].is('/') {
        pos += 1;
        while pos < lexemes.len() && lexemes[pos].is_whitespace() {
            pos += 1;
        }
    }

    let mut start = pos;
    while pos < lexemes.len() {
        if lexemes[pos].is_whitespace() || lexemes[pos].is('/') {
            segments.push(&lexemes[start..pos]);
            // Consume one separator: whitespace, optionally one slash,
            // optionally more whitespace.
            while pos < lexemes.len() && lexemes[pos].is_whitespace() {
                pos += 1;
            }
            if pos < lexemes.len() && lexemes[pos].is('/') {
                pos += 1;
                while pos < lexemes.len() && lexemes[pos].is_whitespace() {
                    pos += 1;
                }
            }
            start = pos;
        } else {
            pos += 1;
        }
    }
    segments.push(&lexemes[start..pos]);
    segments
}
