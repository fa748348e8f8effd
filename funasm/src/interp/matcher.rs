//! Line matcher
//!
//! Instructions are recognized by trial patterns instead of a grammar. A
//! pattern is a space separated list of atoms: a literal token, or one of the
//! classes `$identifier`, `$number`, `$string` and `$eol`. A failed match
//! leaves the cursor where it was, so handlers try the longer alternative
//! first (`local $identifier` before `$identifier`).

use super::error::{InterpResult, RuntimeError};
use crate::lexer::{is_identifier, is_number, is_string_literal};

/// Lexeme recorded for a matched `$eol`
pub const EOL: &str = "<eol>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom<'p> {
    Identifier,
    Number,
    Str,
    Eol,
    Literal(&'p str),
}

impl<'p> Atom<'p> {
    fn parse(atom: &'p str) -> Self {
        match atom {
            "$identifier" => Atom::Identifier,
            "$number" => Atom::Number,
            "$string" => Atom::Str,
            "$eol" => Atom::Eol,
            literal => Atom::Literal(literal),
        }
    }
}

/// Cursor over the tokens of a single line
#[derive(Debug)]
pub struct LineMatcher<'a> {
    tokens: &'a [String],
    pos: usize,
    matched: Vec<&'a str>,
}

impl<'a> LineMatcher<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        LineMatcher {
            tokens,
            pos: 0,
            matched: Vec::new(),
        }
    }

    /// Current cursor position (0-based token index)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Take the next token unconditionally
    pub fn advance(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    /// Match `pattern` at the cursor. On success the cursor moves past it and
    /// the matched lexemes replace the previous ones; on failure nothing
    /// changes.
    pub fn accept(&mut self, pattern: &str) -> bool {
        debug_assert!(!pattern.trim().is_empty(), "empty pattern");

        let start = self.pos;
        let mut matched = Vec::new();
        for atom in pattern.split_whitespace().map(Atom::parse) {
            match self.match_next(atom) {
                Some(lexeme) => {
                    matched.push(lexeme);
                    self.pos += 1;
                }
                None => {
                    self.pos = start;
                    return false;
                }
            }
        }
        self.matched = matched;
        true
    }

    /// `accept`, failing with a parse error
    pub fn expect(&mut self, pattern: &str) -> InterpResult<()> {
        if self.accept(pattern) {
            Ok(())
        } else {
            Err(RuntimeError::expected(pattern))
        }
    }

    /// Lexemes of the last successful match, concatenated
    pub fn last(&self) -> String {
        self.matched.concat()
    }

    /// One lexeme of the last successful match
    pub fn last_at(&self, index: usize) -> InterpResult<&'a str> {
        self.matched
            .get(index)
            .copied()
            .ok_or_else(|| RuntimeError::parse(format!("no matched token at {index}")))
    }

    fn match_next(&self, atom: Atom<'_>) -> Option<&'a str> {
        // past the last token every further `$eol` still matches
        let Some(token) = self.tokens.get(self.pos) else {
            return (atom == Atom::Eol).then_some(EOL);
        };
        let ok = match atom {
            Atom::Identifier => is_identifier(token),
            Atom::Number => is_number(token),
            Atom::Str => is_string_literal(token),
            Atom::Eol => false,
            Atom::Literal(literal) => literal == token.as_str(),
        };
        ok.then_some(token.as_str())
    }
}
