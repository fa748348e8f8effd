//! Program representation
//!
//! A program is the ordered list of lexed lines the interpreter walks. Labels
//! are indexed once at construction; the index keeps the first line declaring
//! each label, which is what a top-to-bottom scan would find.

mod span;

pub use span::Span;

use crate::lexer::is_identifier;
use serde::Serialize;
use std::collections::HashMap;

/// One source line: its tokens and an optional trailing comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub tokens: Vec<String>,
    /// Source span of each token (empty when the line was built by hand)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Line {
    pub fn new(tokens: Vec<String>, comment: Option<String>) -> Self {
        Line {
            tokens,
            spans: Vec::new(),
            comment,
        }
    }

    pub fn with_spans(tokens: Vec<String>, spans: Vec<Span>, comment: Option<String>) -> Self {
        debug_assert_eq!(tokens.len(), spans.len());
        Line {
            tokens,
            spans,
            comment,
        }
    }

    /// Build a line from plain tokens
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Line::new(tokens.into_iter().map(Into::into).collect(), None)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The label this line declares, if it is exactly `name :`
    pub fn label(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [name, colon] if colon == ":" && is_identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Span of the token at `cursor`, or just past the last token
    pub fn span_at(&self, cursor: usize) -> Option<Span> {
        self.spans
            .get(cursor)
            .copied()
            .or_else(|| self.spans.last().map(|span| span.after()))
    }
}

/// A lexed program with its label index
#[derive(Debug, Clone, Default)]
pub struct Program {
    lines: Vec<Line>,
    labels: HashMap<String, usize>,
}

impl Program {
    pub fn new(lines: Vec<Line>) -> Self {
        let mut program = Program::default();
        for line in lines {
            program.push_line(line);
        }
        program
    }

    /// Append a line, returning its index
    pub fn push_line(&mut self, line: Line) -> usize {
        let index = self.lines.len();
        if let Some(label) = line.label() {
            self.labels.entry(label.to_string()).or_insert(index);
        }
        self.lines.push(line);
        index
    }

    /// Remove the last line
    pub fn pop_line(&mut self) -> Option<Line> {
        let line = self.lines.pop()?;
        let index = self.lines.len();
        if let Some(label) = line.label() {
            if self.labels.get(label) == Some(&index) {
                self.labels.remove(label);
            }
        }
        Some(line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Line index of the first `name :` line
    pub fn resolve_label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

impl FromIterator<Line> for Program {
    fn from_iter<T: IntoIterator<Item = Line>>(iter: T) -> Self {
        Program::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(lines: &[&[&str]]) -> Program {
        lines.iter().map(|tokens| Line::from_tokens(tokens.iter().copied())).collect()
    }

    #[test]
    fn test_label_line() {
        assert_eq!(Line::from_tokens(["loop", ":"]).label(), Some("loop"));
        assert_eq!(Line::from_tokens(["loop", ":", "noop"]).label(), None);
        assert_eq!(Line::from_tokens(["12", ":"]).label(), None);
        assert_eq!(Line::from_tokens(["loop"]).label(), None);
    }

    #[test]
    fn test_resolve_label() {
        let prog = program(&[&["module", "m"], &["start", ":"], &["noop"], &["end", ":"]]);
        assert_eq!(prog.resolve_label("start"), Some(1));
        assert_eq!(prog.resolve_label("end"), Some(3));
        assert_eq!(prog.resolve_label("missing"), None);
    }

    #[test]
    fn test_first_label_wins() {
        let prog = program(&[&["twice", ":"], &["noop"], &["twice", ":"]]);
        assert_eq!(prog.resolve_label("twice"), Some(0));
    }

    #[test]
    fn test_pop_line_forgets_label() {
        let mut prog = program(&[&["noop"]]);
        prog.push_line(Line::from_tokens(["here", ":"]));
        assert_eq!(prog.resolve_label("here"), Some(1));
        prog.pop_line();
        assert_eq!(prog.resolve_label("here"), None);
        assert_eq!(prog.len(), 1);
    }

    #[test]
    fn test_pop_line_keeps_earlier_label() {
        let mut prog = program(&[&["here", ":"]]);
        prog.push_line(Line::from_tokens(["here", ":"]));
        prog.pop_line();
        assert_eq!(prog.resolve_label("here"), Some(0));
    }

    #[test]
    fn test_span_at() {
        let line = Line::with_spans(
            vec!["int".into(), "3".into()],
            vec![Span::new(0, 3), Span::new(4, 5)],
            None,
        );
        assert_eq!(line.span_at(1), Some(Span::new(4, 5)));
        assert_eq!(line.span_at(2), Some(Span::new(5, 5)));
        assert_eq!(Line::from_tokens(["noop"]).span_at(0), None);
    }
}
