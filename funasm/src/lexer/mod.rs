//! Line lexer implementation using logos
//!
//! Each source line is scanned on its own: words (identifiers and numbers),
//! double-quoted strings and single punctuation characters become tokens, a
//! `;` starts a comment that runs to the end of the line.

mod token;

pub use token::{is_identifier, is_number, is_string_literal, strip_literal, RawToken};

use crate::error::{CompileError, Result};
use crate::program::{Line, Program, Span};
use logos::Logos;

/// Tokenize a whole source text into a program
pub fn tokenize(source: &str) -> Result<Program> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let text = raw.trim_end_matches(['\n', '\r']);
        lines.push(tokenize_line(text, offset, index + 1)?);
        offset += raw.len();
    }

    Ok(Program::new(lines))
}

/// Tokenize one line; `offset` is the byte position of the line in the source
/// and `line_no` its 1-based number, both used for error reporting.
pub fn tokenize_line(text: &str, offset: usize, line_no: usize) -> Result<Line> {
    let mut tokens = Vec::new();
    let mut spans = Vec::new();
    let mut comment = None;
    let mut lexer = RawToken::lexer(text);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(offset + range.start, offset + range.end);
        match result {
            Ok(RawToken::Comment) => {
                comment = Some(lexer.slice().to_string());
                break;
            }
            Ok(_) => {
                tokens.push(lexer.slice().to_string());
                spans.push(span);
            }
            Err(()) => {
                let message = if lexer.slice().starts_with('"') {
                    "unterminated string literal".to_string()
                } else {
                    format!("unexpected character: {:?}", lexer.slice())
                };
                return Err(CompileError::lexer(message, line_no, span));
            }
        }
    }

    Ok(Line::with_spans(tokens, spans, comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(source: &str) -> Vec<Vec<String>> {
        tokenize(source)
            .unwrap()
            .lines()
            .iter()
            .map(|line| line.tokens.clone())
            .collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_blank_line() {
        let prog = tokenize("\n   \n").unwrap();
        assert_eq!(prog.len(), 2);
        assert!(prog.lines().iter().all(Line::is_empty));
    }

    #[test]
    fn test_tokenize_words() {
        assert_eq!(tokens_of("module test"), vec![vec!["module", "test"]]);
    }

    #[test]
    fn test_tokenize_punctuation_splits() {
        assert_eq!(tokens_of("dim arr []"), vec![vec!["dim", "arr", "[", "]"]]);
        assert_eq!(tokens_of("loop:"), vec![vec!["loop", ":"]]);
        assert_eq!(tokens_of("int -5"), vec![vec!["int", "-", "5"]]);
    }

    #[test]
    fn test_tokenize_string_literal_is_one_token() {
        assert_eq!(
            tokens_of(r#"str "hello; world""#),
            vec![vec!["str", "\"hello; world\""]]
        );
    }

    #[test]
    fn test_tokenize_comment() {
        let prog = tokenize("add ; sum them").unwrap();
        let line = prog.line(0).unwrap();
        assert_eq!(line.tokens, vec!["add"]);
        assert_eq!(line.comment.as_deref(), Some("; sum them"));
    }

    #[test]
    fn test_tokenize_crlf() {
        assert_eq!(tokens_of("noop\r\nret\r\n"), vec![vec!["noop"], vec!["ret"]]);
    }

    #[test]
    fn test_tokenize_spans() {
        let prog = tokenize("noop\nint 42").unwrap();
        let line = prog.line(1).unwrap();
        assert_eq!(line.spans, vec![Span::new(5, 8), Span::new(9, 11)]);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize("module m\nstr \"oops").unwrap_err();
        match err {
            CompileError::Lexer { line, ref message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("expected lexer error, got {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_labels_indexed() {
        let prog = tokenize("module m\nstart:\njmp start").unwrap();
        assert_eq!(prog.resolve_label("start"), Some(1));
    }
}
