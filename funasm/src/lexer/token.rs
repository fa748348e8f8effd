//! Token definitions and classification

use logos::Logos;

/// Raw lexeme classes of a source line
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum RawToken {
    /// Run of letters, digits and underscores (identifiers and numbers)
    #[regex(r"[A-Za-z0-9_]+")]
    Word,
    /// Double-quoted string, quotes included
    #[regex(r#""[^"\n]*""#)]
    StrLit,
    /// Line comment up to the end of the line
    #[regex(r";[^\n]*")]
    Comment,
    /// Any other single character
    #[regex(r#"[^A-Za-z0-9_ \t\r\f\n";]"#)]
    Punct,
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if is_alpha(first) => chars.all(is_alphanumeric),
        _ => false,
    }
}

/// Unsigned decimal literal
pub fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_string_literal(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

/// Strip the quotes of a string literal; other tokens are returned as is
pub fn strip_literal(token: &str) -> &str {
    if is_string_literal(token) {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_tmp"));
        assert!(is_identifier("loop2"));
        assert!(!is_identifier("2loop"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_number() {
        assert!(is_number("0"));
        assert!(is_number("1234"));
        assert!(!is_number("-1"));
        assert!(!is_number("12a"));
        assert!(!is_number(""));
    }

    #[test]
    fn test_string_literal() {
        assert!(is_string_literal("\"\""));
        assert!(is_string_literal("\"hi there\""));
        assert!(!is_string_literal("\""));
        assert!(!is_string_literal("hi"));
    }

    #[test]
    fn test_strip_literal() {
        assert_eq!(strip_literal("\"hello\""), "hello");
        assert_eq!(strip_literal("\"\""), "");
        assert_eq!(strip_literal("bare"), "bare");
    }

    #[test]
    fn test_raw_token_classes() {
        let kinds: Vec<_> = RawToken::lexer("dim x = \"s\" ; note")
            .map(|t| t.ok())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(RawToken::Word),
                Some(RawToken::Word),
                Some(RawToken::Punct),
                Some(RawToken::StrLit),
                Some(RawToken::Comment),
            ]
        );
    }
}
