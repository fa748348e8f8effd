//! Error types and reporting

use crate::interp::RuntimeError;
use crate::program::{Program, Span};
use std::io;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised before a program starts running
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error on line {line}: {message}")]
    Lexer {
        message: String,
        line: usize,
        span: Span,
    },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Config error: {message}")]
    Config { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            line,
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } => Some(*span),
            Self::Io { .. } | Self::Config { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Io { message } => message,
            Self::Config { message } => message,
        }
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        CompileError::io_error(err.to_string())
    }
}

/// Report a load-time error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) -> io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        CompileError::Lexer { .. } => "Lexer",
        CompileError::Io { .. } => "IO",
        CompileError::Config { .. } => "Config",
    };

    if let Some(span) = error.span() {
        Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source)))
    } else {
        Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

/// Report a runtime failure, pointing at the token the cursor stopped on
pub fn report_runtime_error(
    filename: &str,
    source: &str,
    program: &Program,
    error: &RuntimeError,
) -> io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.location().and_then(|loc| {
        program
            .line(loc.line.saturating_sub(1))
            .and_then(|line| line.span_at(loc.column.saturating_sub(1)))
    });

    match span {
        Some(span) => Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{} error", error.kind))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&error.message)
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source))),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(error.to_string())
            .finish()
            .eprint((filename, Source::from(source))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_display() {
        let err = CompileError::lexer("unterminated string literal", 4, Span::new(10, 14));
        assert_eq!(
            err.to_string(),
            "Lexer error on line 4: unterminated string literal"
        );
        assert_eq!(err.span(), Some(Span::new(10, 14)));
    }

    #[test]
    fn test_io_error_from() {
        let err: CompileError = io::Error::new(io::ErrorKind::NotFound, "missing.fa").into();
        assert!(matches!(err, CompileError::Io { .. }));
        assert!(err.message().contains("missing.fa"));
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_config_error_display() {
        let err = CompileError::config_error("unknown field `speed`");
        assert_eq!(err.to_string(), "Config error: unknown field `speed`");
    }
}
