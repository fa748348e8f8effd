//! Runtime errors for the interpreter

use super::value::Tag;
use std::fmt;

/// Where a runtime error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number
    pub line: usize,
    /// 1-based token cursor position
    pub column: usize,
}

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    location: Option<Location>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Line does not match the instruction grammar
    Parse,
    /// Unknown or redeclared variable, label, field or module name
    Name,
    /// Operand or assignment of the wrong tag
    Type,
    /// Out of range index, empty stack, return without call
    Bounds,
    /// Division by zero or overflow
    Arithmetic,
    /// Output could not be written
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "Parse",
            ErrorKind::Name => "Name",
            ErrorKind::Type => "Type",
            ErrorKind::Bounds => "Bounds",
            ErrorKind::Arithmetic => "Arithmetic",
            ErrorKind::Io => "IO",
        };
        f.write_str(name)
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn expected(pattern: &str) -> Self {
        Self::parse(format!("expected [{pattern}]"))
    }

    pub fn unknown_command(command: &str) -> Self {
        Self::parse(format!("unknown command [{command}]"))
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("unknown variable name [{name}]"))
    }

    pub fn redeclared(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("redim of [{name}]"))
    }

    pub fn unknown_label(label: &str) -> Self {
        Self::new(ErrorKind::Name, format!("unknown label [{label}]"))
    }

    pub fn unknown_field(field: &str) -> Self {
        Self::new(ErrorKind::Name, format!("unknown record field [{field}]"))
    }

    pub fn module_redefined() -> Self {
        Self::new(ErrorKind::Name, "module name redefined")
    }

    pub fn no_local_frame() -> Self {
        Self::new(ErrorKind::Name, "local scope used outside of a call")
    }

    pub fn type_error(expected: Tag, got: Tag) -> Self {
        Self::new(
            ErrorKind::Type,
            format!("type error: expected {expected}, got {got}"),
        )
    }

    pub fn stack_underflow() -> Self {
        Self::new(ErrorKind::Bounds, "evaluation stack is empty")
    }

    pub fn empty_array() -> Self {
        Self::new(ErrorKind::Bounds, "pop from empty array")
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::Bounds,
            format!("index {index} out of bounds for length {len}"),
        )
    }

    pub fn return_without_call() -> Self {
        Self::new(ErrorKind::Bounds, "return without active call")
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::Arithmetic, "division by zero")
    }

    pub fn overflow(op: &str) -> Self {
        Self::new(ErrorKind::Arithmetic, format!("integer overflow in {op}"))
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::Io, format!("IO error: {msg}"))
    }

    /// Attach the failing position, keeping an earlier one if present
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location.get_or_insert(Location { line, column });
        self
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(Location { line, column }) => {
                write!(f, "{} (line {line}, {column})", self.message)
            }
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_variable() {
        let err = RuntimeError::undefined_variable("foo");
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.message, "unknown variable name [foo]");
    }

    #[test]
    fn test_type_error_message_format() {
        let err = RuntimeError::type_error(Tag::Int, Tag::Str);
        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.message, "type error: expected int, got string");
    }

    #[test]
    fn test_index_out_of_bounds_negative() {
        let err = RuntimeError::index_out_of_bounds(-1, 5);
        assert_eq!(err.kind, ErrorKind::Bounds);
        assert!(err.message.contains("-1"));
        assert!(err.message.contains("5"));
    }

    #[test]
    fn test_display_without_location() {
        let err = RuntimeError::division_by_zero();
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn test_display_with_location() {
        let err = RuntimeError::division_by_zero().at(4, 2);
        assert_eq!(err.to_string(), "division by zero (line 4, 2)");
        assert_eq!(err.location(), Some(Location { line: 4, column: 2 }));
    }

    #[test]
    fn test_first_location_sticks() {
        let err = RuntimeError::stack_underflow().at(3, 1).at(9, 9);
        assert_eq!(err.location(), Some(Location { line: 3, column: 1 }));
    }

    #[test]
    fn test_error_kinds_distinct() {
        let kinds = [
            RuntimeError::expected("$eol").kind,
            RuntimeError::redeclared("x").kind,
            RuntimeError::type_error(Tag::Array, Tag::Record).kind,
            RuntimeError::return_without_call().kind,
            RuntimeError::overflow("add").kind,
            RuntimeError::io_error("closed").kind,
        ];
        for i in 0..kinds.len() {
            for j in (i + 1)..kinds.len() {
                assert_ne!(kinds[i], kinds[j]);
            }
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = RuntimeError::division_by_zero();
        let std_err: &dyn std::error::Error = &err;
        assert!(std_err.source().is_none());
    }
}
