//! funasm
//!
//! A line-oriented stack machine: every source line is one instruction,
//! interpreted directly with labels, variables, arrays, records and calls.

pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod program;
pub mod repl;

pub use error::{CompileError, Result};
pub use interp::{ErrorKind, Interpreter, RuntimeError, Status, Value};
pub use program::{Line, Program, Span};
