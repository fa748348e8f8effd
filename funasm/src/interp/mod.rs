//! Line interpreter for funasm programs

mod error;
mod eval;
mod matcher;
mod scope;
mod stack;
mod value;

pub use error::{ErrorKind, InterpResult, Location, RuntimeError};
pub use eval::{Interpreter, Status, Warning};
pub use matcher::{LineMatcher, EOL};
pub use scope::{Frame, ScopeStack};
pub use stack::EvalStack;
pub use value::{ArrayRef, RecordRef, Tag, Value};
