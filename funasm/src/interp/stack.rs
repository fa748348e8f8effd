//! Evaluation stack

use super::error::{InterpResult, RuntimeError};
use super::value::{ArrayRef, RecordRef, Tag, Value};
use std::rc::Rc;

/// LIFO sequence of values manipulated by most instructions
#[derive(Debug, Default)]
pub struct EvalStack {
    values: Vec<Value>,
}

impl EvalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> InterpResult<Value> {
        self.values.pop().ok_or_else(RuntimeError::stack_underflow)
    }

    /// Pop, failing if the value is not of the expected tag
    pub fn pop_tagged(&mut self, expected: Tag) -> InterpResult<Value> {
        self.pop_with(expected, |v| (v.tag() == expected).then(|| v.clone()))
    }

    pub fn pop_int(&mut self) -> InterpResult<i64> {
        self.pop_with(Tag::Int, |v| match v {
            Value::Int(n) => Some(*n),
            _ => None,
        })
    }

    pub fn pop_str(&mut self) -> InterpResult<Rc<String>> {
        self.pop_with(Tag::Str, |v| match v {
            Value::Str(s) => Some(Rc::clone(s)),
            _ => None,
        })
    }

    pub fn pop_array(&mut self) -> InterpResult<ArrayRef> {
        self.pop_with(Tag::Array, |v| match v {
            Value::Array(arr) => Some(Rc::clone(arr)),
            _ => None,
        })
    }

    pub fn pop_record(&mut self) -> InterpResult<RecordRef> {
        self.pop_with(Tag::Record, |v| match v {
            Value::Record(rec) => Some(Rc::clone(rec)),
            _ => None,
        })
    }

    /// Pop and borrow out the payload; handles are cloned since `Value`
    /// cannot be destructured by move
    fn pop_with<T>(
        &mut self,
        expected: Tag,
        extract: impl FnOnce(&Value) -> Option<T>,
    ) -> InterpResult<T> {
        let value = self.pop()?;
        extract(&value).ok_or_else(|| RuntimeError::type_error(expected, value.tag()))
    }

    pub fn peek(&self) -> InterpResult<&Value> {
        self.values.last().ok_or_else(RuntimeError::stack_underflow)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values from bottom to top
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}
