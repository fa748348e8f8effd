//! Runtime values for the interpreter

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an array's storage
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Shared handle to a record's fields
pub type RecordRef = Rc<RefCell<HashMap<String, Value>>>;

/// Runtime kind of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Int,
    Str,
    Array,
    Record,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Int => "int",
            Tag::Str => "string",
            Tag::Array => "array",
            Tag::Record => "record",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value
///
/// Cloning an `Array` or `Record` clones the handle, so every clone aliases
/// the same storage.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// Immutable text
    Str(Rc<String>),
    /// Growable array, homogeneous once non-empty
    Array(ArrayRef),
    /// Field name to value mapping
    Record(RecordRef),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn empty_array() -> Self {
        Value::Array(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn empty_record() -> Self {
        Value::Record(Rc::new(RefCell::new(HashMap::new())))
    }

    pub fn tag(&self) -> Tag {
        match self {
            Value::Int(_) => Tag::Int,
            Value::Str(_) => Tag::Str,
            Value::Array(_) => Tag::Array,
            Value::Record(_) => Tag::Record,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(arr) => write!(f, "array({})", arr.borrow().len()),
            Value::Record(rec) => write!(f, "record({})", rec.borrow().len()),
        }
    }
}

/// Scalars compare by value, containers by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Containers are torn down with a work list instead of recursion, so a chain
/// of nested arrays or records of any depth can be released.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            take_children(&mut value, &mut pending);
        }
    }
}

/// Move the elements of a container out if this is its last handle
fn take_children(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Array(arr) if Rc::strong_count(arr) == 1 => {
            if let Ok(mut items) = arr.try_borrow_mut() {
                pending.append(&mut items);
            }
        }
        Value::Record(rec) if Rc::strong_count(rec) == 1 => {
            if let Ok(mut fields) = rec.try_borrow_mut() {
                pending.extend(fields.drain().map(|(_, v)| v));
            }
        }
        _ => {}
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::Int(-7)), "-7");
        assert_eq!(format!("{}", Value::str("hi")), "hi");
        assert_eq!(format!("{}", Value::empty_array()), "array(0)");
        assert_eq!(format!("{}", Value::empty_record()), "record(0)");
    }

    #[test]
    fn test_container_display_counts() {
        let arr = Value::empty_array();
        if let Value::Array(items) = &arr {
            items.borrow_mut().extend([Value::Int(1), Value::Int(2)]);
        }
        assert_eq!(arr.to_string(), "array(2)");

        let rec = Value::empty_record();
        if let Value::Record(fields) = &rec {
            fields.borrow_mut().insert("x".to_string(), Value::Int(1));
        }
        assert_eq!(rec.to_string(), "record(1)");
    }

    #[test]
    fn test_tags() {
        assert_eq!(Value::Int(0).tag(), Tag::Int);
        assert_eq!(Value::str("").tag(), Tag::Str);
        assert_eq!(Value::empty_array().tag(), Tag::Array);
        assert_eq!(Value::empty_record().tag(), Tag::Record);
        assert_eq!(Value::empty_record().type_name(), "record");
    }

    #[test]
    fn test_clone_aliases_container() {
        let a = Value::empty_array();
        let b = a.clone();
        if let Value::Array(items) = &a {
            items.borrow_mut().push(Value::Int(5));
        }
        assert_eq!(b.to_string(), "array(1)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_drop_deeply_nested_arrays() {
        let mut outer = Value::empty_array();
        for _ in 0..300_000 {
            let next = Value::empty_array();
            if let Value::Array(items) = &next {
                items.borrow_mut().push(outer);
            }
            outer = next;
        }
        drop(outer);
    }

    #[test]
    fn test_drop_deeply_nested_records() {
        let mut outer = Value::empty_record();
        for _ in 0..300_000 {
            let next = Value::empty_record();
            if let Value::Record(fields) = &next {
                fields.borrow_mut().insert("next".to_string(), outer);
            }
            outer = next;
        }
        drop(outer);
    }

    #[test]
    fn test_drop_keeps_shared_children() {
        let shared = Value::empty_array();
        if let Value::Array(items) = &shared {
            items.borrow_mut().push(Value::Int(1));
        }
        let holder = Value::empty_record();
        if let Value::Record(fields) = &holder {
            fields.borrow_mut().insert("a".to_string(), shared.clone());
        }
        drop(holder);
        assert_eq!(shared.to_string(), "array(1)");
    }

    #[test]
    fn test_distinct_containers_not_equal() {
        assert_ne!(Value::empty_array(), Value::empty_array());
        assert_ne!(Value::empty_record(), Value::empty_record());
    }

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::Int(3), Value::from(3));
        assert_eq!(Value::str("a"), Value::from("a"));
        assert_ne!(Value::Int(1), Value::str("1"));
    }
}
