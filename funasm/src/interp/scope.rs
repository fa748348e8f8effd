//! Variable frames and the call stack
//!
//! The global frame lives for the whole run. `call` pushes a frame holding the
//! return position and its own variable table, `ret` pops it, dropping the
//! callee's locals immediately. Frames never search each other: unqualified
//! names go to the global frame, `local` names to the top call frame.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use std::collections::HashMap;

/// A variable table plus the line to resume at on return
#[derive(Debug, Default)]
pub struct Frame {
    vars: HashMap<String, Value>,
    return_pc: usize,
}

impl Frame {
    pub fn new(return_pc: usize) -> Self {
        Frame {
            vars: HashMap::new(),
            return_pc,
        }
    }

    pub fn return_pc(&self) -> usize {
        self.return_pc
    }

    /// Create a binding; names are declared once per frame
    pub fn declare(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.vars.contains_key(name) {
            return Err(RuntimeError::redeclared(name));
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> InterpResult<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    /// Replace a binding's value; its tag is fixed at declaration
    pub fn assign(&mut self, name: &str, value: Value) -> InterpResult<()> {
        let slot = self
            .vars
            .get_mut(name)
            .ok_or_else(|| RuntimeError::undefined_variable(name))?;
        if slot.tag() != value.tag() {
            return Err(RuntimeError::type_error(slot.tag(), value.tag()));
        }
        *slot = value;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Get bindings (for debugging)
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.vars
    }
}

/// Global frame plus the stack of active calls
#[derive(Debug, Default)]
pub struct ScopeStack {
    global: Frame,
    calls: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The global frame, or the innermost call frame when `is_local`
    pub fn resolve(&self, is_local: bool) -> InterpResult<&Frame> {
        if is_local {
            self.calls.last().ok_or_else(RuntimeError::no_local_frame)
        } else {
            Ok(&self.global)
        }
    }

    pub fn resolve_mut(&mut self, is_local: bool) -> InterpResult<&mut Frame> {
        if is_local {
            self.calls.last_mut().ok_or_else(RuntimeError::no_local_frame)
        } else {
            Ok(&mut self.global)
        }
    }

    /// Enter a call; returns the new call depth
    pub fn push_call(&mut self, return_pc: usize) -> usize {
        self.calls.push(Frame::new(return_pc));
        self.calls.len()
    }

    /// Leave the innermost call
    pub fn pop_call(&mut self) -> InterpResult<Frame> {
        self.calls.pop().ok_or_else(RuntimeError::return_without_call)
    }

    /// Number of active calls
    pub fn depth(&self) -> usize {
        self.calls.len()
    }

    pub fn global(&self) -> &Frame {
        &self.global
    }
}
