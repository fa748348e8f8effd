//! Instruction dispatcher
//!
//! Each program line is one instruction. The first token selects the handler,
//! the handler matches the rest of the line with a [`LineMatcher`] and either
//! falls through to the next line or sets the program counter.

use super::error::{InterpResult, RuntimeError};
use super::matcher::LineMatcher;
use super::scope::{Frame, ScopeStack};
use super::stack::EvalStack;
use super::value::Value;
use crate::config::EngineOptions;
use crate::lexer::{is_identifier, strip_literal};
use crate::program::{Line, Program};
use std::io::{self, BufRead, Stdout, Write};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Where execution stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More lines to run; only returned by [`Interpreter::step`]
    Running { pc: usize },
    /// A `yield` ran; call again to resume at `pc`
    Yielded { pc: usize },
    /// The program counter left the program
    Finished,
}

/// Non-fatal diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    /// 1-based line number
    pub line: usize,
}

/// What a line does to the program counter
enum Flow {
    Next,
    Jump(usize),
    Yield,
}

#[derive(Debug, Clone, Copy)]
enum IntOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
}

impl IntOp {
    fn name(self) -> &'static str {
        match self {
            IntOp::Add => "add",
            IntOp::Sub => "sub",
            IntOp::Mul => "mul",
            IntOp::Div => "div",
            IntOp::Mod => "mod",
            IntOp::Eq => "eq",
            IntOp::Neq => "neq",
        }
    }

    /// `lhs` was pushed first, `rhs` is the former top of stack
    fn apply(self, lhs: i64, rhs: i64) -> InterpResult<i64> {
        let result = match self {
            IntOp::Add => lhs.checked_add(rhs),
            IntOp::Sub => lhs.checked_sub(rhs),
            IntOp::Mul => lhs.checked_mul(rhs),
            IntOp::Div | IntOp::Mod if rhs == 0 => {
                return Err(RuntimeError::division_by_zero());
            }
            IntOp::Div => lhs.checked_div(rhs),
            IntOp::Mod => lhs.checked_rem(rhs),
            IntOp::Eq => Some(i64::from(lhs == rhs)),
            IntOp::Neq => Some(i64::from(lhs != rhs)),
        };
        result.ok_or_else(|| RuntimeError::overflow(self.name()))
    }
}

/// The interpreter
///
/// Holds every piece of execution state, so independent instances never
/// share anything.
pub struct Interpreter<W: Write = Stdout> {
    program: Rc<Program>,
    /// Zero-based index of the next line to run
    pc: usize,
    stack: EvalStack,
    scopes: ScopeStack,
    module_name: Option<String>,
    module_warned: bool,
    warnings: Vec<Warning>,
    options: EngineOptions,
    out: W,
    /// Source of `input` lines
    input: Box<dyn BufRead>,
    /// First fatal error; once set the interpreter refuses to continue
    halted: Option<RuntimeError>,
}

impl Interpreter<Stdout> {
    /// Create an interpreter printing to stdout
    pub fn new(program: Program) -> Self {
        Self::with_output(program, io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    /// Create an interpreter printing to `out`
    pub fn with_output(program: Program, out: W) -> Self {
        Interpreter {
            program: Rc::new(program),
            pc: 0,
            stack: EvalStack::new(),
            scopes: ScopeStack::new(),
            module_name: None,
            module_warned: false,
            warnings: Vec::new(),
            options: EngineOptions::default(),
            out,
            input: Box::new(io::BufReader::new(io::stdin())),
            halted: None,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Read `input` lines from `reader` instead of stdin
    pub fn with_input(mut self, reader: impl BufRead + 'static) -> Self {
        self.input = Box::new(reader);
        self
    }

    /// Run until a `yield` or the end of the program
    pub fn run(&mut self) -> InterpResult<Status> {
        loop {
            match self.step()? {
                Status::Running { .. } => continue,
                status => return Ok(status),
            }
        }
    }

    /// Run to the end, resuming through every `yield`
    pub fn run_to_end(&mut self) -> InterpResult<()> {
        while self.run()? != Status::Finished {}
        Ok(())
    }

    /// Execute exactly one line
    pub fn step(&mut self) -> InterpResult<Status> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }
        if self.pc >= self.program.len() {
            return Ok(Status::Finished);
        }

        match self.run_line() {
            Ok(Flow::Next) => self.pc += 1,
            Ok(Flow::Jump(target)) => self.pc = target,
            Ok(Flow::Yield) => {
                self.pc += 1;
                return Ok(Status::Yielded { pc: self.pc });
            }
            Err(err) => {
                self.halted = Some(err.clone());
                return Err(err);
            }
        }

        if self.pc >= self.program.len() {
            Ok(Status::Finished)
        } else {
            Ok(Status::Running { pc: self.pc })
        }
    }

    /// Append a line to the program (REPL input)
    pub fn push_line(&mut self, line: Line) -> usize {
        Rc::make_mut(&mut self.program).push_line(line)
    }

    /// Drop the last line after a failure and continue from the end of the
    /// program. State changed before the failure is kept.
    pub fn discard_last_line(&mut self) -> Option<Line> {
        let line = Rc::make_mut(&mut self.program).pop_line();
        self.halted = None;
        self.pc = self.program.len();
        line
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn stack(&self) -> &EvalStack {
        &self.stack
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Global variable frame
    pub fn global(&self) -> &Frame {
        self.scopes.global()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn run_line(&mut self) -> InterpResult<Flow> {
        let program = Rc::clone(&self.program);
        let line = program
            .line(self.pc)
            .ok_or_else(|| RuntimeError::parse("line out of range"))?;
        let mut m = LineMatcher::new(&line.tokens);
        self.execute(&mut m)
            .map_err(|err| err.at(self.pc + 1, m.position() + 1))
    }

    fn execute(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let command = m.advance().unwrap_or("noop");

        if command != "noop" && command != "module" {
            self.check_module_declared();
        }
        if self.options.trace {
            debug!(line = self.pc + 1, command, depth = self.stack.len(), "exec");
        }

        match command {
            "noop" => self.finish(m),
            "module" => self.exec_module(m),
            // literals and stack shuffling
            "int" => self.exec_int(m),
            "str" => self.exec_str(m),
            "dup" => {
                m.expect("$eol")?;
                let top = self.stack.peek()?.clone();
                self.stack.push(top);
                Ok(Flow::Next)
            }
            "drop" => {
                m.expect("$eol")?;
                self.stack.pop()?;
                Ok(Flow::Next)
            }
            // integer arithmetic
            "add" => self.exec_int_op(m, IntOp::Add),
            "sub" => self.exec_int_op(m, IntOp::Sub),
            "mul" => self.exec_int_op(m, IntOp::Mul),
            "div" => self.exec_int_op(m, IntOp::Div),
            "mod" => self.exec_int_op(m, IntOp::Mod),
            "eq" => self.exec_int_op(m, IntOp::Eq),
            "neq" => self.exec_int_op(m, IntOp::Neq),
            // output
            "print" => self.exec_print(m, false),
            "println" => self.exec_print(m, true),
            "input" => self.exec_input(m),
            "toint" => self.exec_toint(m),
            // variables
            "dim" => self.exec_dim(m),
            "get" => self.exec_get(m),
            "set" => self.exec_set(m),
            // control flow
            "jmp" => {
                let target = self.label_operand(m)?;
                Ok(Flow::Jump(target))
            }
            "jz" => self.exec_branch(m, true),
            "jnz" => self.exec_branch(m, false),
            "call" => self.exec_call(m),
            "ret" => self.exec_ret(m),
            "yield" => {
                m.expect("$eol")?;
                Ok(Flow::Yield)
            }
            // arrays
            "push" => self.exec_array_push(m),
            "pop" => self.exec_array_pop(m),
            "indx" => self.exec_array_index(m),
            // records
            "getf" => self.exec_get_field(m),
            "setf" => self.exec_set_field(m),
            // label
            label if is_identifier(label) && m.accept(":") => self.finish(m),
            unknown => Err(RuntimeError::unknown_command(unknown)),
        }
    }

    /// Require the end of the line and fall through
    fn finish(&self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        Ok(Flow::Next)
    }

    fn check_module_declared(&mut self) {
        if self.module_name.is_some() || self.module_warned || !self.options.warn_missing_module {
            return;
        }
        self.module_warned = true;
        let line = self.pc + 1;
        warn!(line, "module name expected on first line");
        self.warnings.push(Warning {
            message: "module name expected on first line".to_string(),
            line,
        });
    }

    fn exec_module(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        if self.module_name.is_some() {
            return Err(RuntimeError::module_redefined());
        }
        m.expect("$identifier")?;
        let name = m.last();
        m.expect("$eol")?;
        debug!(module = %name, "module declared");
        self.module_name = Some(name);
        Ok(Flow::Next)
    }

    fn exec_int(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let value = int_literal(m)?
            .ok_or_else(|| RuntimeError::expected("$number"))?;
        m.expect("$eol")?;
        self.stack.push(Value::Int(value));
        Ok(Flow::Next)
    }

    fn exec_str(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$string")?;
        let text = strip_literal(m.last_at(0)?).to_string();
        m.expect("$eol")?;
        self.stack.push(Value::str(text));
        Ok(Flow::Next)
    }

    fn exec_int_op(&mut self, m: &mut LineMatcher<'_>, op: IntOp) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let rhs = self.stack.pop_int()?;
        let lhs = self.stack.pop_int()?;
        self.stack.push(Value::Int(op.apply(lhs, rhs)?));
        Ok(Flow::Next)
    }

    fn exec_print(&mut self, m: &mut LineMatcher<'_>, newline: bool) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let text = self.stack.peek()?.to_string();
        let written = if newline {
            writeln!(self.out, "{text}")
        } else {
            write!(self.out, "{text}")
        };
        written
            .and_then(|()| self.out.flush())
            .map_err(|e| RuntimeError::io_error(&e.to_string()))?;
        Ok(Flow::Next)
    }

    fn exec_input(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| RuntimeError::io_error(&e.to_string()))?;
        let text = line.trim_end_matches(['\n', '\r']);
        self.stack.push(Value::str(text));
        Ok(Flow::Next)
    }

    fn exec_toint(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let text = self.stack.pop_str()?;
        self.stack.push(Value::Int(leading_int(&text)?));
        Ok(Flow::Next)
    }

    fn exec_dim(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let (is_local, name) = variable_operand(m)?;
        m.accept("=");
        let value = initializer(m)?;
        m.expect("$eol")?;
        self.scopes.resolve_mut(is_local)?.declare(&name, value)?;
        Ok(Flow::Next)
    }

    fn exec_get(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let (is_local, name) = variable_operand(m)?;
        m.expect("$eol")?;
        let value = self.scopes.resolve(is_local)?.lookup(&name)?.clone();
        self.stack.push(value);
        Ok(Flow::Next)
    }

    fn exec_set(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let (is_local, name) = variable_operand(m)?;
        m.expect("$eol")?;
        let expected = self.scopes.resolve(is_local)?.lookup(&name)?.tag();
        let value = self.stack.pop_tagged(expected)?;
        self.scopes.resolve_mut(is_local)?.assign(&name, value)?;
        Ok(Flow::Next)
    }

    /// `jz` jumps when the popped integer is zero, `jnz` when it is not
    fn exec_branch(&mut self, m: &mut LineMatcher<'_>, on_zero: bool) -> InterpResult<Flow> {
        let target = self.label_operand(m)?;
        let cond = self.stack.pop_int()?;
        if (cond == 0) == on_zero {
            Ok(Flow::Jump(target))
        } else {
            Ok(Flow::Next)
        }
    }

    fn exec_call(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        let target = self.label_operand(m)?;
        let depth = self.scopes.push_call(self.pc + 1);
        trace!(from = self.pc + 1, to = target + 1, depth, "call");
        Ok(Flow::Jump(target))
    }

    fn exec_ret(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let frame = self.scopes.pop_call()?;
        trace!(to = frame.return_pc() + 1, depth = self.scopes.depth(), "return");
        Ok(Flow::Jump(frame.return_pc()))
    }

    fn exec_array_push(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let value = self.stack.pop()?;
        let array = self.stack.pop_array()?;
        let element_tag = array.borrow().first().map(Value::tag);
        if let Some(expected) = element_tag {
            if expected != value.tag() {
                return Err(RuntimeError::type_error(expected, value.tag()));
            }
        }
        array.borrow_mut().push(value);
        Ok(Flow::Next)
    }

    fn exec_array_pop(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let array = self.stack.pop_array()?;
        let value = array
            .borrow_mut()
            .pop()
            .ok_or_else(RuntimeError::empty_array)?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    fn exec_array_index(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$eol")?;
        let index = self.stack.pop_int()?;
        let array = self.stack.pop_array()?;
        let value = {
            let items = array.borrow();
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| RuntimeError::index_out_of_bounds(index, items.len()))?
        };
        self.stack.push(value);
        Ok(Flow::Next)
    }

    fn exec_get_field(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$identifier")?;
        let field = m.last();
        m.expect("$eol")?;
        let record = self.stack.pop_record()?;
        let value = record
            .borrow()
            .get(&field)
            .cloned()
            .ok_or_else(|| RuntimeError::unknown_field(&field))?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    fn exec_set_field(&mut self, m: &mut LineMatcher<'_>) -> InterpResult<Flow> {
        m.expect("$identifier")?;
        let field = m.last();
        m.expect("$eol")?;
        let value = self.stack.pop()?;
        let record = self.stack.pop_record()?;
        record.borrow_mut().insert(field, value);
        Ok(Flow::Next)
    }

    /// Parse `label $eol` and resolve it to a line index
    fn label_operand(&self, m: &mut LineMatcher<'_>) -> InterpResult<usize> {
        m.expect("$identifier")?;
        let label = m.last();
        m.expect("$eol")?;
        self.program
            .resolve_label(&label)
            .ok_or_else(|| RuntimeError::unknown_label(&label))
    }
}

/// `[local] name`; returns whether the local scope was requested
fn variable_operand(m: &mut LineMatcher<'_>) -> InterpResult<(bool, String)> {
    if m.accept("local $identifier") {
        return Ok((true, m.last_at(1)?.to_string()));
    }
    m.expect("$identifier")?;
    Ok((false, m.last()))
}

/// `[-] $number`, or `None` if the cursor is not on a number
fn int_literal(m: &mut LineMatcher<'_>) -> InterpResult<Option<i64>> {
    let text = if m.accept("- $number") {
        format!("-{}", m.last_at(1)?)
    } else if m.accept("$number") {
        m.last()
    } else {
        return Ok(None);
    };
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| RuntimeError::parse(format!("integer literal out of range [{text}]")))
}

/// A number or string literal, or `None` if the cursor is on neither
fn scalar_literal(m: &mut LineMatcher<'_>) -> InterpResult<Option<Value>> {
    if let Some(n) = int_literal(m)? {
        Ok(Some(Value::Int(n)))
    } else if m.accept("$string") {
        Ok(Some(Value::str(strip_literal(m.last_at(0)?))))
    } else {
        Ok(None)
    }
}

/// Initial value of a `dim`: number, string, `[ items ]` or `{ }`
fn initializer(m: &mut LineMatcher<'_>) -> InterpResult<Value> {
    if let Some(value) = scalar_literal(m)? {
        Ok(value)
    } else if m.accept("[") {
        array_literal(m)
    } else if m.accept("{ }") {
        Ok(Value::empty_record())
    } else {
        Err(RuntimeError::parse("expected initializer"))
    }
}

/// Elements of an array literal after its `[`; commas are optional
fn array_literal(m: &mut LineMatcher<'_>) -> InterpResult<Value> {
    let mut items: Vec<Value> = Vec::new();
    while !m.accept("]") {
        if m.accept("$eol") {
            return Err(RuntimeError::parse("unterminated array"));
        }
        let item = scalar_literal(m)?
            .ok_or_else(|| RuntimeError::parse("expected array element"))?;
        if let Some(first) = items.first() {
            if first.tag() != item.tag() {
                return Err(RuntimeError::type_error(first.tag(), item.tag()));
            }
        }
        items.push(item);
        m.accept(",");
    }
    Ok(Value::Array(Rc::new(RefCell::new(items))))
}

/// Integer value of the leading `[+-]digits` of `text` after whitespace, or
/// 0 when there are no digits
fn leading_int(text: &str) -> InterpResult<i64> {
    let trimmed = text.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Ok(0);
    }
    let number = &trimmed[..sign_len + digits];
    number
        .parse::<i64>()
        .map_err(|_| RuntimeError::overflow("toint"))
}
