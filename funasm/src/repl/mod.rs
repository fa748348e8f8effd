//! REPL (Read-Eval-Print Loop) for funasm
//!
//! Every entered line is appended to a growing program and run. A line that
//! fails is dropped again so the session can continue.

use crate::config::EngineOptions;
use crate::interp::Interpreter;
use crate::lexer::tokenize_line;
use crate::program::Program;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".funasm_history";

/// Interpreter state behind the prompt
pub struct Session<W: Write = Stdout> {
    interpreter: Interpreter<W>,
}

impl Session<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Session<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Session<W> {
    pub fn with_output(out: W) -> Self {
        let options = EngineOptions {
            warn_missing_module: false,
            ..EngineOptions::default()
        };
        Session {
            interpreter: Interpreter::with_output(Program::default(), out).with_options(options),
        }
    }

    /// Append one source line and run it
    pub fn eval_line(&mut self, text: &str) -> Result<(), String> {
        let line_no = self.interpreter.program().len() + 1;
        let line = tokenize_line(text, 0, line_no).map_err(|e| e.to_string())?;
        self.interpreter.push_line(line);
        match self.interpreter.run_to_end() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.interpreter.discard_last_line();
                Err(format!("Runtime error: {err}"))
            }
        }
    }

    /// Evaluation stack, bottom first
    pub fn stack_listing(&self) -> Vec<String> {
        self.interpreter
            .stack()
            .as_slice()
            .iter()
            .map(|v| format!("{v} : {}", v.type_name()))
            .collect()
    }

    /// Global variables sorted by name
    pub fn global_listing(&self) -> Vec<String> {
        let mut vars: Vec<_> = self
            .interpreter
            .scopes()
            .global()
            .bindings()
            .iter()
            .map(|(name, v)| format!("{name} = {v} : {}", v.type_name()))
            .collect();
        vars.sort();
        vars
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }
}

/// A `:` command typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    Help,
    Stack,
    Vars,
    Clear,
}

impl ReplCommand {
    fn parse(text: &str) -> Option<Self> {
        let command = match text {
            ":quit" | ":q" | ":exit" => ReplCommand::Quit,
            ":help" | ":h" | ":?" => ReplCommand::Help,
            ":stack" => ReplCommand::Stack,
            ":vars" => ReplCommand::Vars,
            ":clear" => ReplCommand::Clear,
            _ => return None,
        };
        Some(command)
    }
}

/// Line editor wrapped around a [`Session`]
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history: Option<PathBuf>,
}

impl Repl {
    pub fn new() -> RlResult<Self> {
        let mut editor = DefaultEditor::new()?;
        let history = history_file();
        if let Some(path) = &history {
            // absent on first start
            let _ = editor.load_history(path);
        }
        Ok(Repl {
            editor,
            session: Session::new(),
            history,
        })
    }

    /// Read lines until `:quit` or end of input
    pub fn run(&mut self) -> RlResult<()> {
        println!("funasm {} (:help for commands)", env!("CARGO_PKG_VERSION"));

        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(line);

            if line.starts_with(':') {
                match ReplCommand::parse(line) {
                    Some(ReplCommand::Quit) => break,
                    Some(command) => self.show(command),
                    None => eprintln!("unknown command {line}, try :help"),
                }
            } else if let Err(err) = self.session.eval_line(line) {
                eprintln!("{err}");
            }
        }

        if let Some(path) = &self.history {
            let _ = self.editor.save_history(path);
        }
        Ok(())
    }

    fn show(&self, command: ReplCommand) {
        match command {
            ReplCommand::Help => print!("{HELP}"),
            ReplCommand::Stack => {
                for entry in self.session.stack_listing() {
                    println!("  {entry}");
                }
            }
            ReplCommand::Vars => {
                for entry in self.session.global_listing() {
                    println!("  {entry}");
                }
            }
            ReplCommand::Clear => print!("\x1B[2J\x1B[1;1H"),
            ReplCommand::Quit => {}
        }
    }
}

const HELP: &str = "\
:help, :h, :?   show this help
:quit, :q       leave the session
:stack          show the evaluation stack, bottom first
:vars           show global variables
:clear          clear the screen

Any other line runs as an instruction and stays part of the program:
  int 3     str \"hi\"     add     println     dim x 0     get x
";

/// `$HOME/.funasm_history`
fn history_file() -> Option<PathBuf> {
    let home = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(home).map(|dir| PathBuf::from(dir).join(HISTORY_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session<Vec<u8>> {
        Session::with_output(Vec::new())
    }

    fn printed(session: &Session<Vec<u8>>) -> String {
        String::from_utf8_lossy(session.interpreter().output()).into_owned()
    }

    #[test]
    fn test_eval_lines_accumulate() {
        let mut s = session();
        s.eval_line("int 2").unwrap();
        s.eval_line("int 5").unwrap();
        s.eval_line("mul").unwrap();
        s.eval_line("println").unwrap();
        assert_eq!(printed(&s), "10\n");
    }

    #[test]
    fn test_failed_line_is_dropped() {
        let mut s = session();
        s.eval_line("int 1").unwrap();
        let err = s.eval_line("frobnicate").unwrap_err();
        assert!(err.contains("unknown command"));
        assert_eq!(s.interpreter().program().len(), 1);
        s.eval_line("println").unwrap();
        assert_eq!(printed(&s), "1\n");
    }

    #[test]
    fn test_lexer_error_reported() {
        let mut s = session();
        let err = s.eval_line("str \"open").unwrap_err();
        assert!(err.contains("unterminated"));
        assert!(s.interpreter().program().is_empty());
    }

    #[test]
    fn test_no_module_warning() {
        let mut s = session();
        s.eval_line("int 1").unwrap();
        assert!(s.interpreter().warnings().is_empty());
    }

    #[test]
    fn test_listings() {
        let mut s = session();
        s.eval_line("dim b \"x\"").unwrap();
        s.eval_line("dim a 3").unwrap();
        s.eval_line("get a").unwrap();
        assert_eq!(s.stack_listing(), vec!["3 : int"]);
        assert_eq!(s.global_listing(), vec!["a = 3 : int", "b = x : string"]);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse(":q"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse(":exit"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse(":?"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse(":stack"), Some(ReplCommand::Stack));
        assert_eq!(ReplCommand::parse(":vars"), Some(ReplCommand::Vars));
        assert_eq!(ReplCommand::parse(":clear"), Some(ReplCommand::Clear));
        assert_eq!(ReplCommand::parse(":frob"), None);
    }
}
