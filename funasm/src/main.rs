//! funasm CLI

use clap::{Parser, Subcommand};
use funasm::config::Config;
use funasm::error::{report_error, report_runtime_error};
use funasm::lexer::tokenize;
use funasm::repl::Repl;
use funasm::Interpreter;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "funasm", version, about = "funasm - line-oriented stack machine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a funasm program
    Run {
        /// Source file to run
        file: PathBuf,
        /// Configuration file (defaults to funasm.toml next to the source)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Log every executed line
        #[arg(long)]
        trace: bool,
    },
    /// Tokenize and dump lines (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive session
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            file,
            config,
            trace,
        } => run_file(&file, config.as_deref(), trace),
        Command::Tokens { file, json } => tokenize_file(&file, json),
        Command::Repl => start_repl(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over the config filter
fn init_tracing(filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run_file(
    path: &Path,
    config_path: Option<&Path>,
    trace: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(p) => Config::load(p)?,
        None => Config::discover(path)?,
    };
    if trace {
        config.engine.trace = true;
        config.log.filter = "funasm=debug".to_string();
    }
    init_tracing(&config.log.filter);

    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let program = match tokenize(&source) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut interpreter = Interpreter::new(program).with_options(config.engine);
    if let Err(err) = interpreter.run_to_end() {
        std::io::stdout().flush()?;
        report_runtime_error(&filename, &source, interpreter.program(), &err)?;
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

fn tokenize_file(path: &Path, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;

    let program = match tokenize(&source) {
        Ok(program) => program,
        Err(err) => {
            report_error(&path.display().to_string(), &source, &err)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(program.lines())?);
        return Ok(ExitCode::SUCCESS);
    }

    for (i, line) in program.lines().iter().enumerate() {
        let mut text = format!("{:02}  ", i + 1);
        for token in &line.tokens {
            text.push_str(token);
            text.push(' ');
        }
        if let Some(comment) = &line.comment {
            text.push_str(comment);
        }
        println!("{}", text.trim_end());
    }

    Ok(ExitCode::SUCCESS)
}

fn start_repl() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing("warn");
    let mut repl = Repl::new()?;
    repl.run()?;
    Ok(ExitCode::SUCCESS)
}
