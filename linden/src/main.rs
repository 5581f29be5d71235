//! Linden CLI

use clap::{Parser, Subcommand};
use linden::config::Config;
use linden::error::{CompileError, report_error, report_runtime_error};
use linden::interp::{ENTRY_POINT, Interpreter, RuntimeError};
use linden::repl::Repl;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

#[derive(Parser)]
#[command(name = "linden", version, about = "Linden - typed scripting with containers and queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to ./linden.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum nested function calls
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Maximum iterations of a single while loop
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Log interpreter activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Linden program
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Parse and load a program without running it
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Start an interactive session
    Repl,
}

static TRACING_INIT: Once = Once::new();

/// Install the stderr subscriber. Safe to call multiple times.
///
/// `RUST_LOG` wins when set; `--verbose` alone means `linden=debug`.
fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if verbose {
            EnvFilter::new("linden=debug")
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config.with_overrides(cli.max_depth, cli.max_iterations),
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Run { file } => run_file(&file, config),
        Command::Check { file } => check_file(&file, config),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Repl => run_repl(config),
    }
}

/// Source text and the name it is reported under
struct Source {
    filename: String,
    text: String,
}

impl Source {
    fn read(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(Source {
                filename: path.display().to_string(),
                text,
            }),
            Err(e) => {
                let error = CompileError::io_error(format!("cannot read {}: {e}", path.display()));
                eprintln!("Error: {error}");
                None
            }
        }
    }

    fn compile(&self) -> Option<linden::ast::Program> {
        linden::compile(&self.filename, &self.text)
            .map_err(|e| report_error(&self.filename, &self.text, &e))
            .ok()
    }

    fn fail(&self, error: &RuntimeError) -> ExitCode {
        report_runtime_error(&self.filename, &self.text, error);
        ExitCode::FAILURE
    }
}

fn run_file(path: &Path, config: Config) -> ExitCode {
    let Some(source) = Source::read(path) else {
        return ExitCode::FAILURE;
    };
    let Some(program) = source.compile() else {
        return ExitCode::FAILURE;
    };

    let mut interpreter = Interpreter::with_config(config);
    match interpreter.run(program) {
        Ok(value) => {
            println!("{ENTRY_POINT}() returned {value} : {}", value.ty());
            ExitCode::SUCCESS
        }
        Err(e) => source.fail(&e),
    }
}

fn check_file(path: &Path, config: Config) -> ExitCode {
    let Some(source) = Source::read(path) else {
        return ExitCode::FAILURE;
    };
    let Some(program) = source.compile() else {
        return ExitCode::FAILURE;
    };

    let count = program.functions.len();
    let has_main = program.function(ENTRY_POINT).is_some();
    let mut interpreter = Interpreter::with_config(config);
    if let Err(e) = interpreter.load(program) {
        return source.fail(&e);
    }
    if !has_main {
        return source.fail(&RuntimeError::main_not_implemented());
    }

    println!("✓ {} checks successfully ({count} functions)", source.filename);
    ExitCode::SUCCESS
}

fn parse_file(path: &Path) -> ExitCode {
    let Some(source) = Source::read(path) else {
        return ExitCode::FAILURE;
    };
    let Some(program) = source.compile() else {
        return ExitCode::FAILURE;
    };

    match serde_json::to_string_pretty(&program) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn tokenize_file(path: &Path) -> ExitCode {
    let Some(source) = Source::read(path) else {
        return ExitCode::FAILURE;
    };

    match linden::lexer::tokenize(&source.text) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                let (line, col) = span.line_col(&source.text);
                println!("{line}:{col}\t{tok}\t({span})");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&source.filename, &source.text, &e);
            ExitCode::FAILURE
        }
    }
}

fn run_repl(config: Config) -> ExitCode {
    match Repl::new(config).and_then(|mut repl| repl.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
