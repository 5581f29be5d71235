//! REPL (Read-Eval-Print Loop) for Linden

use crate::config::Config;
use crate::error::{CompileError, report_error, report_runtime_error};
use crate::interp::{Interpreter, RuntimeError, TypeTag, Value};
use crate::lexer::{Token, tokenize};
use crate::parser::{parse, parse_statements};
use crate::Span;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use thiserror::Error;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".linden_history";
const REPL_NAME: &str = "<repl>";

/// Failure of a single input line
#[derive(Debug, Error)]
pub enum ReplError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// What one line of input did
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Function definitions added or replaced
    Defined(Vec<String>),
    /// Value of a trailing expression
    Value(Value),
    /// Statements ran without producing a value
    Done,
}

/// Interpreter state shared by every line of a session
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Evaluate one line: either function definitions or statements.
    ///
    /// Statements run in a fresh frame, so variables do not outlive the line.
    pub fn eval_input(&mut self, input: &str) -> Result<Outcome, ReplError> {
        let tokens = tokenize(input)?;
        if is_definition(&tokens) {
            let program = parse(REPL_NAME, input, tokens)?;
            let mut names = Vec::with_capacity(program.functions.len());
            for def in program.functions {
                names.push(def.name.node.clone());
                self.interpreter.define_function(def, true)?;
            }
            return Ok(Outcome::Defined(names));
        }

        let stmts = parse_statements(input, tokens)?;
        match self.interpreter.exec_snippet(&stmts)? {
            Some(value) if !value.ty().is(TypeTag::Void) => Ok(Outcome::Value(value)),
            _ => Ok(Outcome::Done),
        }
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.interpreter.function_names()
    }
}

/// `int f(`, `void g(`, `List<int> h(`: a type, a name, then a parenthesis
fn is_definition(tokens: &[(Token, Span)]) -> bool {
    let starts_with_type = matches!(
        tokens.first(),
        Some((
            Token::Void
                | Token::TyInt
                | Token::TyFloat
                | Token::TyString
                | Token::TyBool
                | Token::TyList
                | Token::TyDict
                | Token::TyPair,
            _
        ))
    );
    if !starts_with_type {
        return false;
    }
    let Some(name_at) = tokens.iter().position(|(tok, _)| matches!(tok, Token::Ident(_))) else {
        return false;
    };
    let header_is_type = tokens[..name_at].iter().all(|(tok, _)| {
        matches!(
            tok,
            Token::Void
                | Token::TyInt
                | Token::TyFloat
                | Token::TyString
                | Token::TyBool
                | Token::TyList
                | Token::TyDict
                | Token::TyPair
                | Token::Lt
                | Token::Gt
                | Token::Comma
        )
    });
    header_is_type && matches!(tokens.get(name_at + 1), Some((Token::LParen, _)))
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let session = Session::new(Interpreter::with_config(config));

        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Linden REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_line(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                print_help();
                false
            }
            ":funcs" => {
                let names = self.session.function_names();
                if names.is_empty() {
                    println!("(no functions defined)");
                }
                for name in names {
                    println!("  {name}");
                }
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn eval_line(&mut self, line: &str) {
        match self.session.eval_input(line) {
            Ok(Outcome::Defined(names)) => {
                for name in names {
                    println!("defined {name}");
                }
            }
            Ok(Outcome::Value(value)) => println!("{} : {}", value.debug_repr(), value.ty()),
            Ok(Outcome::Done) => {}
            Err(ReplError::Compile(e)) => report_error(REPL_NAME, line, &e),
            Err(ReplError::Runtime(e)) => report_runtime_error(REPL_NAME, line, &e),
        }
    }
}

fn print_help() {
    println!("Linden REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :funcs          List defined functions");
    println!("  :clear          Clear the screen");
    println!();
    println!("You can enter:");
    println!("  - Function definitions: int twice(int n) {{ return n * 2; }}");
    println!("  - Statements: List<int> xs = new List<int>(1, 2); xs.push(3); print(xs);");
    println!("  - Expressions: twice(21)");
    println!();
    println!("Built-in functions:");
    println!("  print(x)                          Print a value");
    println!("  xs.length() xs.push(v) xs.pop()   List operations");
    println!("  d.add(p) d.remove(k) d.isKey(k)   Dict operations");
    println!("  d.keys() d.values()               Dict views");
    println!("  p.key() p.value()                 Pair fields");
    println!("  xs.forEach(f) xs.where(f)         Queries taking a one-parameter function");
    println!("  xs.select(f) xs.orderBy(f)");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;

    fn session() -> Session {
        Session::new(Interpreter::new().capture_output())
    }

    fn tokens(src: &str) -> Vec<(Token, Span)> {
        tokenize(src).unwrap()
    }

    #[test]
    fn test_detects_definitions() {
        assert!(is_definition(&tokens("int f() { return 1; }")));
        assert!(is_definition(&tokens("void g(int x) { print(x); }")));
        assert!(is_definition(&tokens("Dict<string, int> h() { return new Dict<string, int>(); }")));
    }

    #[test]
    fn test_declarations_are_not_definitions() {
        assert!(!is_definition(&tokens("int x = 1;")));
        assert!(!is_definition(&tokens("List<int> xs = new List<int>(1);")));
        assert!(!is_definition(&tokens("print(1);")));
        assert!(!is_definition(&tokens("f(1);")));
    }

    #[test]
    fn test_expression_value() {
        let mut s = session();
        assert_eq!(s.eval_input("1 + 2;").unwrap(), Outcome::Value(Value::int(3)));
    }

    #[test]
    fn test_define_then_call() {
        let mut s = session();
        assert_eq!(
            s.eval_input("int twice(int n) { return n * 2; }").unwrap(),
            Outcome::Defined(vec!["twice".to_string()])
        );
        assert_eq!(s.eval_input("twice(21);").unwrap(), Outcome::Value(Value::int(42)));
        assert_eq!(s.function_names(), vec!["twice"]);
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut s = session();
        s.eval_input("int f() { return 1; }").unwrap();
        s.eval_input("int f() { return 2; }").unwrap();
        assert_eq!(s.eval_input("f();").unwrap(), Outcome::Value(Value::int(2)));
    }

    #[test]
    fn test_builtin_names_cannot_be_defined() {
        let mut s = session();
        let err = s.eval_input("int length(int n) { return n; }").unwrap_err();
        assert!(matches!(err, ReplError::Runtime(e) if e.kind == ErrorKind::FunctionExists));
    }

    #[test]
    fn test_statements_print() {
        let mut s = session();
        let outcome = s
            .eval_input("List<int> xs = new List<int>(1, 2); xs.push(3); print(xs);")
            .unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(s.interpreter_mut().take_output(), "[1, 2, 3]\n");
    }

    #[test]
    fn test_variables_do_not_outlive_the_line() {
        let mut s = session();
        s.eval_input("int x = 1;").unwrap();
        let err = s.eval_input("x;").unwrap_err();
        assert!(matches!(err, ReplError::Runtime(e) if e.kind == ErrorKind::UndefinedVariable));
    }

    #[test]
    fn test_errors_leave_session_usable() {
        let mut s = session();
        assert!(matches!(s.eval_input("1 / 0;"), Err(ReplError::Runtime(_))));
        assert!(matches!(s.eval_input("int = ;"), Err(ReplError::Compile(_))));
        assert_eq!(s.eval_input("2 * 3;").unwrap(), Outcome::Value(Value::int(6)));
    }

    #[test]
    fn test_dirs_home_returns_some() {
        assert!(dirs_home().is_some());
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, "> ");
        assert_eq!(HISTORY_FILE, ".linden_history");
    }
}
