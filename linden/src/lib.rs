//! Linden Interpreter Library
//!
//! A small statically-typed language with generic containers and
//! LINQ-style query methods, run by a tree-walking interpreter.

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use config::Config;
pub use error::{CompileError, Result};

/// Tokenize and parse a complete source file
pub fn compile(filename: &str, source: &str) -> Result<ast::Program> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(filename, source, tokens)
}
