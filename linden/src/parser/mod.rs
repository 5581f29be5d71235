//! Parser implementation using lalrpop

use crate::ast::{Program, Span, Spanned, Stmt};
use crate::error::{CompileError, Result};
use crate::lexer::Token;
use lalrpop_util::ParseError;


lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar
);

/// Parse tokens into a program of function definitions
pub fn parse(_filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    grammar::ProgramParser::new()
        .parse(triples(tokens))
        .map_err(|e| to_compile_error(e, source))
}

/// Parse tokens as a bare statement list
pub fn parse_statements(source: &str, tokens: Vec<(Token, Span)>) -> Result<Vec<Spanned<Stmt>>> {
    grammar::StatementsParser::new()
        .parse(triples(tokens))
        .map_err(|e| to_compile_error(e, source))
}

fn triples(tokens: Vec<(Token, Span)>) -> impl Iterator<Item = (usize, Token, usize)> {
    tokens
        .into_iter()
        .map(|(tok, span)| (span.start, tok, span.end))
}

fn to_compile_error(e: ParseError<usize, Token, &'static str>, source: &str) -> CompileError {
    let span = match &e {
        ParseError::InvalidToken { location } => Span::new(*location, *location + 1),
        // Point at the last character rather than one past the end
        ParseError::UnrecognizedEof { location, .. } => {
            let at = (*location).min(source.len().saturating_sub(1));
            Span::new(at, at + 1)
        }
        ParseError::UnrecognizedToken { token, .. } | ParseError::ExtraToken { token } => {
            Span::new(token.0, token.2)
        }
        ParseError::User { .. } => Span::new(0, 1),
    };
    CompileError::parser(format!("{e}"), span)
}
