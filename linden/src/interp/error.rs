//! Runtime errors for the interpreter
//!
//! Every failure aborts the whole run; there is no recovery construct in the
//! language, so errors only carry enough to be reported.

use crate::ast::Span;
use std::fmt;
use thiserror::Error;

/// Runtime error during interpretation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value replaced by one of a different type
    TypeMismatch,
    /// Operand, argument or condition of the wrong type
    ExpressionTypeError,
    DivisionError,
    CastError,
    IndexError,
    KeyError,
    DuplicateKeyError,
    /// Assigning from an uninitialized value or across types
    AssignmentError,
    /// Declaring with an initializer of the wrong type
    InitializationError,
    ReturnTypeError,
    MainNotImplemented,
    UndefinedVariable,
    FunctionExists,
    ArityMismatch,
    Redeclaration,
    UninitializedValue,
    EmptyContainer,
    Overflow,
    /// Broken stack discipline, unknown function, misuse of a built-in,
    /// or a call depth / loop iteration ceiling exceeded
    InterpreterError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a source location unless a more precise one is already set.
    pub fn at(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn type_mismatch(expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: expected {expected}, got {got}"),
        )
    }

    pub fn expression_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpressionTypeError, message)
    }

    pub fn operand_types(op: impl fmt::Display, left: impl fmt::Display, right: impl fmt::Display) -> Self {
        Self::expression_type(format!("operator {op} is not defined for {left} and {right}"))
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionError, "division by zero")
    }

    pub fn cast(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(ErrorKind::CastError, format!("cannot cast {from} to {to}"))
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexError,
            format!("index out of bounds: index {index}, length {len}"),
        )
    }

    pub fn key_not_found(key: impl fmt::Display) -> Self {
        Self::new(ErrorKind::KeyError, format!("key not found: {key}"))
    }

    pub fn duplicate_key(key: impl fmt::Display) -> Self {
        Self::new(ErrorKind::DuplicateKeyError, format!("duplicate key: {key}"))
    }

    pub fn assignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AssignmentError, message)
    }

    pub fn initialization(name: &str, expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InitializationError,
            format!("cannot initialize {name}: expected {expected}, got {got}"),
        )
    }

    pub fn return_type(func: &str, expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::ReturnTypeError,
            format!("function {func} must return {expected}, returned {got}"),
        )
    }

    pub fn main_not_implemented() -> Self {
        Self::new(ErrorKind::MainNotImplemented, "function main is not implemented")
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedVariable, format!("undefined variable: {name}"))
    }

    pub fn undefined_function(name: &str) -> Self {
        Self::new(ErrorKind::InterpreterError, format!("undefined function: {name}"))
    }

    pub fn function_exists(name: &str) -> Self {
        Self::new(ErrorKind::FunctionExists, format!("function {name} is already defined"))
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("function {name} expects {expected} argument(s), got {got}"),
        )
    }

    pub fn redeclaration(name: &str) -> Self {
        Self::new(
            ErrorKind::Redeclaration,
            format!("variable {name} is already declared in this function"),
        )
    }

    pub fn uninitialized(name: Option<&str>) -> Self {
        let message = match name {
            Some(name) => format!("variable {name} is used before it is assigned"),
            None => "uninitialized value used in an expression".to_string(),
        };
        Self::new(ErrorKind::UninitializedValue, message)
    }

    pub fn empty_container(op: &str) -> Self {
        Self::new(ErrorKind::EmptyContainer, format!("{op} on an empty container"))
    }

    pub fn recursion_limit(limit: usize) -> Self {
        Self::new(
            ErrorKind::InterpreterError,
            format!("maximum call depth of {limit} exceeded"),
        )
    }

    pub fn loop_limit(limit: usize) -> Self {
        Self::new(
            ErrorKind::InterpreterError,
            format!("loop exceeded {limit} iterations"),
        )
    }

    pub fn overflow(op: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Overflow, format!("integer overflow in {op}"))
    }

    pub fn interpreter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InterpreterError, message)
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

/// Span attachment for results flowing out of span-less helpers
pub trait ResultExt<T> {
    fn at(self, span: Span) -> InterpResult<T>;
}

impl<T> ResultExt<T> for InterpResult<T> {
    fn at(self, span: Span) -> InterpResult<T> {
        self.map_err(|e| e.at(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero() {
        let err = RuntimeError::division_by_zero();
        assert_eq!(err.kind, ErrorKind::DivisionError);
        assert_eq!(err.span, None);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = RuntimeError::arity_mismatch("add", 2, 3);
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert!(err.message.contains("add"));
        assert!(err.message.contains('2'));
        assert!(err.message.contains('3'));
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::undefined_variable("x");
        assert_eq!(err.to_string(), "Runtime error: undefined variable: x");
    }

    #[test]
    fn test_at_keeps_innermost_span() {
        let err = RuntimeError::key_not_found("\"a\"")
            .at(Span::new(4, 7))
            .at(Span::new(0, 20));
        assert_eq!(err.span, Some(Span::new(4, 7)));
    }

    #[test]
    fn test_result_ext_attaches_span() {
        let result: InterpResult<()> = Err(RuntimeError::overflow("+"));
        let err = result.at(Span::new(1, 2)).unwrap_err();
        assert_eq!(err.span, Some(Span::new(1, 2)));
        assert_eq!(err.kind, ErrorKind::Overflow);
    }

    #[test]
    fn test_loop_and_call_limits_share_kind() {
        assert_eq!(RuntimeError::loop_limit(10).kind, ErrorKind::InterpreterError);
        assert_eq!(RuntimeError::recursion_limit(10).kind, ErrorKind::InterpreterError);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::DuplicateKeyError.to_string(), "DuplicateKeyError");
    }

    #[test]
    fn test_uninitialized_message() {
        assert!(RuntimeError::uninitialized(Some("total")).message.contains("total"));
        assert_eq!(
            RuntimeError::uninitialized(None).kind,
            ErrorKind::UninitializedValue
        );
    }
}
