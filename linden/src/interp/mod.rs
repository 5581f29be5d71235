//! Linden interpreter
//!
//! Walks the AST directly. Values are type-tagged; every operation checks
//! the tags of its operands at the moment it runs.

mod builtins;
mod error;
mod eval;
mod ops;
mod output;
mod scope;
mod stack;
mod types;
mod value;
mod variable;

pub use builtins::Builtin;
pub use error::{ErrorKind, InterpResult, ResultExt, RuntimeError};
pub use eval::{Callee, ENTRY_POINT, Interpreter};
pub use ops::{binary, cast, unary, values_equal};
pub use output::PrintSink;
pub use scope::{BlockVariables, FunctionContext};
pub use stack::ExecutionStack;
pub use types::{TypeDesc, TypeTag};
pub use value::{Data, Value};
pub use variable::Variable;
