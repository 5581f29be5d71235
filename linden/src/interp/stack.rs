//! Execution stack of function contexts

use super::error::{InterpResult, RuntimeError};
use super::scope::FunctionContext;
use super::variable::Variable;

/// One [`FunctionContext`] per active call; only the top one is addressable.
#[derive(Debug, Default)]
pub struct ExecutionStack {
    frames: Vec<FunctionContext>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push_function_context(&mut self, ctx: FunctionContext) {
        self.frames.push(ctx);
    }

    pub fn pop_function_context(&mut self) -> InterpResult<FunctionContext> {
        self.frames
            .pop()
            .ok_or_else(|| RuntimeError::interpreter("execution stack is empty"))
    }

    pub fn current(&self) -> InterpResult<&FunctionContext> {
        self.frames
            .last()
            .ok_or_else(|| RuntimeError::interpreter("execution stack is empty"))
    }

    pub fn current_mut(&mut self) -> InterpResult<&mut FunctionContext> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::interpreter("execution stack is empty"))
    }

    pub fn push_block(&mut self) -> InterpResult<()> {
        self.current_mut()?.push_block();
        Ok(())
    }

    pub fn pop_block(&mut self) -> InterpResult<()> {
        self.current_mut()?.pop_block().map(drop)
    }

    pub fn add_variable(&mut self, var: Variable) -> InterpResult<()> {
        self.current_mut()?.add_variable(var)
    }

    pub fn find_variable(&self, name: &str) -> InterpResult<&Variable> {
        self.current()?
            .find_variable(name)
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    pub fn find_variable_mut(&mut self, name: &str) -> InterpResult<&mut Variable> {
        self.current_mut()?
            .find_variable_mut(name)
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{ErrorKind, TypeDesc, Value};

    fn int_var(name: &str, n: i64) -> Variable {
        Variable::initialize(name, TypeDesc::INT, Value::int(n)).unwrap()
    }

    #[test]
    fn test_empty_stack_operations_fail() {
        let mut stack = ExecutionStack::new();
        assert_eq!(stack.pop_function_context().unwrap_err().kind, ErrorKind::InterpreterError);
        assert_eq!(stack.push_block().unwrap_err().kind, ErrorKind::InterpreterError);
        assert_eq!(
            stack.add_variable(int_var("x", 1)).unwrap_err().kind,
            ErrorKind::InterpreterError
        );
        assert_eq!(stack.find_variable("x").unwrap_err().kind, ErrorKind::InterpreterError);
    }

    #[test]
    fn test_only_top_frame_visible() {
        let mut stack = ExecutionStack::new();
        stack.push_function_context(FunctionContext::new("main"));
        stack.add_variable(int_var("x", 1)).unwrap();

        stack.push_function_context(FunctionContext::new("callee"));
        assert_eq!(stack.find_variable("x").unwrap_err().kind, ErrorKind::UndefinedVariable);
        // the callee may reuse the caller's names
        stack.add_variable(int_var("x", 2)).unwrap();
        assert_eq!(stack.find_variable("x").unwrap().value().as_int(), Some(2));

        stack.pop_function_context().unwrap();
        assert_eq!(stack.find_variable("x").unwrap().value().as_int(), Some(1));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_block_delegation() {
        let mut stack = ExecutionStack::new();
        stack.push_function_context(FunctionContext::new("main"));
        stack.push_block().unwrap();
        stack.add_variable(int_var("tmp", 0)).unwrap();
        stack.pop_block().unwrap();
        assert!(stack.find_variable("tmp").is_err());
    }

    #[test]
    fn test_recursive_frames_are_independent() {
        let mut stack = ExecutionStack::new();
        for depth in 0..5 {
            stack.push_function_context(FunctionContext::new("rec"));
            stack.add_variable(int_var("n", depth)).unwrap();
        }
        for depth in (0..5).rev() {
            assert_eq!(stack.find_variable("n").unwrap().value().as_int(), Some(depth));
            stack.pop_function_context().unwrap();
        }
        assert!(stack.is_empty());
    }
}
