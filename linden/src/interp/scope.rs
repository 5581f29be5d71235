//! Block and function scopes
//!
//! A [`FunctionContext`] is the stack of [`BlockVariables`] belonging to one
//! active call. Names are unique across the whole context: a nested block
//! may not redeclare a name from an enclosing one. Lookup never leaves the
//! context, so callers' variables are invisible to callees.

use super::error::{InterpResult, RuntimeError};
use super::variable::Variable;
use std::collections::HashMap;
use tracing::trace;

/// Variables declared in one `{ ... }` block
#[derive(Debug, Default)]
pub struct BlockVariables {
    vars: HashMap<String, Variable>,
}

impl BlockVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable; fails if the name is already declared in this block.
    pub fn add(&mut self, var: Variable) -> InterpResult<()> {
        if self.vars.contains_key(var.name()) {
            return Err(RuntimeError::redeclaration(var.name()));
        }
        self.vars.insert(var.name().to_string(), var);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Scopes of one function activation
#[derive(Debug)]
pub struct FunctionContext {
    name: String,
    blocks: Vec<BlockVariables>,
}

impl FunctionContext {
    /// New context with an empty outermost block
    pub fn new(name: impl Into<String>) -> Self {
        FunctionContext {
            name: name.into(),
            blocks: vec![BlockVariables::new()],
        }
    }

    /// New context whose outermost block already holds the parameters
    pub fn with_block(name: impl Into<String>, params: BlockVariables) -> Self {
        FunctionContext {
            name: name.into(),
            blocks: vec![params],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    pub fn push_block(&mut self) {
        self.blocks.push(BlockVariables::new());
        trace!(function = %self.name, depth = self.blocks.len(), "push block");
    }

    pub fn pop_block(&mut self) -> InterpResult<BlockVariables> {
        let block = self.blocks.pop().ok_or_else(|| {
            RuntimeError::interpreter(format!("no block to pop in function {}", self.name))
        })?;
        trace!(function = %self.name, depth = self.blocks.len(), "pop block");
        Ok(block)
    }

    /// Declare in the innermost block. The name must be free in every block.
    pub fn add_variable(&mut self, var: Variable) -> InterpResult<()> {
        if self.find_variable(var.name()).is_some() {
            return Err(RuntimeError::redeclaration(var.name()));
        }
        match self.blocks.last_mut() {
            Some(block) => block.add(var),
            None => Err(RuntimeError::interpreter(format!(
                "no open block in function {}",
                self.name
            ))),
        }
    }

    /// Innermost-first lookup
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.blocks.iter().rev().find_map(|block| block.find(name))
    }

    pub fn find_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.blocks.iter_mut().rev().find_map(|block| block.find_mut(name))
    }
}
