//! Tree-walking evaluator

use super::builtins::Builtin;
use super::error::{InterpResult, ResultExt, RuntimeError};
use super::ops;
use super::output::PrintSink;
use super::scope::{BlockVariables, FunctionContext};
use super::stack::ExecutionStack;
use super::types::{TypeDesc, TypeTag};
use super::value::Value;
use super::variable::Variable;
use crate::ast::{BinOp, Block, Expr, FnDef, Literal, Program, Span, Spanned, Stmt, Type};
use crate::config::Config;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Stack growth parameters for deeply nested source
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Name of the entry function
pub const ENTRY_POINT: &str = "main";

/// Outcome of executing a statement
#[derive(Debug)]
pub(super) enum Flow {
    Next,
    Return(Value),
}

/// What a call-site name resolves to
#[derive(Debug, Clone)]
pub enum Callee {
    User(Rc<FnDef>),
    Builtin(Builtin),
}

/// A storage location: a variable and the index path below it
#[derive(Debug)]
pub(super) struct Place {
    root: String,
    path: Vec<Value>,
    span: Span,
}

/// The interpreter
pub struct Interpreter {
    /// User-defined functions
    functions: HashMap<String, Rc<FnDef>>,
    stack: ExecutionStack,
    config: Config,
    /// Active calls, user and built-in
    call_depth: usize,
    pub(super) output: PrintSink,
    /// Value of the most recent expression statement or program run
    last_result: Value,
}

impl Interpreter {
    /// Create an interpreter with default limits, printing to stdout
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter {
            functions: HashMap::new(),
            stack: ExecutionStack::new(),
            config,
            call_depth: 0,
            output: PrintSink::Stdout,
            last_result: Value::void(),
        }
    }

    /// Capture `print` output in memory instead of writing to stdout
    pub fn capture_output(mut self) -> Self {
        self.output = PrintSink::buffer();
        self
    }

    /// Drain captured `print` output
    pub fn take_output(&mut self) -> String {
        self.output.take()
    }

    pub fn last_result(&self) -> &Value {
        &self.last_result
    }

    /// Register every function of a program.
    ///
    /// A name may be defined once and may not shadow a built-in. The
    /// program is consumed; its function bodies are not copied.
    pub fn load(&mut self, program: Program) -> InterpResult<()> {
        let count = program.functions.len();
        for def in program.functions {
            self.define_function(def, false)?;
        }
        debug!(functions = count, "program loaded");
        Ok(())
    }

    /// Add a function; with `replace`, an existing user definition is overwritten.
    pub fn define_function(&mut self, def: FnDef, replace: bool) -> InterpResult<()> {
        let name = def.name.node.clone();
        if Builtin::from_name(&name).is_some() || (!replace && self.functions.contains_key(&name)) {
            return Err(RuntimeError::function_exists(&name).at(def.name.span));
        }
        self.functions.insert(name, Rc::new(def));
        Ok(())
    }

    /// Sorted names of the user functions
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load a program and run its `main`
    pub fn run(&mut self, program: Program) -> InterpResult<Value> {
        self.load(program)?;
        self.run_main()
    }

    /// Call `main` with no arguments and record its result
    pub fn run_main(&mut self) -> InterpResult<Value> {
        let main = self
            .functions
            .get(ENTRY_POINT)
            .cloned()
            .ok_or_else(RuntimeError::main_not_implemented)?;
        if !main.params.is_empty() {
            return Err(RuntimeError::arity_mismatch(ENTRY_POINT, 0, main.params.len()).at(main.name.span));
        }
        let value = self.invoke_user(&main, Vec::new(), main.name.span)?;
        self.last_result = value.clone();
        Ok(value)
    }

    /// Call a user function with already-evaluated arguments
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> InterpResult<Value> {
        let def = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_function(name))?;
        if def.params.len() != args.len() {
            return Err(RuntimeError::arity_mismatch(name, def.params.len(), args.len()).at(def.name.span));
        }
        self.invoke_user(&def, args, def.name.span)
    }

    /// Execute statements in a fresh frame.
    ///
    /// Returns the value of a trailing expression statement, or of an
    /// executed `return`.
    pub fn exec_snippet(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<Option<Value>> {
        self.stack.push_function_context(FunctionContext::new("<snippet>"));
        let outcome = self.exec_snippet_body(stmts);
        let popped = self.stack.pop_function_context();
        let value = outcome?;
        popped?;
        Ok(value)
    }

    fn exec_snippet_body(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<Option<Value>> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Some(value));
            }
        }
        match stmts.last().map(|s| &s.node) {
            Some(Stmt::Expr(_)) => Ok(Some(self.last_result.clone())),
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------

    pub(super) fn resolve(&self, name: &str) -> InterpResult<Callee> {
        if let Some(def) = self.functions.get(name) {
            return Ok(Callee::User(Rc::clone(def)));
        }
        Builtin::from_name(name)
            .map(Callee::Builtin)
            .ok_or_else(|| RuntimeError::undefined_function(name))
    }

    pub(super) fn enter_call(&mut self, name: &str, span: Span) -> InterpResult<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::recursion_limit(self.config.max_call_depth).at(span));
        }
        self.call_depth += 1;
        debug!(function = name, depth = self.call_depth, "enter");
        Ok(())
    }

    pub(super) fn leave_call(&mut self, name: &str) {
        self.call_depth = self.call_depth.saturating_sub(1);
        debug!(function = name, depth = self.call_depth, "exit");
    }

    fn call(
        &mut self,
        name: &Spanned<String>,
        receiver: Option<&Spanned<Expr>>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> InterpResult<Value> {
        match self.resolve(&name.node).at(name.span)? {
            Callee::User(def) => {
                if receiver.is_some() {
                    return Err(RuntimeError::interpreter(format!(
                        "function {} cannot be called as a method",
                        name.node
                    ))
                    .at(name.span));
                }
                if def.params.len() != args.len() {
                    return Err(RuntimeError::arity_mismatch(&name.node, def.params.len(), args.len()).at(span));
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_value(arg)?);
                }
                self.invoke_user(&def, values, span)
            }
            Callee::Builtin(builtin) => self.call_builtin(builtin, receiver, args, span),
        }
    }

    /// Bind arguments, run the body in its own frame, check the return type.
    pub(super) fn invoke_user(&mut self, def: &FnDef, args: Vec<Value>, span: Span) -> InterpResult<Value> {
        let name = def.name.node.as_str();
        let mut params = BlockVariables::new();
        for (param, arg) in def.params.iter().zip(args) {
            let ty = TypeDesc::from(&param.ty.node);
            if *arg.ty() != ty {
                return Err(RuntimeError::expression_type(format!(
                    "parameter {} of {name} expects {ty}, got {}",
                    param.name.node,
                    arg.ty()
                ))
                .at(span));
            }
            let var = Variable::initialize(param.name.node.as_str(), ty, arg).at(span)?;
            params.add(var).at(param.name.span)?;
        }

        self.enter_call(name, span)?;
        self.stack.push_function_context(FunctionContext::with_block(name, params));
        let outcome = self.exec_block(&def.body);
        let popped = self.stack.pop_function_context();
        self.leave_call(name);
        let flow = outcome?;
        popped.at(span)?;

        let value = match flow {
            Flow::Return(value) => value,
            Flow::Next => Value::void(),
        };
        let expected = TypeDesc::from(&def.ret_ty.node);
        if *value.ty() != expected {
            return Err(RuntimeError::return_type(name, &expected, value.ty()).at(span));
        }
        Ok(value)
    }

    // ------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------

    fn exec_block(&mut self, block: &Block) -> InterpResult<Flow> {
        for stmt in &block.stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    /// Run a nested block inside its own scope
    fn exec_scoped(&mut self, block: &Block) -> InterpResult<Flow> {
        self.stack.push_block().at(block.span)?;
        let outcome = self.exec_block(block);
        let popped = self.stack.pop_block();
        let flow = outcome?;
        popped.at(block.span)?;
        Ok(flow)
    }

    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<Flow> {
        match &stmt.node {
            Stmt::Declare { ty, name, init } => {
                let ty = TypeDesc::from(&ty.node);
                let var = match init {
                    Some(init) => {
                        let value = self.eval(init)?;
                        Variable::initialize(name.node.as_str(), ty, value).at(init.span)?
                    }
                    None => Variable::declare(name.node.as_str(), ty),
                };
                self.stack.add_variable(var).at(name.span)?;
                Ok(Flow::Next)
            }
            Stmt::Assign { target, value } => {
                self.assign(target, value)?;
                Ok(Flow::Next)
            }
            Stmt::Expr(expr) => {
                self.last_result = self.eval(expr)?;
                Ok(Flow::Next)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_value(expr)?,
                    None => Value::void(),
                };
                Ok(Flow::Return(value))
            }
            Stmt::If { branches, else_block } => {
                for branch in branches {
                    if self.eval_condition(&branch.cond)? {
                        return self.exec_scoped(&branch.body);
                    }
                }
                match else_block {
                    Some(block) => self.exec_scoped(block),
                    None => Ok(Flow::Next),
                }
            }
            Stmt::While { cond, body } => {
                let limit = self.config.max_loop_iterations;
                let mut iterations = 0usize;
                while self.eval_condition(cond)? {
                    iterations += 1;
                    if iterations > limit {
                        return Err(RuntimeError::loop_limit(limit).at(stmt.span));
                    }
                    if let Flow::Return(value) = self.exec_scoped(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }
        }
    }

    fn eval_condition(&mut self, cond: &Spanned<Expr>) -> InterpResult<bool> {
        let value = self.eval_value(cond)?;
        value.as_bool().ok_or_else(|| {
            RuntimeError::expression_type(format!("condition must be bool, got {}", value.ty()))
                .at(cond.span)
        })
    }

    fn assign(&mut self, target: &Spanned<Expr>, value: &Spanned<Expr>) -> InterpResult<()> {
        match &target.node {
            Expr::Var(name) => {
                let new = self.eval(value)?;
                self.stack
                    .find_variable_mut(name)
                    .at(target.span)?
                    .assign(new)
                    .at(value.span)
            }
            Expr::Index { expr: base, index } => {
                let place = self.place(base)?;
                let key = self.eval_value(index)?;
                let new = self.eval(value)?;
                self.place_mut(&place)?.set_element(key, new).at(target.span)
            }
            _ => Err(RuntimeError::assignment(
                "left side of an assignment must be a variable or an indexed element",
            )
            .at(target.span)),
        }
    }

    /// Resolve a variable or index chain to a storage location
    pub(super) fn place(&mut self, expr: &Spanned<Expr>) -> InterpResult<Place> {
        match &expr.node {
            Expr::Var(name) => Ok(Place {
                root: name.clone(),
                path: Vec::new(),
                span: expr.span,
            }),
            Expr::Index { expr: base, index } => {
                let mut place = self.place(base)?;
                place.path.push(self.eval_value(index)?);
                place.span = expr.span;
                Ok(place)
            }
            _ => Err(RuntimeError::assignment("expression does not denote a variable").at(expr.span)),
        }
    }

    pub(super) fn place_mut(&mut self, place: &Place) -> InterpResult<&mut Value> {
        let var = self.stack.find_variable_mut(&place.root).at(place.span)?;
        descend(var.value_mut(), &place.path).at(place.span)
    }

    // ------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------

    /// Evaluate an expression with automatic stack growth for deep nesting.
    /// The result may be an uninitialized placeholder.
    pub(super) fn eval(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
    }

    /// Evaluate an expression whose value is about to be consumed
    pub(super) fn eval_value(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        let value = self.eval(expr)?;
        if value.is_initialized() {
            return Ok(value);
        }
        let name = match &expr.node {
            Expr::Var(name) => Some(name.as_str()),
            _ => None,
        };
        Err(RuntimeError::uninitialized(name).at(expr.span))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        let span = expr.span;
        match &expr.node {
            Expr::Literal(lit) => Ok(literal(lit)),

            Expr::Var(name) => Ok(self.stack.find_variable(name).at(span)?.value().clone()),

            Expr::Binary { left, op, right } if matches!(op, BinOp::And | BinOp::Or) => {
                self.eval_logical(*op, left, right)
            }

            Expr::Binary { left, op, right } => {
                let l = self.eval_value(left)?;
                let r = self.eval_value(right)?;
                ops::binary(*op, &l, &r).at(span)
            }

            Expr::Unary { op, expr: operand } => {
                let value = self.eval_value(operand)?;
                ops::unary(*op, &value).at(span)
            }

            Expr::Cast { ty, expr: operand } => {
                let value = self.eval_value(operand)?;
                ops::cast(&value, &TypeDesc::from(ty)).at(span)
            }

            Expr::Index { expr: base, index } => {
                let container = self.eval_value(base)?;
                let key = self.eval_value(index)?;
                container.element(&key).at(span)
            }

            Expr::Call { name, args } => self.call(name, None, args, span),

            Expr::MethodCall { receiver, name, args } => self.call(name, Some(receiver), args, span),

            Expr::New { ty, args } => self.construct(ty, args, span),
        }
    }

    /// `&&` and `||` on bools, skipping the right side when the left decides
    fn eval_logical(&mut self, op: BinOp, left: &Spanned<Expr>, right: &Spanned<Expr>) -> InterpResult<Value> {
        let operand = |value: &Value, span: Span| {
            value.as_bool().ok_or_else(|| {
                RuntimeError::expression_type(format!("operator {op} expects bool, got {}", value.ty())).at(span)
            })
        };
        let l = operand(&self.eval_value(left)?, left.span)?;
        if (op == BinOp::And && !l) || (op == BinOp::Or && l) {
            return Ok(Value::boolean(l));
        }
        let r = operand(&self.eval_value(right)?, right.span)?;
        Ok(Value::boolean(r))
    }

    /// `new List<T>(...)`, `new Pair<K, V>(k, v)`, `new Dict<K, V>(pairs...)`
    fn construct(&mut self, ty: &Type, args: &[Spanned<Expr>], span: Span) -> InterpResult<Value> {
        let desc = TypeDesc::from(ty);
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push((self.eval_value(arg)?, arg.span));
        }
        let expect = |value: &Value, expected: &TypeDesc, at: Span| {
            if value.ty() == expected {
                Ok(())
            } else {
                Err(RuntimeError::expression_type(format!(
                    "{desc} expects {expected}, got {}",
                    value.ty()
                ))
                .at(at))
            }
        };

        match &desc {
            TypeDesc::Element { element, .. } => {
                for (value, at) in &values {
                    expect(value, &**element, *at)?;
                }
                Value::list((**element).clone(), values.into_iter().map(|(v, _)| v).collect()).at(span)
            }
            TypeDesc::KeyValue {
                tag: TypeTag::Pair,
                key,
                value,
            } => {
                let [(k, k_at), (v, v_at)]: [(Value, Span); 2] = values
                    .try_into()
                    .map_err(|given: Vec<_>| RuntimeError::arity_mismatch("Pair", 2, given.len()).at(span))?;
                expect(&k, &**key, k_at)?;
                expect(&v, &**value, v_at)?;
                Ok(Value::pair(k, v))
            }
            TypeDesc::KeyValue { key, value, .. } => {
                let entry = TypeDesc::pair((**key).clone(), (**value).clone());
                let mut dict = Value::dict_from_pairs((**key).clone(), (**value).clone(), Vec::new())?;
                for (pair, at) in values {
                    expect(&pair, &entry, at)?;
                    dict.add_pair(pair).at(at)?;
                }
                Ok(dict)
            }
            TypeDesc::Base(_) => Err(RuntimeError::interpreter(format!("cannot construct {desc}")).at(span)),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::int(*n),
        Literal::Float(x) => Value::float(*x),
        Literal::Bool(b) => Value::boolean(*b),
        Literal::Str(s) => Value::string(s.as_str()),
    }
}

fn descend<'a>(slot: &'a mut Value, path: &[Value]) -> InterpResult<&'a mut Value> {
    match path.split_first() {
        None => Ok(slot),
        Some((key, rest)) => descend(slot.element_mut(key)?, rest),
    }
}
