//! Embedded functions and container methods
//!
//! Every name here lives in the same table as user functions: a user
//! definition cannot reuse one, and callbacks resolve through both.
//! Methods take their receiver as an implicit `this`; `print` is the only
//! free function.

use super::error::{ErrorKind, InterpResult, ResultExt, RuntimeError};
use super::eval::{Callee, Interpreter, Place};
use super::types::{TypeDesc, TypeTag};
use super::value::Value;
use crate::ast::{Expr, Span, Spanned};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Keys,
    Values,
    PairKey,
    PairValue,
    Add,
    Remove,
    IsKey,
    Length,
    Push,
    Pop,
    ForEach,
    Where,
    Select,
    OrderBy,
}

impl Builtin {
    pub const ALL: [Builtin; 15] = [
        Builtin::Print,
        Builtin::Keys,
        Builtin::Values,
        Builtin::PairKey,
        Builtin::PairValue,
        Builtin::Add,
        Builtin::Remove,
        Builtin::IsKey,
        Builtin::Length,
        Builtin::Push,
        Builtin::Pop,
        Builtin::ForEach,
        Builtin::Where,
        Builtin::Select,
        Builtin::OrderBy,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Keys => "keys",
            Builtin::Values => "values",
            Builtin::PairKey => "key",
            Builtin::PairValue => "value",
            Builtin::Add => "add",
            Builtin::Remove => "remove",
            Builtin::IsKey => "isKey",
            Builtin::Length => "length",
            Builtin::Push => "push",
            Builtin::Pop => "pop",
            Builtin::ForEach => "forEach",
            Builtin::Where => "where",
            Builtin::Select => "select",
            Builtin::OrderBy => "orderBy",
        }
    }

    /// Called as `receiver.name(...)`
    pub fn has_receiver(self) -> bool {
        self != Builtin::Print
    }

    /// Number of explicit arguments
    pub fn arity(self) -> usize {
        match self {
            Builtin::Keys
            | Builtin::Values
            | Builtin::PairKey
            | Builtin::PairValue
            | Builtin::Length
            | Builtin::Pop => 0,
            _ => 1,
        }
    }

    /// Declared type of the explicit argument, given the receiver's type.
    ///
    /// `None` when the receiver has the wrong shape; the operation itself
    /// reports that.
    fn param_type(self, receiver: Option<&TypeDesc>) -> Option<TypeDesc> {
        match (self, receiver) {
            (Builtin::Print, _) => Some(TypeDesc::UNKNOWN),
            (Builtin::Push, Some(ty)) => ty.element().cloned(),
            (Builtin::Add, Some(ty)) => ty.entry_pair(),
            (Builtin::Remove | Builtin::IsKey, Some(ty)) if ty.is(TypeTag::Dict) => {
                ty.key_value().map(|(key, _)| key.clone())
            }
            _ => None,
        }
    }

    fn check_argument(self, receiver: Option<&TypeDesc>, arg: &Value) -> InterpResult<()> {
        let Some(param) = self.param_type(receiver) else {
            return Ok(());
        };
        match param.bind(arg.ty()) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::expression_type(format!(
                "{} expects an argument of type {param}, got {}",
                self.name(),
                arg.ty()
            ))),
        }
    }
}

/// Receiver of a mutating method
enum Receiver {
    /// Rooted at a variable; changes are visible to the caller
    Place(Place),
    /// Any other expression
    Temp(Value),
}

impl Interpreter {
    pub(super) fn call_builtin(
        &mut self,
        builtin: Builtin,
        receiver: Option<&Spanned<Expr>>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> InterpResult<Value> {
        let name = builtin.name();
        if builtin.has_receiver() != receiver.is_some() {
            let message = if builtin.has_receiver() {
                format!("{name} must be called on a receiver, as in x.{name}()")
            } else {
                format!("{name} cannot be called as a method")
            };
            return Err(RuntimeError::interpreter(message).at(span));
        }
        if args.len() != builtin.arity() {
            return Err(RuntimeError::arity_mismatch(name, builtin.arity(), args.len()).at(span));
        }

        trace!(builtin = name, "dispatch");
        self.enter_call(name, span)?;
        let outcome = self.dispatch(builtin, receiver, args, span);
        self.leave_call(name);
        outcome
    }

    fn dispatch(
        &mut self,
        builtin: Builtin,
        receiver: Option<&Spanned<Expr>>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> InterpResult<Value> {
        match (builtin, receiver, args) {
            (Builtin::Print, None, [arg]) => {
                let value = self.eval(arg)?;
                self.output.println(&value.to_string());
                Ok(Value::void())
            }

            (Builtin::Keys, Some(recv), []) => self.eval_value(recv)?.keys().at(span),
            (Builtin::Values, Some(recv), []) => self.eval_value(recv)?.values().at(span),
            (Builtin::PairKey, Some(recv), []) => self.eval_value(recv)?.pair_key().at(span),
            (Builtin::PairValue, Some(recv), []) => self.eval_value(recv)?.pair_value().at(span),
            (Builtin::Length, Some(recv), []) => self.eval_value(recv)?.length().at(span),

            (Builtin::IsKey, Some(recv), [key]) => {
                let dict = self.eval_value(recv)?;
                let key_value = self.eval_value(key)?;
                builtin.check_argument(Some(dict.ty()), &key_value).at(key.span)?;
                dict.has_key(&key_value).map(Value::boolean).at(span)
            }

            (Builtin::Push | Builtin::Add | Builtin::Remove, Some(recv), [arg]) => {
                let mut target = self.receiver(recv)?;
                let arg_value = self.eval_value(arg)?;
                let container = self.receiver_mut(&mut target, recv)?;
                builtin.check_argument(Some(container.ty()), &arg_value).at(arg.span)?;
                match builtin {
                    Builtin::Push => container.push(arg_value).map(|()| Value::void()),
                    Builtin::Add => container.add_pair(arg_value).map(|()| Value::void()),
                    _ => container.remove_key(&arg_value),
                }
                .at(span)
            }

            (Builtin::Pop, Some(recv), []) => {
                let mut target = self.receiver(recv)?;
                self.receiver_mut(&mut target, recv)?.pop().at(span)
            }

            (Builtin::ForEach, Some(recv), [callback]) => {
                let source = self.eval_value(recv)?;
                let (callee, items) = self.query_setup(builtin, &source, recv, callback)?;
                for item in items {
                    self.invoke_callback(&callee, item, callback.span)?;
                }
                Ok(Value::void())
            }

            (Builtin::Where, Some(recv), [callback]) => {
                let source = self.eval_value(recv)?;
                let (callee, items) = self.query_setup(builtin, &source, recv, callback)?;
                let result_ty = callback_return_type(&callee);
                if !result_ty.is(TypeTag::Bool) {
                    return Err(RuntimeError::expression_type(format!(
                        "where callback must return bool, got {result_ty}"
                    ))
                    .at(callback.span));
                }
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    let verdict = self.invoke_callback(&callee, item.clone(), callback.span)?;
                    if verdict.as_bool() == Some(true) {
                        kept.push(item);
                    }
                }
                source.rebuild(kept).at(span)
            }

            (Builtin::Select, Some(recv), [callback]) => {
                let source = self.eval_value(recv)?;
                let (callee, items) = self.query_setup(builtin, &source, recv, callback)?;
                let result_ty = callback_return_type(&callee);
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    mapped.push(self.invoke_callback(&callee, item, callback.span)?);
                }
                match result_ty {
                    TypeDesc::KeyValue {
                        tag: TypeTag::Pair,
                        key,
                        value,
                    } => Value::dict_from_pairs(*key, *value, mapped).at(span),
                    TypeDesc::Base(TypeTag::Void) => Err(RuntimeError::expression_type(
                        "select callback must return a value",
                    )
                    .at(callback.span)),
                    element => Value::list(element, mapped).at(span),
                }
            }

            (Builtin::OrderBy, Some(recv), [callback]) => {
                let source = self.eval_value(recv)?;
                let (callee, items) = self.query_setup(builtin, &source, recv, callback)?;
                let mut keyed = Vec::with_capacity(items.len());
                for item in items {
                    let key = self.invoke_callback(&callee, item.clone(), callback.span)?;
                    keyed.push((key, item));
                }
                // Vec::sort_by is stable: equal keys keep their source order
                keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
                source
                    .rebuild(keyed.into_iter().map(|(_, item)| item).collect())
                    .at(span)
            }

            _ => Err(RuntimeError::interpreter(format!("malformed call to {}", builtin.name())).at(span)),
        }
    }

    fn receiver(&mut self, recv: &Spanned<Expr>) -> InterpResult<Receiver> {
        if recv.node.is_place() {
            Ok(Receiver::Place(self.place(recv)?))
        } else {
            Ok(Receiver::Temp(self.eval(recv)?))
        }
    }

    fn receiver_mut<'a>(
        &'a mut self,
        target: &'a mut Receiver,
        recv: &Spanned<Expr>,
    ) -> InterpResult<&'a mut Value> {
        let value = match target {
            Receiver::Place(place) => self.place_mut(place)?,
            Receiver::Temp(value) => value,
        };
        if !value.is_initialized() {
            let name = match &recv.node {
                Expr::Var(name) => Some(name.as_str()),
                _ => None,
            };
            return Err(RuntimeError::uninitialized(name).at(recv.span));
        }
        Ok(value)
    }

    /// Resolve the callback and collect the receiver's items
    fn query_setup(
        &self,
        builtin: Builtin,
        source: &Value,
        recv: &Spanned<Expr>,
        callback: &Spanned<Expr>,
    ) -> InterpResult<(Callee, Vec<Value>)> {
        let items = source.query_items(builtin.name()).at(recv.span)?;
        let callee = self.callback(callback)?;
        Ok((callee, items))
    }

    /// A callback is written as a bare name or an empty call: `isBig` or `isBig()`
    fn callback(&self, expr: &Spanned<Expr>) -> InterpResult<Callee> {
        let name = match &expr.node {
            Expr::Var(name) => name,
            Expr::Call { name, args } if args.is_empty() => &name.node,
            _ => {
                return Err(RuntimeError::interpreter(
                    "callback must name a function, as in xs.where(isEven)",
                )
                .at(expr.span));
            }
        };
        match self.resolve(name).at(expr.span)? {
            Callee::User(def) if def.params.len() != 1 => Err(RuntimeError::new(
                ErrorKind::ArityMismatch,
                format!("callback {name} must take exactly one parameter, it takes {}", def.params.len()),
            )
            .at(expr.span)),
            Callee::Builtin(b) if b.has_receiver() => Err(RuntimeError::interpreter(format!(
                "{} cannot be used as a callback",
                b.name()
            ))
            .at(expr.span)),
            callee => Ok(callee),
        }
    }

    fn invoke_callback(&mut self, callee: &Callee, arg: Value, span: Span) -> InterpResult<Value> {
        match callee {
            Callee::User(def) => self.invoke_user(def, vec![arg], span),
            Callee::Builtin(builtin) => {
                self.enter_call(builtin.name(), span)?;
                self.output.println(&arg.to_string());
                self.leave_call(builtin.name());
                Ok(Value::void())
            }
        }
    }
}

fn callback_return_type(callee: &Callee) -> TypeDesc {
    match callee {
        Callee::User(def) => TypeDesc::from(&def.ret_ty.node),
        Callee::Builtin(_) => TypeDesc::VOID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("map"), None);
    }

    #[test]
    fn test_only_print_is_free() {
        let free: Vec<_> = Builtin::ALL.into_iter().filter(|b| !b.has_receiver()).collect();
        assert_eq!(free, vec![Builtin::Print]);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Builtin::Length.arity(), 0);
        assert_eq!(Builtin::Pop.arity(), 0);
        assert_eq!(Builtin::Push.arity(), 1);
        assert_eq!(Builtin::OrderBy.arity(), 1);
    }

    #[test]
    fn test_push_argument_checked_against_element_type() {
        let list = TypeDesc::list(TypeDesc::INT);
        assert!(Builtin::Push.check_argument(Some(&list), &Value::int(1)).is_ok());
        let err = Builtin::Push
            .check_argument(Some(&list), &Value::string("x"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpressionTypeError);
    }

    #[test]
    fn test_print_accepts_anything() {
        let pair = Value::pair(Value::string("k"), Value::float(1.5));
        assert!(Builtin::Print.check_argument(None, &pair).is_ok());
    }

    #[test]
    fn test_add_expects_entry_pair() {
        let dict = TypeDesc::dict(TypeDesc::STRING, TypeDesc::INT);
        let good = Value::pair(Value::string("a"), Value::int(1));
        let bad = Value::pair(Value::int(1), Value::int(1));
        assert!(Builtin::Add.check_argument(Some(&dict), &good).is_ok());
        assert!(Builtin::Add.check_argument(Some(&dict), &bad).is_err());
    }
}
