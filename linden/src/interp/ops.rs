//! Operator semantics: arithmetic, comparison, equality, negation, casts
//!
//! | op        | int,int | float,float | int,float | string,string | int,string |
//! |-----------|---------|-------------|-----------|---------------|------------|
//! | `+`       | int     | float       | float     | concat        | -          |
//! | `-`       | int     | float       | float     | -             | -          |
//! | `*`       | int     | float       | float     | -             | repeat     |
//! | `/`       | float   | float       | float     | -             | -          |
//! | `< > <= >=` | bool  | bool        | bool      | -             | -          |
//!
//! Operands reaching these functions are already initialized.

use super::error::{InterpResult, RuntimeError};
use super::types::{TypeDesc, TypeTag};
use super::value::{Data, Value};
use crate::ast::{BinOp, UnOp};

/// Numeric view of an operand
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value.data() {
            Data::Int(n) => Some(Num::Int(*n)),
            Data::Float(x) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }
}

/// Apply a non-short-circuit binary operator
pub fn binary(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => arithmetic(op, left, right),
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => compare(op, left, right),
        BinOp::Eq => values_equal(left, right).map(Value::boolean),
        BinOp::Ne => values_equal(left, right).map(|eq| Value::boolean(!eq)),
        BinOp::And | BinOp::Or => match (left.as_bool(), right.as_bool()) {
            (Some(a), Some(b)) => Ok(Value::boolean(if op == BinOp::And { a && b } else { a || b })),
            _ => Err(RuntimeError::operand_types(op, left.ty(), right.ty())),
        },
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    if let (Some(a), Some(b)) = (Num::of(left), Num::of(right)) {
        return numeric(op, a, b);
    }
    match (op, left.data(), right.data()) {
        (BinOp::Add, Data::Str(a), Data::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
        (BinOp::Mul, Data::Str(s), Data::Int(n)) | (BinOp::Mul, Data::Int(n), Data::Str(s)) => {
            Ok(Value::string(repeat(s, *n)))
        }
        _ => Err(RuntimeError::operand_types(op, left.ty(), right.ty())),
    }
}

fn numeric(op: BinOp, a: Num, b: Num) -> InterpResult<Value> {
    if op == BinOp::Div {
        let divisor = b.to_f64();
        if divisor == 0.0 {
            return Err(RuntimeError::division_by_zero());
        }
        return Ok(Value::float(a.to_f64() / divisor));
    }
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => {
            let result = match op {
                BinOp::Add => x.checked_add(y),
                BinOp::Sub => x.checked_sub(y),
                BinOp::Mul => x.checked_mul(y),
                _ => return Err(RuntimeError::interpreter(format!("{op} is not arithmetic"))),
            };
            result.map(Value::int).ok_or_else(|| RuntimeError::overflow(op))
        }
        _ => {
            let (x, y) = (a.to_f64(), b.to_f64());
            let result = match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                _ => return Err(RuntimeError::interpreter(format!("{op} is not arithmetic"))),
            };
            Ok(Value::float(result))
        }
    }
}

/// String repetition; a non-positive count gives the empty string
fn repeat(s: &str, n: i64) -> String {
    usize::try_from(n).map_or_else(|_| String::new(), |count| s.repeat(count))
}

fn compare(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    let (a, b) = match (Num::of(left), Num::of(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(RuntimeError::operand_types(op, left.ty(), right.ty())),
    };
    let result = match (a, b) {
        (Num::Int(x), Num::Int(y)) => match op {
            BinOp::Lt => x < y,
            BinOp::Gt => x > y,
            BinOp::Le => x <= y,
            _ => x >= y,
        },
        _ => {
            let (x, y) = (a.to_f64(), b.to_f64());
            match op {
                BinOp::Lt => x < y,
                BinOp::Gt => x > y,
                BinOp::Le => x <= y,
                _ => x >= y,
            }
        }
    };
    Ok(Value::boolean(result))
}

/// Language-level `==`.
///
/// Int and Float compare by numeric value. Other operands must share a type;
/// containers compare element-wise, Dicts without regard to entry order.
pub fn values_equal(left: &Value, right: &Value) -> InterpResult<bool> {
    if let (Some(a), Some(b)) = (Num::of(left), Num::of(right)) {
        return Ok(match (a, b) {
            (Num::Int(x), Num::Int(y)) => x == y,
            _ => a.to_f64() == b.to_f64(),
        });
    }
    if left.ty() != right.ty() {
        return Err(RuntimeError::operand_types(BinOp::Eq, left.ty(), right.ty()));
    }
    match (left.data(), right.data()) {
        (Data::List(a), Data::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Data::Map(a), Data::Map(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (k, v) in a {
                match b.get(k) {
                    Some(other) if values_equal(v, other)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        _ => Ok(left == right),
    }
}

/// Apply a unary operator
pub fn unary(op: UnOp, operand: &Value) -> InterpResult<Value> {
    match (op, operand.data()) {
        (UnOp::Neg, Data::Int(n)) => n
            .checked_neg()
            .map(Value::int)
            .ok_or_else(|| RuntimeError::overflow(op)),
        (UnOp::Neg, Data::Float(x)) => Ok(Value::float(-x)),
        (UnOp::Not, Data::Bool(b)) => Ok(Value::boolean(!b)),
        _ => Err(RuntimeError::expression_type(format!(
            "operator {op} is not defined for {}",
            operand.ty()
        ))),
    }
}

/// `(target) value`
///
/// Supported: bool/int/float to string, float/bool to int. Casting a value
/// to its own type is the identity.
pub fn cast(value: &Value, target: &TypeDesc) -> InterpResult<Value> {
    if value.ty() == target {
        return Ok(value.clone());
    }
    match (target.tag(), value.data()) {
        (TypeTag::String, Data::Bool(b)) => Ok(Value::string(b.to_string())),
        (TypeTag::String, Data::Int(n)) => Ok(Value::string(n.to_string())),
        (TypeTag::String, Data::Float(x)) => Ok(Value::string(format!("{x:?}"))),
        (TypeTag::Int, Data::Bool(b)) => Ok(Value::int(i64::from(*b))),
        (TypeTag::Int, Data::Float(x)) => float_to_int(*x)
            .map(Value::int)
            .ok_or_else(|| RuntimeError::cast(format!("{x:?}"), target)),
        _ => Err(RuntimeError::cast(value.ty(), target)),
    }
}

/// Truncate toward zero; NaN and out-of-range values are rejected.
fn float_to_int(x: f64) -> Option<i64> {
    let t = x.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}
