//! Named, typed storage cells

use super::error::{InterpResult, RuntimeError};
use super::types::TypeDesc;
use super::value::Value;

/// A declared variable. Its type never changes; every store is re-checked.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    ty: TypeDesc,
    value: Value,
}

impl Variable {
    /// Declaration without an initializer
    pub fn declare(name: impl Into<String>, ty: TypeDesc) -> Self {
        Variable {
            name: name.into(),
            value: Value::uninit(ty.clone()),
            ty,
        }
    }

    /// Declaration with an initializer, also used to bind parameters
    pub fn initialize(name: impl Into<String>, ty: TypeDesc, value: Value) -> InterpResult<Self> {
        let name = name.into();
        if !value.is_initialized() || *value.ty() != ty {
            let got = if value.is_initialized() {
                value.ty().to_string()
            } else {
                "an uninitialized value".to_string()
            };
            return Err(RuntimeError::initialization(&name, &ty, got));
        }
        Ok(Variable { name, ty, value })
    }

    /// Store a new value, keeping the declared type.
    pub fn assign(&mut self, value: Value) -> InterpResult<()> {
        if !value.is_initialized() {
            return Err(RuntimeError::assignment(format!(
                "cannot assign an uninitialized value to {}",
                self.name
            )));
        }
        if *value.ty() != self.ty {
            return Err(RuntimeError::assignment(format!(
                "cannot assign {} to {} of type {}",
                value.ty(),
                self.name,
                self.ty
            )));
        }
        self.value.change_value(value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// In-place access for container methods; they preserve the type.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
}
