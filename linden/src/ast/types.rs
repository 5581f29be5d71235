//! Type AST nodes

use serde::{Deserialize, Serialize};

/// A type as written in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// Only valid as a function return type
    Void,
    Int,
    Float,
    Bool,
    String,
    /// List<T>
    List(Box<Type>),
    /// Dict<K, V>
    Dict(Box<Type>, Box<Type>),
    /// Pair<K, V>
    Pair(Box<Type>, Box<Type>),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::List(elem) => write!(f, "List<{elem}>"),
            Type::Dict(k, v) => write!(f, "Dict<{k}, {v}>"),
            Type::Pair(k, v) => write!(f, "Pair<{k}, {v}>"),
        }
    }
}
