//! Runtime type descriptors
//!
//! Every value carries a [`TypeDesc`]; declared types of variables,
//! parameters and return values are converted into the same form so that
//! checks are plain structural equality.

use crate::ast::Type;
use std::fmt;

/// Closed set of type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Void,
    Int,
    Float,
    Bool,
    String,
    Pair,
    List,
    Dict,
    /// Placeholder for built-in parameters, bound on first use
    Unknown,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Void => "void",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::String => "string",
            TypeTag::Pair => "Pair",
            TypeTag::List => "List",
            TypeTag::Dict => "Dict",
            TypeTag::Unknown => "?",
        }
    }
}

/// Structural type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Scalar tag (or `Unknown`)
    Base(TypeTag),
    /// `List<element>`
    Element { tag: TypeTag, element: Box<TypeDesc> },
    /// `Pair<key, value>` and `Dict<key, value>`
    KeyValue {
        tag: TypeTag,
        key: Box<TypeDesc>,
        value: Box<TypeDesc>,
    },
}

impl TypeDesc {
    pub const VOID: TypeDesc = TypeDesc::Base(TypeTag::Void);
    pub const INT: TypeDesc = TypeDesc::Base(TypeTag::Int);
    pub const FLOAT: TypeDesc = TypeDesc::Base(TypeTag::Float);
    pub const BOOL: TypeDesc = TypeDesc::Base(TypeTag::Bool);
    pub const STRING: TypeDesc = TypeDesc::Base(TypeTag::String);
    pub const UNKNOWN: TypeDesc = TypeDesc::Base(TypeTag::Unknown);

    pub fn list(element: TypeDesc) -> Self {
        TypeDesc::Element {
            tag: TypeTag::List,
            element: Box::new(element),
        }
    }

    pub fn dict(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::KeyValue {
            tag: TypeTag::Dict,
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn pair(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::KeyValue {
            tag: TypeTag::Pair,
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            TypeDesc::Base(tag) => *tag,
            TypeDesc::Element { tag, .. } | TypeDesc::KeyValue { tag, .. } => *tag,
        }
    }

    pub fn is(&self, tag: TypeTag) -> bool {
        self.tag() == tag
    }

    /// Element type of a `List`
    pub fn element(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Element { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Key and value types of a `Pair` or `Dict`
    pub fn key_value(&self) -> Option<(&TypeDesc, &TypeDesc)> {
        match self {
            TypeDesc::KeyValue { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }

    /// The `Pair` type a `Dict` presents its entries as
    pub fn entry_pair(&self) -> Option<TypeDesc> {
        match self {
            TypeDesc::KeyValue {
                tag: TypeTag::Dict,
                key,
                value,
            } => Some(TypeDesc::pair((**key).clone(), (**value).clone())),
            _ => None,
        }
    }

    /// Match a possibly-`Unknown` parameter type against an argument type.
    ///
    /// Returns the concrete type the parameter takes on, or `None` if the
    /// shapes disagree. Each `Unknown` binds to whatever occupies its slot.
    pub fn bind(&self, actual: &TypeDesc) -> Option<TypeDesc> {
        match (self, actual) {
            (TypeDesc::Base(TypeTag::Unknown), _) => Some(actual.clone()),
            (TypeDesc::Base(a), TypeDesc::Base(b)) => (a == b).then(|| actual.clone()),
            (
                TypeDesc::Element { tag: a, element: pe },
                TypeDesc::Element { tag: b, element: ae },
            ) if a == b => Some(TypeDesc::Element {
                tag: *a,
                element: Box::new(pe.bind(ae)?),
            }),
            (
                TypeDesc::KeyValue { tag: a, key: pk, value: pv },
                TypeDesc::KeyValue { tag: b, key: ak, value: av },
            ) if a == b => Some(TypeDesc::KeyValue {
                tag: *a,
                key: Box::new(pk.bind(ak)?),
                value: Box::new(pv.bind(av)?),
            }),
            _ => None,
        }
    }
}

impl From<&Type> for TypeDesc {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Void => TypeDesc::VOID,
            Type::Int => TypeDesc::INT,
            Type::Float => TypeDesc::FLOAT,
            Type::Bool => TypeDesc::BOOL,
            Type::String => TypeDesc::STRING,
            Type::List(elem) => TypeDesc::list(elem.as_ref().into()),
            Type::Dict(k, v) => TypeDesc::dict(k.as_ref().into(), v.as_ref().into()),
            Type::Pair(k, v) => TypeDesc::pair(k.as_ref().into(), v.as_ref().into()),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Base(tag) => write!(f, "{}", tag.name()),
            TypeDesc::Element { tag, element } => write!(f, "{}<{element}>", tag.name()),
            TypeDesc::KeyValue { tag, key, value } => {
                write!(f, "{}<{key}, {value}>", tag.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = TypeDesc::dict(TypeDesc::STRING, TypeDesc::list(TypeDesc::INT));
        let b = TypeDesc::from(&Type::Dict(
            Box::new(Type::String),
            Box::new(Type::List(Box::new(Type::Int))),
        ));
        assert_eq!(a, b);
        assert_ne!(a, TypeDesc::dict(TypeDesc::STRING, TypeDesc::list(TypeDesc::FLOAT)));
        assert_ne!(
            TypeDesc::pair(TypeDesc::INT, TypeDesc::INT),
            TypeDesc::dict(TypeDesc::INT, TypeDesc::INT)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeDesc::INT.to_string(), "int");
        assert_eq!(TypeDesc::list(TypeDesc::STRING).to_string(), "List<string>");
        assert_eq!(
            TypeDesc::dict(TypeDesc::STRING, TypeDesc::pair(TypeDesc::INT, TypeDesc::BOOL)).to_string(),
            "Dict<string, Pair<int, bool>>"
        );
    }

    #[test]
    fn test_components() {
        let list = TypeDesc::list(TypeDesc::FLOAT);
        assert_eq!(list.element(), Some(&TypeDesc::FLOAT));
        assert_eq!(list.key_value(), None);

        let dict = TypeDesc::dict(TypeDesc::STRING, TypeDesc::INT);
        assert_eq!(dict.key_value(), Some((&TypeDesc::STRING, &TypeDesc::INT)));
        assert_eq!(dict.entry_pair(), Some(TypeDesc::pair(TypeDesc::STRING, TypeDesc::INT)));
        assert_eq!(TypeDesc::pair(TypeDesc::INT, TypeDesc::INT).entry_pair(), None);
    }

    #[test]
    fn test_bind_unknown_adopts_argument() {
        let list = TypeDesc::list(TypeDesc::INT);
        assert_eq!(TypeDesc::UNKNOWN.bind(&list), Some(list.clone()));
        assert_eq!(TypeDesc::list(TypeDesc::UNKNOWN).bind(&list), Some(list));
    }

    #[test]
    fn test_bind_rejects_shape_mismatch() {
        let dict = TypeDesc::dict(TypeDesc::INT, TypeDesc::INT);
        assert_eq!(TypeDesc::list(TypeDesc::UNKNOWN).bind(&dict), None);
        assert_eq!(TypeDesc::INT.bind(&TypeDesc::FLOAT), None);
        assert_eq!(
            TypeDesc::pair(TypeDesc::UNKNOWN, TypeDesc::STRING)
                .bind(&TypeDesc::pair(TypeDesc::INT, TypeDesc::INT)),
            None
        );
    }
}
