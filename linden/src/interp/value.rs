//! Runtime values for the interpreter
//!
//! A [`Value`] pairs a [`TypeDesc`] with its payload. The type is fixed when
//! the value is built: replacing contents through [`Value::change_value`] or
//! the container operations below never changes it. Containers own their
//! elements outright, so copying a value copies the whole tree.

use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::types::{TypeDesc, TypeTag};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime value
#[derive(Debug, Clone)]
pub struct Value {
    ty: TypeDesc,
    data: Data,
}

/// Payload of a value
#[derive(Debug, Clone)]
pub enum Data {
    /// Declared but never assigned
    Uninit,
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    /// Dict entries in insertion order; a Pair holds exactly one
    Map(IndexMap<Value, Value>),
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value {
            ty: TypeDesc::INT,
            data: Data::Int(n),
        }
    }

    pub fn float(x: f64) -> Self {
        Value {
            ty: TypeDesc::FLOAT,
            data: Data::Float(x),
        }
    }

    pub fn boolean(b: bool) -> Self {
        Value {
            ty: TypeDesc::BOOL,
            data: Data::Bool(b),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value {
            ty: TypeDesc::STRING,
            data: Data::Str(s.into()),
        }
    }

    pub fn void() -> Self {
        Value {
            ty: TypeDesc::VOID,
            data: Data::Void,
        }
    }

    /// Type-tagged placeholder for a declared, unassigned variable
    pub fn uninit(ty: TypeDesc) -> Self {
        Value {
            ty,
            data: Data::Uninit,
        }
    }

    /// Build a `List<element>`; every item must have the element type.
    pub fn list(element: TypeDesc, items: Vec<Value>) -> InterpResult<Self> {
        for item in &items {
            item.require_init()?;
            if item.ty != element {
                return Err(RuntimeError::expression_type(format!(
                    "List<{element}> cannot hold a value of type {}",
                    item.ty
                )));
            }
        }
        Ok(Value {
            ty: TypeDesc::list(element),
            data: Data::List(items),
        })
    }

    /// Build a `Pair` whose type follows its key and value.
    pub fn pair(key: Value, value: Value) -> Self {
        let ty = TypeDesc::pair(key.ty.clone(), value.ty.clone());
        let mut map = IndexMap::with_capacity(1);
        map.insert(key, value);
        Value {
            ty,
            data: Data::Map(map),
        }
    }

    /// Build a `Dict<key, value>` from `Pair<key, value>` values.
    ///
    /// Fails with `DuplicateKeyError` on a repeated key.
    pub fn dict_from_pairs(key: TypeDesc, value: TypeDesc, pairs: Vec<Value>) -> InterpResult<Self> {
        let mut dict = Value {
            ty: TypeDesc::dict(key, value),
            data: Data::Map(IndexMap::with_capacity(pairs.len())),
        };
        for pair in pairs {
            dict.add_pair(pair)?;
        }
        Ok(dict)
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    /// Read-only view of the payload
    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.data, Data::Uninit)
    }

    /// Fail with `UninitializedValue` for a placeholder.
    pub fn require_init(&self) -> InterpResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(RuntimeError::uninitialized(None))
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            Data::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.data {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match &self.data {
            Data::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Replace the payload, keeping the type.
    pub fn change_value(&mut self, new: Value) -> InterpResult<()> {
        if new.ty != self.ty {
            return Err(RuntimeError::type_mismatch(&self.ty, &new.ty));
        }
        self.data = new.data;
        Ok(())
    }

    // ------------------------------------------------------------
    // Container operations
    // ------------------------------------------------------------

    fn expect_tag(&self, tag: TypeTag, op: &str) -> InterpResult<()> {
        self.require_init()?;
        if self.ty.is(tag) {
            Ok(())
        } else {
            Err(RuntimeError::expression_type(format!(
                "{op} expects a {} receiver, got {}",
                tag.name(),
                self.ty
            )))
        }
    }

    fn map_mut(&mut self) -> InterpResult<&mut IndexMap<Value, Value>> {
        match &mut self.data {
            Data::Map(map) => Ok(map),
            _ => Err(RuntimeError::interpreter(format!("{} has no entries", self.ty))),
        }
    }

    fn list_mut(&mut self) -> InterpResult<&mut Vec<Value>> {
        match &mut self.data {
            Data::List(items) => Ok(items),
            _ => Err(RuntimeError::interpreter(format!("{} has no elements", self.ty))),
        }
    }

    fn list_position(&self, index: &Value, len: usize) -> InterpResult<usize> {
        let i = index.as_int().ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::IndexError,
                format!("list index must be int, got {}", index.ty),
            )
        })?;
        usize::try_from(i)
            .ok()
            .filter(|&pos| pos < len)
            .ok_or_else(|| RuntimeError::index_out_of_bounds(i, len))
    }

    fn check_key(&self, key: &Value) -> InterpResult<()> {
        key.require_init()?;
        match self.ty.key_value() {
            Some((expected, _)) if *expected == key.ty => Ok(()),
            Some((expected, _)) => Err(RuntimeError::new(
                ErrorKind::KeyError,
                format!("{} key must be {expected}, got {}", self.ty, key.ty),
            )),
            None => Err(RuntimeError::expression_type(format!("{} has no keys", self.ty))),
        }
    }

    /// `self[index]` for List, Dict and Pair values
    pub fn element(&self, index: &Value) -> InterpResult<Value> {
        self.require_init()?;
        index.require_init()?;
        match &self.data {
            Data::List(items) => {
                let pos = self.list_position(index, items.len())?;
                Ok(items[pos].clone())
            }
            Data::Map(map) => {
                self.check_key(index)?;
                map.get(index)
                    .cloned()
                    .ok_or_else(|| RuntimeError::key_not_found(index.debug_repr()))
            }
            _ => Err(RuntimeError::expression_type(format!(
                "a value of type {} cannot be indexed",
                self.ty
            ))),
        }
    }

    /// Mutable `self[index]`; the element must already exist.
    pub fn element_mut(&mut self, index: &Value) -> InterpResult<&mut Value> {
        self.require_init()?;
        index.require_init()?;
        match self.ty.tag() {
            TypeTag::List => {
                let len = self.as_list().map_or(0, <[Value]>::len);
                let pos = self.list_position(index, len)?;
                Ok(&mut self.list_mut()?[pos])
            }
            TypeTag::Dict | TypeTag::Pair => {
                self.check_key(index)?;
                let missing = RuntimeError::key_not_found(index.debug_repr());
                self.map_mut()?.get_mut(index).ok_or(missing)
            }
            _ => Err(RuntimeError::expression_type(format!(
                "a value of type {} cannot be indexed",
                self.ty
            ))),
        }
    }

    /// `self[index] = new`: replace a List element, upsert a Dict entry, or
    /// update the value of a Pair whose key matches.
    pub fn set_element(&mut self, index: Value, new: Value) -> InterpResult<()> {
        new.require_init()
            .map_err(|_| RuntimeError::assignment("cannot assign an uninitialized value"))?;
        let expected = match &self.ty {
            TypeDesc::Element { element, .. } => (**element).clone(),
            TypeDesc::KeyValue { value, .. } => (**value).clone(),
            other => {
                return Err(RuntimeError::expression_type(format!(
                    "a value of type {other} cannot be indexed"
                )));
            }
        };
        if new.ty != expected {
            return Err(RuntimeError::assignment(format!(
                "cannot store {} into {}",
                new.ty, self.ty
            )));
        }
        if self.ty.is(TypeTag::Dict) {
            self.require_init()?;
            self.check_key(&index)?;
            self.map_mut()?.insert(index, new);
            return Ok(());
        }
        *self.element_mut(&index)? = new;
        Ok(())
    }

    /// `List.push`
    pub fn push(&mut self, item: Value) -> InterpResult<()> {
        self.expect_tag(TypeTag::List, "push")?;
        item.require_init()?;
        if self.ty.element() != Some(&item.ty) {
            return Err(RuntimeError::expression_type(format!(
                "cannot push {} onto {}",
                item.ty, self.ty
            )));
        }
        self.list_mut()?.push(item);
        Ok(())
    }

    /// `List.pop`; an empty list fails with `EmptyContainer`.
    pub fn pop(&mut self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::List, "pop")?;
        self.list_mut()?
            .pop()
            .ok_or_else(|| RuntimeError::empty_container("pop"))
    }

    /// `List.length`
    pub fn length(&self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::List, "length")?;
        let len = self.as_list().map_or(0, <[Value]>::len);
        i64::try_from(len)
            .map(Value::int)
            .map_err(|_| RuntimeError::overflow("length"))
    }

    /// `Dict.add`; the key must not be present yet.
    pub fn add_pair(&mut self, pair: Value) -> InterpResult<()> {
        self.expect_tag(TypeTag::Dict, "add")?;
        pair.require_init()?;
        if self.ty.entry_pair().as_ref() != Some(&pair.ty) {
            return Err(RuntimeError::expression_type(format!(
                "cannot add {} to {}",
                pair.ty, self.ty
            )));
        }
        let (key, value) = pair.into_entry()?;
        let map = self.map_mut()?;
        if map.contains_key(&key) {
            return Err(RuntimeError::duplicate_key(key.debug_repr()));
        }
        map.insert(key, value);
        Ok(())
    }

    /// `Dict.remove`; returns the removed value.
    pub fn remove_key(&mut self, key: &Value) -> InterpResult<Value> {
        self.expect_tag(TypeTag::Dict, "remove")?;
        self.check_key(key)?;
        let missing = RuntimeError::key_not_found(key.debug_repr());
        self.map_mut()?.shift_remove(key).ok_or(missing)
    }

    /// `Dict.isKey`
    pub fn has_key(&self, key: &Value) -> InterpResult<bool> {
        self.expect_tag(TypeTag::Dict, "isKey")?;
        self.check_key(key)?;
        Ok(self.as_map().is_some_and(|map| map.contains_key(key)))
    }

    /// `Dict.keys` as a `List<K>`
    pub fn keys(&self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::Dict, "keys")?;
        let (key_ty, _) = self.dict_types()?;
        let keys: Vec<Value> = self.as_map().map(|m| m.keys().cloned().collect()).unwrap_or_default();
        Value::list(key_ty, keys)
    }

    /// `Dict.values` as a `List<V>`
    pub fn values(&self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::Dict, "values")?;
        let (_, value_ty) = self.dict_types()?;
        let values: Vec<Value> = self.as_map().map(|m| m.values().cloned().collect()).unwrap_or_default();
        Value::list(value_ty, values)
    }

    fn dict_types(&self) -> InterpResult<(TypeDesc, TypeDesc)> {
        self.ty
            .key_value()
            .map(|(k, v)| (k.clone(), v.clone()))
            .ok_or_else(|| RuntimeError::interpreter(format!("{} has no key type", self.ty)))
    }

    /// `Pair.key`
    pub fn pair_key(&self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::Pair, "key")?;
        Ok(self.clone().into_entry()?.0)
    }

    /// `Pair.value`
    pub fn pair_value(&self) -> InterpResult<Value> {
        self.expect_tag(TypeTag::Pair, "value")?;
        Ok(self.clone().into_entry()?.1)
    }

    fn into_entry(self) -> InterpResult<(Value, Value)> {
        match self.data {
            Data::Map(map) if map.len() == 1 => map
                .into_iter()
                .next()
                .ok_or_else(|| RuntimeError::interpreter("empty pair")),
            _ => Err(RuntimeError::interpreter(format!("{} is not a pair", self.ty))),
        }
    }

    /// Items a query method iterates: List elements, or Dict entries as Pairs.
    pub fn query_items(&self, op: &str) -> InterpResult<Vec<Value>> {
        self.require_init()?;
        match &self.data {
            Data::List(items) => Ok(items.clone()),
            Data::Map(map) if self.ty.is(TypeTag::Dict) => Ok(map
                .iter()
                .map(|(k, v)| Value::pair(k.clone(), v.clone()))
                .collect()),
            _ => Err(RuntimeError::expression_type(format!(
                "{op} expects a List or Dict receiver, got {}",
                self.ty
            ))),
        }
    }

    /// Rebuild a container of this value's type from query items.
    pub fn rebuild(&self, items: Vec<Value>) -> InterpResult<Value> {
        match &self.ty {
            TypeDesc::Element { element, .. } => Value::list((**element).clone(), items),
            TypeDesc::KeyValue { key, value, .. } => {
                Value::dict_from_pairs((**key).clone(), (**value).clone(), items)
            }
            other => Err(RuntimeError::interpreter(format!("cannot rebuild {other}"))),
        }
    }

    /// Total order used by `orderBy`: type name first, then payload.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        let by_type = self.ty.to_string().cmp(&other.ty.to_string());
        if by_type != Ordering::Equal {
            return by_type;
        }
        match (&self.data, &other.data) {
            (Data::Int(a), Data::Int(b)) => a.cmp(b),
            (Data::Float(a), Data::Float(b)) => a.total_cmp(b),
            (Data::Bool(a), Data::Bool(b)) => a.cmp(b),
            (Data::Str(a), Data::Str(b)) => a.cmp(b),
            (Data::List(a), Data::List(b)) => cmp_seq(a.iter(), b.iter()),
            (Data::Map(a), Data::Map(b)) => {
                cmp_seq(a.iter().flat_map(|(k, v)| [k, v]), b.iter().flat_map(|(k, v)| [k, v]))
            }
            (a, b) => data_rank(a).cmp(&data_rank(b)),
        }
    }

    /// Rendering used inside containers and error messages: strings quoted.
    pub fn debug_repr(&self) -> String {
        match &self.data {
            Data::Str(s) => format!("{s:?}"),
            _ => self.to_string(),
        }
    }
}

fn cmp_seq<'a>(a: impl Iterator<Item = &'a Value>, b: impl Iterator<Item = &'a Value>) -> Ordering {
    let mut b = b;
    for x in a {
        match b.next() {
            Some(y) => match x.total_cmp(y) {
                Ordering::Equal => {}
                ord => return ord,
            },
            None => return Ordering::Greater,
        }
    }
    if b.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn data_rank(data: &Data) -> u8 {
    match data {
        Data::Uninit => 0,
        Data::Void => 1,
        Data::Int(_) => 2,
        Data::Float(_) => 3,
        Data::Bool(_) => 4,
        Data::Str(_) => 5,
        Data::List(_) => 6,
        Data::Map(_) => 7,
    }
}

/// Structural identity, used for Dict keys. Floats compare by bit pattern
/// and entries compare in order, which keeps `Eq` consistent with `Hash`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.data, &other.data) {
            (Data::Uninit, Data::Uninit) | (Data::Void, Data::Void) => true,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => float_key(*a) == float_key(*b),
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Str(a), Data::Str(b)) => a == b,
            (Data::List(a), Data::List(b)) => a == b,
            (Data::Map(a), Data::Map(b)) => a.len() == b.len() && a.iter().eq(b.iter()),
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Bit pattern used for key identity: `-0.0` and `0.0` are one key, and a
/// NaN matches itself
fn float_key(x: f64) -> u64 {
    if x == 0.0 { 0 } else { x.to_bits() }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        std::mem::discriminant(&self.data).hash(state);
        match &self.data {
            Data::Uninit | Data::Void => {}
            Data::Int(n) => n.hash(state),
            Data::Float(x) => float_key(*x).hash(state),
            Data::Bool(b) => b.hash(state),
            Data::Str(s) => s.hash(state),
            Data::List(items) => items.hash(state),
            Data::Map(map) => {
                map.len().hash(state);
                for (k, v) in map {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Data::Uninit => write!(f, "<uninitialized>"),
            Data::Void => write!(f, "void"),
            Data::Int(n) => write!(f, "{n}"),
            Data::Float(x) => write!(f, "{x:?}"),
            Data::Bool(b) => write!(f, "{b}"),
            Data::Str(s) => write!(f, "{s}"),
            Data::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.debug_repr())?;
                }
                write!(f, "]")
            }
            Data::Map(map) if self.ty.is(TypeTag::Pair) => {
                for (k, v) in map {
                    write!(f, "({}, {})", k.debug_repr(), v.debug_repr())?;
                }
                Ok(())
            }
            Data::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k.debug_repr(), v.debug_repr())?;
                }
                write!(f, "}}")
            }
        }
    }
}
