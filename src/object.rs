//! Dynamic value model for anything a Hessian2 stream can carry.
//!
//! [`Object`] is a closed sum type. Every variant supports structural equality and a
//! hash consistent with it. Container hashes only mix in the type name and the
//! element count, so unequal containers of the same shape collide on purpose; the
//! equality check resolves those collisions.

use bytes::Bytes;
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type UntypedList = Vec<Object>;
pub type UntypedMap = IndexMap<Object, Object>;

/// Named, ordered field layout shared by all class instances of one type.
///
/// Two definitions are equal when both the type name and the field name
/// sequence match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Definition {
    pub type_name: String,
    pub field_names: Vec<String>,
}

impl Definition {
    pub fn new(type_name: impl Into<String>, field_names: Vec<String>) -> Self {
        Definition {
            type_name: type_name.into(),
            field_names,
        }
    }

    pub fn to_debug_string(&self) -> String {
        format!(
            "type: {} , field_list: {}",
            self.type_name,
            self.field_names.join(" ")
        )
    }
}

/// A list carrying an element type. Encoding requires a non-empty `type_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypedList {
    pub type_name: String,
    pub values: UntypedList,
}

/// A map carrying a type name. Encoding requires a non-empty `type_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedMap {
    pub type_name: String,
    pub entries: UntypedMap,
}

/// One instance of a class: a shared definition plus positional field values.
///
/// `data.len()` must match `def.field_names.len()` for the instance to be encodable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInstance {
    pub def: Arc<Definition>,
    pub data: Vec<Object>,
}

impl ClassInstance {
    pub fn new(def: Arc<Definition>, data: Vec<Object>) -> Self {
        ClassInstance { def, data }
    }

    /// Field value by name, resolved through the definition's field order.
    pub fn get(&self, field: &str) -> Option<&Object> {
        let pos = self.def.field_names.iter().position(|f| f == field)?;
        self.data.get(pos)
    }
}

/// Discriminant of an [`Object`], as reported by [`Object::object_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Binary,
    Boolean,
    Date,
    Double,
    Integer,
    Long,
    Null,
    Ref,
    String,
    TypedList,
    UntypedList,
    TypedMap,
    UntypedMap,
    Class,
}

/// A decoded (or to-be-encoded) Hessian2 value.
///
/// `Ref` holds the session-wide index of a list, map or class instance that was
/// started earlier in the stream. It never owns its target; use
/// [`Object::resolve_ref`] on the decoded root to find it.
#[derive(Debug, Clone, Default)]
pub enum Object {
    #[default]
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    Binary(Bytes),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    String(String),
    Ref(u32),
    TypedList(TypedList),
    UntypedList(UntypedList),
    TypedMap(TypedMap),
    UntypedMap(UntypedMap),
    ClassInstance(ClassInstance),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Long(a), Object::Long(b)) => a == b,
            (Object::Double(a), Object::Double(b)) => a.to_bits() == b.to_bits(),
            (Object::Binary(a), Object::Binary(b)) => a == b,
            (Object::Date(a), Object::Date(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Ref(a), Object::Ref(b)) => a == b,
            (Object::TypedList(a), Object::TypedList(b)) => a == b,
            (Object::UntypedList(a), Object::UntypedList(b)) => a == b,
            // IndexMap equality ignores insertion order.
            (Object::TypedMap(a), Object::TypedMap(b)) => a == b,
            (Object::UntypedMap(a), Object::UntypedMap(b)) => a == b,
            (Object::ClassInstance(a), Object::ClassInstance(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Object::Null => {}
            Object::Boolean(v) => v.hash(state),
            Object::Integer(v) => v.hash(state),
            Object::Long(v) => v.hash(state),
            Object::Double(v) => v.to_bits().hash(state),
            Object::Binary(v) => v.hash(state),
            Object::Date(v) => v.hash(state),
            Object::String(v) => v.hash(state),
            Object::Ref(v) => v.hash(state),
            Object::TypedList(v) => {
                v.type_name.hash(state);
                v.values.len().hash(state);
            }
            Object::UntypedList(v) => v.len().hash(state),
            Object::TypedMap(v) => {
                v.type_name.hash(state);
                v.entries.len().hash(state);
            }
            Object::UntypedMap(v) => v.len().hash(state),
            Object::ClassInstance(v) => {
                v.def.type_name.hash(state);
                v.def.field_names.len().hash(state);
                v.data.len().hash(state);
            }
        }
    }
}

/// Generates `as_*` / `as_*_mut` accessor pairs for variants holding a single value.
macro_rules! object_accessors {
    (by_value: $($variant:ident => $get:ident, $get_mut:ident: $ty:ty;)*) => {
        $(
            pub fn $get(&self) -> Option<$ty> {
                match self {
                    Object::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                match self {
                    Object::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
    (by_ref: $($variant:ident => $get:ident, $get_mut:ident: $ty:ty;)*) => {
        $(
            pub fn $get(&self) -> Option<&$ty> {
                match self {
                    Object::$variant(v) => Some(v),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                match self {
                    Object::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

impl Object {
    object_accessors! { by_value:
        Boolean => as_bool, as_bool_mut: bool;
        Integer => as_i32, as_i32_mut: i32;
        Long => as_i64, as_i64_mut: i64;
        Double => as_f64, as_f64_mut: f64;
        Date => as_date, as_date_mut: i64;
        Ref => as_ref_index, as_ref_index_mut: u32;
    }

    object_accessors! { by_ref:
        Binary => as_binary, as_binary_mut: Bytes;
        String => as_string, as_string_mut: String;
        TypedList => as_typed_list, as_typed_list_mut: TypedList;
        UntypedList => as_untyped_list, as_untyped_list_mut: UntypedList;
        TypedMap => as_typed_map, as_typed_map_mut: TypedMap;
        UntypedMap => as_untyped_map, as_untyped_map_mut: UntypedMap;
        ClassInstance => as_class_instance, as_class_instance_mut: ClassInstance;
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_string().map(String::as_str)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Null => ObjectType::Null,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Integer(_) => ObjectType::Integer,
            Object::Long(_) => ObjectType::Long,
            Object::Double(_) => ObjectType::Double,
            Object::Binary(_) => ObjectType::Binary,
            Object::Date(_) => ObjectType::Date,
            Object::String(_) => ObjectType::String,
            Object::Ref(_) => ObjectType::Ref,
            Object::TypedList(_) => ObjectType::TypedList,
            Object::UntypedList(_) => ObjectType::UntypedList,
            Object::TypedMap(_) => ObjectType::TypedMap,
            Object::UntypedMap(_) => ObjectType::UntypedMap,
            Object::ClassInstance(_) => ObjectType::Class,
        }
    }

    /// Value stored under a string key in a map, or a named field of a class instance.
    pub fn get(&self, key: &str) -> Option<&Object> {
        match self {
            Object::TypedMap(m) => m.entries.get(&Object::from(key)),
            Object::UntypedMap(m) => m.get(&Object::from(key)),
            Object::ClassInstance(c) => c.get(key),
            _ => None,
        }
    }

    /// Element at `idx` in a typed or untyped list.
    pub fn get_index(&self, idx: usize) -> Option<&Object> {
        match self {
            Object::TypedList(l) => l.values.get(idx),
            Object::UntypedList(l) => l.get(idx),
            _ => None,
        }
    }

    /// Locates the target of `Object::Ref(index)` inside this decoded graph.
    ///
    /// Lists, maps and class instances are numbered in the order they start in the
    /// stream: the container itself first, then its children (map keys before their
    /// values). `self` must be the first value decoded in its session.
    pub fn resolve_ref(&self, index: u32) -> Option<&Object> {
        let mut next = 0;
        self.find_container(index, &mut next)
    }

    fn find_container<'a>(&'a self, index: u32, next: &mut u32) -> Option<&'a Object> {
        let children: Box<dyn Iterator<Item = &'a Object> + 'a> = match self {
            Object::TypedList(l) => Box::new(l.values.iter()),
            Object::UntypedList(l) => Box::new(l.iter()),
            Object::TypedMap(m) => Box::new(m.entries.iter().flat_map(|(k, v)| [k, v])),
            Object::UntypedMap(m) => Box::new(m.iter().flat_map(|(k, v)| [k, v])),
            Object::ClassInstance(c) => Box::new(c.data.iter()),
            _ => return None,
        };
        if *next == index {
            return Some(self);
        }
        *next += 1;
        for child in children {
            if let Some(found) = child.find_container(index, next) {
                return Some(found);
            }
        }
        None
    }

    pub fn to_debug_string(&self) -> String {
        match self {
            Object::Null => "Type: Null".to_string(),
            Object::Boolean(v) => format!("Type: boolean, value[{}]", v),
            Object::Integer(v) => format!("Type: integer, value[{}]", v),
            Object::Long(v) => format!("Type: long, value[{}]", v),
            Object::Double(v) => format!("Type: double, value[{}]", v),
            Object::Date(v) => format!("Type: date, value[{} ms]", v),
            Object::Binary(v) => {
                // Only the first 16 bytes are shown.
                let mut out = String::new();
                for b in v.iter().take(16) {
                    let _ = write!(out, "{:x} ", b);
                }
                format!("Type: binary, size[{}], value[{}]", v.len(), out)
            }
            Object::String(v) => format!("Type: string, value[{}]", v),
            Object::Ref(v) => format!("Type: Ref, target index: {}", v),
            Object::TypedList(l) => format!(
                "Type: typedlist, type[{}], value[{}]",
                l.type_name,
                debug_list(&l.values)
            ),
            Object::UntypedList(l) => format!("Type: untypedlist, value[{}]", debug_list(l)),
            Object::TypedMap(m) => format!(
                "Type: typedmap, type[{}], value[{}]",
                m.type_name,
                debug_map(&m.entries)
            ),
            Object::UntypedMap(m) => format!("Type: untypedmap, value[{}]", debug_map(m)),
            Object::ClassInstance(c) => {
                let mut out = String::new();
                for o in &c.data {
                    let _ = write!(out, "{} ", o.to_debug_string());
                }
                format!(
                    "Type: classinstance, def[{}], value[{}]",
                    c.def.to_debug_string(),
                    out
                )
            }
        }
    }
}

fn debug_list(values: &[Object]) -> String {
    let mut out = String::new();
    for o in values {
        let _ = writeln!(out, "{}", o.to_debug_string());
    }
    out
}

fn debug_map(entries: &UntypedMap) -> String {
    let mut out = String::new();
    for (k, v) in entries {
        let _ = writeln!(
            out,
            "key: {} value: {}",
            k.to_debug_string(),
            v.to_debug_string()
        );
    }
    out
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}

impl From<i32> for Object {
    fn from(v: i32) -> Self {
        Object::Integer(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Long(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Double(v)
    }
}

impl From<&str> for Object {
    fn from(v: &str) -> Self {
        Object::String(v.to_string())
    }
}

impl From<String> for Object {
    fn from(v: String) -> Self {
        Object::String(v)
    }
}

impl From<Vec<u8>> for Object {
    fn from(v: Vec<u8>) -> Self {
        Object::Binary(Bytes::from(v))
    }
}

impl From<Bytes> for Object {
    fn from(v: Bytes) -> Self {
        Object::Binary(v)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::UntypedList(v)
    }
}

impl From<UntypedMap> for Object {
    fn from(v: UntypedMap) -> Self {
        Object::UntypedMap(v)
    }
}

impl From<ClassInstance> for Object {
    fn from(v: ClassInstance) -> Self {
        Object::ClassInstance(v)
    }
}
