use bytes::Bytes;
use hessian2_codec::{
    ClassInstance, Definition, Object, ObjectType, TypedList, TypedMap, UntypedMap,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

fn hash_of(o: &Object) -> u64 {
    let mut h = DefaultHasher::new();
    o.hash(&mut h);
    h.finish()
}

fn map_of(entries: &[(&str, i32)]) -> UntypedMap {
    entries
        .iter()
        .map(|(k, v)| (Object::from(*k), Object::from(*v)))
        .collect()
}

// =============================================================================
// Equality and hashing
// =============================================================================

#[test]
fn test_scalar_equality() {
    assert_eq!(Object::Integer(1), Object::Integer(1));
    assert_ne!(Object::Integer(1), Object::Long(1));
    assert_ne!(Object::Date(5), Object::Long(5));
    assert_eq!(Object::from("a"), Object::String("a".to_string()));
    assert_eq!(Object::Null, Object::default());
}

#[test]
fn test_double_compares_by_bits() {
    assert_eq!(Object::Double(f64::NAN), Object::Double(f64::NAN));
    assert_ne!(Object::Double(0.0), Object::Double(-0.0));
    assert_eq!(hash_of(&Object::Double(f64::NAN)), hash_of(&Object::Double(f64::NAN)));
}

#[test]
fn test_untyped_map_ignores_insertion_order() {
    let a = Object::UntypedMap(map_of(&[("x", 1), ("y", 2)]));
    let b = Object::UntypedMap(map_of(&[("y", 2), ("x", 1)]));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let c = Object::UntypedMap(map_of(&[("x", 1), ("y", 3)]));
    assert_ne!(a, c);
}

#[test]
fn test_typed_map_compares_type_name() {
    let a = Object::TypedMap(TypedMap {
        type_name: "java.util.HashMap".to_string(),
        entries: map_of(&[("x", 1)]),
    });
    let b = Object::TypedMap(TypedMap {
        type_name: "java.util.TreeMap".to_string(),
        entries: map_of(&[("x", 1)]),
    });
    assert_ne!(a, b);
}

#[test]
fn test_typed_list_order_matters() {
    let list = |values: Vec<i32>| {
        Object::TypedList(TypedList {
            type_name: "[int".to_string(),
            values: values.into_iter().map(Object::from).collect(),
        })
    };
    assert_eq!(list(vec![1, 2]), list(vec![1, 2]));
    assert_ne!(list(vec![1, 2]), list(vec![2, 1]));
    assert_eq!(hash_of(&list(vec![1, 2])), hash_of(&list(vec![1, 2])));
}

#[test]
fn test_objects_as_map_keys() {
    let mut map = UntypedMap::new();
    map.insert(Object::Integer(1), Object::from("one"));
    map.insert(Object::Binary(Bytes::from_static(b"k")), Object::from("bin"));
    map.insert(Object::UntypedList(vec![Object::Null]), Object::from("list"));
    assert_eq!(map.get(&Object::Integer(1)), Some(&Object::from("one")));
    assert_eq!(
        map.get(&Object::Binary(Bytes::from_static(b"k"))),
        Some(&Object::from("bin"))
    );
    assert_eq!(
        map.get(&Object::UntypedList(vec![Object::Null])),
        Some(&Object::from("list"))
    );
    assert_eq!(map.get(&Object::Long(1)), None);
}

#[test]
fn test_class_instance_equality() {
    let def = Arc::new(Definition::new("Car", vec!["color".into(), "model".into()]));
    let other_def = Arc::new(Definition::new("Car", vec!["color".into(), "model".into()]));
    let a = ClassInstance::new(def, vec![Object::from("red"), Object::from("corvette")]);
    let b = ClassInstance::new(other_def, vec![Object::from("red"), Object::from("corvette")]);
    assert_eq!(Object::from(a.clone()), Object::from(b));

    let renamed = Arc::new(Definition::new("Truck", vec!["color".into(), "model".into()]));
    let c = ClassInstance::new(renamed, a.data.clone());
    assert_ne!(Object::from(a), Object::from(c));
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn test_accessors() {
    assert_eq!(Object::Integer(5).as_i32(), Some(5));
    assert_eq!(Object::Integer(5).as_i64(), None);
    assert_eq!(Object::Long(5).as_i64(), Some(5));
    assert_eq!(Object::Boolean(true).as_bool(), Some(true));
    assert_eq!(Object::Double(2.5).as_f64(), Some(2.5));
    assert_eq!(Object::Date(60_000).as_date(), Some(60_000));
    assert_eq!(Object::Ref(3).as_ref_index(), Some(3));
    assert_eq!(Object::from("s").as_str(), Some("s"));
    assert_eq!(
        Object::from(vec![1u8, 2]).as_binary(),
        Some(&Bytes::from_static(&[1, 2]))
    );
    assert!(Object::Null.is_null());
    assert!(!Object::Integer(0).is_null());
}

#[test]
fn test_mut_accessors() {
    let mut o = Object::Integer(1);
    if let Some(v) = o.as_i32_mut() {
        *v = 7;
    }
    assert_eq!(o, Object::Integer(7));

    let mut list = Object::UntypedList(vec![]);
    list.as_untyped_list_mut().unwrap().push(Object::Null);
    assert_eq!(list.get_index(0), Some(&Object::Null));
    assert!(list.as_typed_list_mut().is_none());
}

#[test]
fn test_object_type() {
    assert_eq!(Object::Null.object_type(), ObjectType::Null);
    assert_eq!(Object::Integer(1).object_type(), ObjectType::Integer);
    assert_eq!(Object::UntypedMap(UntypedMap::new()).object_type(), ObjectType::UntypedMap);
    let def = Arc::new(Definition::new("T", vec![]));
    assert_eq!(
        Object::from(ClassInstance::new(def, vec![])).object_type(),
        ObjectType::Class
    );
}

#[test]
fn test_lookup_helpers() {
    let map = Object::UntypedMap(map_of(&[("a", 1)]));
    assert_eq!(map.get("a"), Some(&Object::Integer(1)));
    assert_eq!(map.get("b"), None);
    assert_eq!(Object::Integer(1).get("a"), None);

    let list = Object::from(vec![Object::from(1i32), Object::from(2i32)]);
    assert_eq!(list.get_index(1), Some(&Object::Integer(2)));
    assert_eq!(list.get_index(2), None);

    let def = Arc::new(Definition::new("Car", vec!["color".into(), "model".into()]));
    let car = ClassInstance::new(def, vec![Object::from("red"), Object::from("corvette")]);
    assert_eq!(car.get("model"), Some(&Object::from("corvette")));
    assert_eq!(car.get("year"), None);
}

#[test]
fn test_debug_string() {
    assert_eq!(Object::Null.to_debug_string(), "Type: Null");
    assert_eq!(Object::Integer(5).to_debug_string(), "Type: integer, value[5]");
    assert_eq!(Object::from("x").to_debug_string(), "Type: string, value[x]");
    let def = Definition::new("Car", vec!["color".into(), "model".into()]);
    assert_eq!(def.to_debug_string(), "type: Car , field_list: color model");
}

// =============================================================================
// References
// =============================================================================

#[test]
fn test_resolve_ref_walks_stream_order() {
    let inner = Object::TypedList(TypedList {
        type_name: "[int".to_string(),
        values: vec![Object::from(1i32)],
    });
    let mut map = UntypedMap::new();
    map.insert(Object::from("a"), inner.clone());
    let map = Object::UntypedMap(map);
    let root = Object::UntypedList(vec![map.clone(), Object::Ref(1)]);

    assert_eq!(root.resolve_ref(0), Some(&root));
    assert_eq!(root.resolve_ref(1), Some(&map));
    assert_eq!(root.resolve_ref(2), Some(&inner));
    assert_eq!(root.resolve_ref(3), None);
    assert_eq!(Object::Integer(1).resolve_ref(0), None);
}
