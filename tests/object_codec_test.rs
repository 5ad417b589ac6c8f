use bytes::{Bytes, BytesMut};
use hessian2_codec::{
    decode, encode, ClassInstance, Config, Decoder, Definition, Encoder, Error, ListHeader,
    Object, RefKind, TypedList, TypedMap, UntypedMap,
};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

fn car_def() -> Arc<Definition> {
    Arc::new(Definition::new(
        "Car",
        vec!["color".to_string(), "model".to_string()],
    ))
}

fn car(color: &str, model: &str) -> Object {
    Object::ClassInstance(ClassInstance::new(
        car_def(),
        vec![Object::from(color), Object::from(model)],
    ))
}

fn int_list(type_name: &str, values: &[i32]) -> Object {
    Object::TypedList(TypedList {
        type_name: type_name.to_string(),
        values: values.iter().map(|v| Object::Integer(*v)).collect(),
    })
}

const CAR_DEF_BYTES: &[u8] = &[
    0x43, 0x03, b'C', b'a', b'r', 0x92, 0x05, b'c', b'o', b'l', b'o', b'r', 0x05, b'm', b'o',
    b'd', b'e', b'l',
];

// =============================================================================
// Scalars through the dynamic model
// =============================================================================

#[test]
fn test_scalar_objects() {
    assert_eq!(&encode(&Object::Null).unwrap()[..], &[0x4e]);
    assert_eq!(&encode(&Object::Integer(10)).unwrap()[..], &[0x9a]);
    assert_eq!(
        &encode(&Object::Date(60_000)).unwrap()[..],
        &[0x4b, 0x00, 0x00, 0x00, 0x01]
    );

    assert_eq!(decode::<Object>(vec![0x4e]).unwrap(), Object::Null);
    assert_eq!(decode::<Object>(vec![0x54]).unwrap(), Object::Boolean(true));
    assert_eq!(decode::<Object>(vec![0xcb, 0xe8]).unwrap(), Object::Integer(1000));
    assert_eq!(decode::<Object>(vec![0xe1]).unwrap(), Object::Long(1));
    assert_eq!(
        decode::<Object>(vec![0x3d, 0x86, 0xa0]).unwrap(),
        Object::Long(100000)
    );
    assert_eq!(decode::<Object>(vec![0x5d, 0x05]).unwrap(), Object::Double(5.0));
    assert_eq!(
        decode::<Object>(vec![0x4b, 0x00, 0x00, 0x00, 0x01]).unwrap(),
        Object::Date(60_000)
    );
    assert_eq!(
        decode::<Object>(vec![0x23, 1, 2, 3]).unwrap(),
        Object::Binary(Bytes::from_static(&[1, 2, 3]))
    );
    assert_eq!(
        decode::<Object>(vec![0x02, b'h', b'i']).unwrap(),
        Object::from("hi")
    );
}

#[test]
fn test_unknown_lead_byte() {
    let mut decoder = Decoder::new(vec![0x5a]);
    let err = decoder.decode::<Object>().unwrap_err();
    assert!(matches!(err, Error::UnexpectedType { code: 0x5a, offset: 0 }));
    assert_eq!(decoder.error_message(), "pos: 0, Unexpected type code 0x5a at offset 0");
}

// =============================================================================
// Lists
// =============================================================================

#[test]
fn test_untyped_lists() {
    let list = Object::from(vec![Object::Integer(1), Object::Integer(2)]);
    assert_eq!(&encode(&list).unwrap()[..], &[0x7a, 0x91, 0x92]);

    let long: Vec<Object> = (0..8).map(Object::Integer).collect();
    let out = encode(&Object::from(long.clone())).unwrap();
    assert_eq!(&out[..3], &[0x58, 0x98, 0x90]);
    assert_eq!(decode::<Object>(out).unwrap(), Object::UntypedList(long));
}

#[test]
fn test_typed_lists_reuse_type() {
    let outer = Object::from(vec![int_list("[int", &[1]), int_list("[int", &[2])]);
    let mut encoder = Encoder::new();
    encoder.encode(&outer).unwrap();
    assert_eq!(encoder.type_ref_size(), 1);
    assert_eq!(encoder.get_type_ref("[int"), Some(0));
    assert_eq!(encoder.value_ref_size(), 3);
    assert_eq!(
        encoder.as_bytes(),
        &[0x7a, 0x71, 0x04, b'[', b'i', b'n', b't', 0x91, 0x71, 0x90, 0x92]
    );

    let mut decoder = Decoder::new(encoder.into_bytes());
    assert_eq!(decoder.decode::<Object>().unwrap(), outer);
    assert_eq!(decoder.type_ref_size(), 1);
    assert_eq!(decoder.value_ref_size(), 3);
}

#[test]
fn test_long_typed_list() {
    let values: Vec<i32> = (0..8).collect();
    let out = encode(&int_list("[int", &values)).unwrap();
    assert_eq!(&out[..7], &[0x56, 0x04, b'[', b'i', b'n', b't', 0x98]);
    assert_eq!(decode::<Object>(out).unwrap(), int_list("[int", &values));
}

#[test]
fn test_decode_variable_length_lists() {
    assert_eq!(
        decode::<Object>(vec![0x57, 0x91, 0x92, 0x5a]).unwrap(),
        Object::from(vec![Object::Integer(1), Object::Integer(2)])
    );
    assert_eq!(
        decode::<Object>(vec![0x55, 0x04, b'[', b'i', b'n', b't', 0x91, 0x5a]).unwrap(),
        int_list("[int", &[1])
    );
    assert_eq!(
        decode::<Object>(vec![0x58, 0x92, 0x91, 0x92]).unwrap(),
        Object::from(vec![Object::Integer(1), Object::Integer(2)])
    );
}

#[test]
fn test_list_missing_end_marker() {
    assert!(matches!(
        decode::<Object>(vec![0x57, 0x91]),
        Err(Error::NotEnoughBuffer { offset: 2 })
    ));
}

#[test]
fn test_list_begin_helpers() {
    let mut encoder = Encoder::new();
    encoder.encode_var_list_begin("").unwrap();
    encoder.encode(&1i32).unwrap();
    encoder.encode_var_list_end().unwrap();
    encoder.encode_fixed_list_begin("[int", 2).unwrap();
    encoder.encode(&1i32).unwrap();
    encoder.encode(&2i32).unwrap();
    encoder.encode_fixed_list_end().unwrap();
    assert_eq!(
        encoder.as_bytes(),
        &[0x57, 0x91, 0x5a, 0x72, 0x04, b'[', b'i', b'n', b't', 0x91, 0x92]
    );

    let mut decoder = Decoder::new(encoder.into_bytes());
    decoder.skip_value().unwrap();
    let header = decoder.decode_list_begin().unwrap();
    assert_eq!(
        header,
        ListHeader {
            type_name: Some("[int".to_string()),
            len: Some(2),
        }
    );
    assert_eq!(decoder.decode::<i32>().unwrap(), 1);
    assert_eq!(decoder.decode::<i32>().unwrap(), 2);
    assert_eq!(decoder.value_ref_size(), 2);
}

// =============================================================================
// Maps
// =============================================================================

#[test]
fn test_maps() {
    let mut entries = UntypedMap::new();
    entries.insert(Object::from("a"), Object::Integer(1));
    let untyped = Object::UntypedMap(entries.clone());
    assert_eq!(
        &encode(&untyped).unwrap()[..],
        &[0x48, 0x01, b'a', 0x91, 0x5a]
    );

    let typed = Object::TypedMap(TypedMap {
        type_name: "m".to_string(),
        entries,
    });
    let out = encode(&typed).unwrap();
    assert_eq!(&out[..], &[0x4d, 0x01, b'm', 0x01, b'a', 0x91, 0x5a]);
    assert_eq!(decode::<Object>(out).unwrap(), typed);
}

#[test]
fn test_typed_containers_need_a_type_name() {
    let list = Object::TypedList(TypedList {
        type_name: String::new(),
        values: vec![Object::Integer(1)],
    });
    let mut encoder = Encoder::new();
    assert!(matches!(encoder.encode(&list), Err(Error::Encode(_))));
    assert!(encoder.as_bytes().is_empty());

    let map = Object::TypedMap(TypedMap {
        type_name: String::new(),
        entries: UntypedMap::new(),
    });
    assert!(matches!(encode(&map), Err(Error::Encode(_))));

    let nested = Object::from(vec![list]);
    assert!(matches!(encode(&nested), Err(Error::Encode(_))));
}

#[test]
fn test_decoded_maps_ignore_order() {
    let a = decode::<Object>(vec![0x48, 0x01, b'x', 0x91, 0x01, b'y', 0x92, 0x5a]).unwrap();
    let b = decode::<Object>(vec![0x48, 0x01, b'y', 0x92, 0x01, b'x', 0x91, 0x5a]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.get("y"), Some(&Object::Integer(2)));
}

#[test]
fn test_map_begin_helpers() {
    let mut encoder = Encoder::new();
    encoder.encode_map_begin("m").unwrap();
    encoder.encode("k").unwrap();
    encoder.encode(&true).unwrap();
    encoder.encode_map_end().unwrap();
    assert_eq!(
        encoder.as_bytes(),
        &[0x4d, 0x01, b'm', 0x01, b'k', 0x54, 0x5a]
    );
    let mut decoder = Decoder::new(encoder.into_bytes());
    assert_eq!(decoder.decode_map_begin().unwrap(), Some("m".to_string()));
}

// =============================================================================
// Class instances
// =============================================================================

#[test]
fn test_class_instance_bytes() {
    let out = encode(&car("red", "corvette")).unwrap();
    let mut expected = CAR_DEF_BYTES.to_vec();
    expected.push(0x60);
    expected.extend_from_slice(&[0x03, b'r', b'e', b'd']);
    expected.push(0x08);
    expected.extend_from_slice(b"corvette");
    assert_eq!(out.to_vec(), expected);
}

#[test]
fn test_definition_written_once() {
    let cars = Object::from(vec![car("red", "corvette"), car("blue", "mustang")]);
    let mut encoder = Encoder::new();
    encoder.encode(&cars).unwrap();
    assert_eq!(encoder.def_ref_size(), 1);
    assert_eq!(encoder.get_def_ref(&car_def()), Some(0));
    let out = encoder.into_bytes();
    let mut expected = vec![0x7a];
    expected.extend_from_slice(CAR_DEF_BYTES);
    expected.extend_from_slice(&[0x60, 0x03, b'r', b'e', b'd', 0x08]);
    expected.extend_from_slice(b"corvette");
    expected.extend_from_slice(&[0x60, 0x04, b'b', b'l', b'u', b'e', 0x07]);
    expected.extend_from_slice(b"mustang");
    assert_eq!(out.to_vec(), expected);

    let mut decoder = Decoder::new(out);
    let decoded = decoder.decode::<Object>().unwrap();
    assert_eq!(decoded, cars);
    assert_eq!(decoder.def_ref_size(), 1);
    assert_eq!(decoder.value_ref_size(), 3);

    let a = decoded.get_index(0).unwrap().as_class_instance().unwrap();
    let b = decoded.get_index(1).unwrap().as_class_instance().unwrap();
    assert!(Arc::ptr_eq(&a.def, &b.def));
    assert_eq!(a.get("model"), Some(&Object::from("corvette")));
    assert_eq!(b.get("color"), Some(&Object::from("blue")));
}

#[test]
fn test_long_definition_index() {
    let mut encoder = Encoder::new();
    let mut objects = Vec::new();
    for i in 0..17 {
        let def = Arc::new(Definition::new(format!("T{}", i), vec![]));
        let o = Object::ClassInstance(ClassInstance::new(def, vec![]));
        encoder.encode(&o).unwrap();
        objects.push(o);
    }
    let out = encoder.into_bytes();
    assert_eq!(&out[out.len() - 2..], &[0x4f, 0xa0]);

    let mut decoder = Decoder::new(out);
    for expected in objects {
        assert_eq!(decoder.decode::<Object>().unwrap(), expected);
    }
    assert_eq!(decoder.def_ref_size(), 17);
}

#[test]
fn test_standalone_definition() {
    let def = car_def();
    let mut encoder = Encoder::new();
    encoder.encode(def.as_ref()).unwrap();
    encoder.encode(def.as_ref()).unwrap();
    assert_eq!(encoder.as_bytes(), CAR_DEF_BYTES);

    let mut input = CAR_DEF_BYTES.to_vec();
    input.extend_from_slice(&[0x60, 0x01, b'r', 0x01, b'm']);
    let mut decoder = Decoder::new(input);
    assert_eq!(decoder.decode::<Definition>().unwrap(), *def);
    assert_eq!(decoder.def_refs().len(), 1);
    assert_eq!(decoder.decode::<Object>().unwrap(), car("r", "m"));
}

#[test]
fn test_field_count_mismatch_is_rejected() {
    let broken = Object::ClassInstance(ClassInstance::new(car_def(), vec![Object::Null]));
    let mut encoder = Encoder::new();
    assert!(matches!(encoder.encode(&broken), Err(Error::Encode(_))));
    assert!(encoder.as_bytes().is_empty());
}

#[test]
fn test_class_instance_begin_helper() {
    let mut encoder = Encoder::new();
    encoder.encode_class_instance_begin(&car_def()).unwrap();
    encoder.encode("red").unwrap();
    encoder.encode("corvette").unwrap();
    encoder.encode_class_instance_end().unwrap();
    assert_eq!(encoder.as_bytes(), &encode(&car("red", "corvette")).unwrap()[..]);

    let mut decoder = Decoder::new(encoder.into_bytes());
    let def = decoder.decode_class_instance_begin().unwrap();
    assert_eq!(def.field_names, vec!["color", "model"]);
    assert_eq!(decoder.decode::<String>().unwrap(), "red");
    assert_eq!(decoder.decode::<String>().unwrap(), "corvette");
    decoder.decode_class_instance_end().unwrap();
}

// =============================================================================
// References
// =============================================================================

#[test]
fn test_value_reference() {
    let root = Object::from(vec![Object::UntypedMap(UntypedMap::new()), Object::Ref(1)]);
    let out = encode(&root).unwrap();
    assert_eq!(&out[..], &[0x7a, 0x48, 0x5a, 0x51, 0x91]);

    let decoded = decode::<Object>(out).unwrap();
    assert_eq!(decoded, root);
    let target = decoded.get_index(1).unwrap().as_ref_index().unwrap();
    assert_eq!(
        decoded.resolve_ref(target),
        Some(&Object::UntypedMap(UntypedMap::new()))
    );
}

#[test]
fn test_reference_must_point_backwards() {
    assert!(matches!(encode(&Object::Ref(0)), Err(Error::Encode(_))));

    let err = decode::<Object>(vec![0x51, 0x90]).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidReference {
            kind: RefKind::Value,
            index: 0,
            offset: 0
        }
    ));
}

#[test]
fn test_invalid_type_and_definition_refs() {
    let err = decode::<Object>(vec![0x71, 0x90, 0x91]).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidReference {
            kind: RefKind::Type,
            index: 0,
            offset: 1
        }
    ));

    let mut decoder = Decoder::new(vec![0x60]);
    let err = decoder.decode::<Object>().unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidReference {
            kind: RefKind::Definition,
            index: 0,
            offset: 0
        }
    ));
    assert_eq!(decoder.error_code(), hessian2_codec::ErrorCode::UnexpectedType);
}

// =============================================================================
// Depth limit
// =============================================================================

#[test]
fn test_depth_limit() {
    let nested = vec![0x79, 0x79, 0x79, 0x91];
    let expected = Object::from(vec![Object::from(vec![Object::from(vec![Object::Integer(1)])])]);
    assert_eq!(decode::<Object>(nested.clone()).unwrap(), expected);

    let mut decoder = Decoder::with_config(nested, Config::new().max_depth(2));
    assert!(matches!(
        decoder.decode::<Object>(),
        Err(Error::DepthLimitExceeded { limit: 2 })
    ));

    let mut encoder = Encoder::with_config(BytesMut::new(), Config::new().max_depth(2));
    assert!(matches!(
        encoder.encode(&expected),
        Err(Error::DepthLimitExceeded { limit: 2 })
    ));
    assert_eq!(Config::default().max_depth, 128);
}

// =============================================================================
// Composite round trip
// =============================================================================

#[test]
fn test_composite_round_trip() {
    let mut entries = UntypedMap::new();
    entries.insert(Object::from("car"), car("red", "corvette"));
    entries.insert(Object::Integer(7), Object::Binary(Bytes::from(vec![0u8; 40])));
    entries.insert(Object::from("when"), Object::Date(1_700_000_000_123));
    entries.insert(
        Object::from("list"),
        Object::from(vec![Object::Double(5.5), Object::Null, car("blue", "mustang")]),
    );
    let root = Object::TypedMap(TypedMap {
        type_name: "java.util.HashMap".to_string(),
        entries,
    });
    assert_eq!(decode::<Object>(encode(&root).unwrap()).unwrap(), root);
}

#[test]
fn test_skip_value() {
    let mut decoder = Decoder::new(vec![0x7a, 0x91, 0x92, 0x9a]);
    decoder.skip_value().unwrap();
    assert_eq!(decoder.decode::<i32>().unwrap(), 10);
}

// =============================================================================
// Std collections
// =============================================================================

#[test]
fn test_vec_and_slices() {
    assert_eq!(
        &encode(&vec![1i32, 2, 3]).unwrap()[..],
        &[0x7b, 0x91, 0x92, 0x93]
    );
    assert_eq!(
        decode::<Vec<String>>(vec![0x57, 0x01, b'x', 0x5a]).unwrap(),
        vec!["x".to_string()]
    );
    let nested = vec![vec![1i64], vec![], vec![2, 3]];
    assert_eq!(decode::<Vec<Vec<i64>>>(encode(&nested).unwrap()).unwrap(), nested);

    let options = vec![Some(1i32), None];
    assert_eq!(
        decode::<Vec<Option<i32>>>(encode(&options).unwrap()).unwrap(),
        options
    );

    let deque: VecDeque<bool> = [true, false].into_iter().collect();
    assert_eq!(decode::<VecDeque<bool>>(encode(&deque).unwrap()).unwrap(), deque);
}

#[test]
fn test_std_maps() {
    let mut btree = BTreeMap::new();
    btree.insert("a".to_string(), 1i32);
    btree.insert("b".to_string(), 2i32);
    let out = encode(&btree).unwrap();
    assert_eq!(
        &out[..],
        &[0x48, 0x01, b'a', 0x91, 0x01, b'b', 0x92, 0x5a]
    );
    assert_eq!(decode::<BTreeMap<String, i32>>(out.clone()).unwrap(), btree);

    let hash: HashMap<String, i32> = decode(out.clone()).unwrap();
    assert_eq!(hash.get("b"), Some(&2));

    let index: IndexMap<String, i32> = decode(out).unwrap();
    assert_eq!(index.get_index(0), Some((&"a".to_string(), &1)));
    assert_eq!(decode::<IndexMap<String, i32>>(encode(&index).unwrap()).unwrap(), index);
}

#[test]
fn test_wrappers() {
    assert_eq!(
        encode(&Box::new(10i32)).unwrap(),
        encode(&Arc::new(10i32)).unwrap()
    );
    assert_eq!(*decode::<Box<i32>>(vec![0x9a]).unwrap(), 10);
    assert_eq!(*decode::<std::rc::Rc<String>>(vec![0x01, b'x']).unwrap(), "x");
}
