#![cfg(feature = "smol_str")]

use hessian2_codec::{decode, encode};
use smol_str::SmolStr;

#[test]
fn test_smol_str_is_a_string() {
    let value = SmolStr::new("hello");
    let bytes = encode(&value).unwrap();
    assert_eq!(bytes, encode("hello").unwrap());
    assert_eq!(decode::<SmolStr>(bytes).unwrap(), value);
}

#[test]
fn test_long_smol_str() {
    let value = SmolStr::new("x".repeat(2000));
    assert_eq!(decode::<SmolStr>(encode(&value).unwrap()).unwrap(), value);
}
