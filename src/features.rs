#[cfg(feature = "chrono")]
use chrono::{DateTime, NaiveDateTime, Utc};
#[cfg(feature = "rust_decimal")]
use rust_decimal::Decimal;
#[cfg(feature = "serde_json")]
use serde_json::{Map, Number, Value};
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;

#[allow(unused_imports)]
use crate::core::*;
#[allow(unused_imports)]
use crate::*;

// --- chrono::DateTime<Utc> ---
#[cfg(feature = "chrono")]
impl ToHessian for DateTime<Utc> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_date_millis(self.timestamp_millis());
        Ok(())
    }
}

#[cfg(feature = "chrono")]
impl FromHessian for DateTime<Utc> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let millis = decoder.read_date_millis()?;
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| Error::Decode(format!("date {} ms is out of range", millis)))
    }
}

// --- chrono::NaiveDateTime ---
/// Interpreted as UTC.
#[cfg(feature = "chrono")]
impl ToHessian for NaiveDateTime {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_date_millis(self.and_utc().timestamp_millis());
        Ok(())
    }
}

#[cfg(feature = "chrono")]
impl FromHessian for NaiveDateTime {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        DateTime::<Utc>::from_hessian(decoder).map(|d| d.naive_utc())
    }
}

// --- rust_decimal::Decimal ---
#[cfg(feature = "rust_decimal")]
const BIG_DECIMAL_CLASS: &str = "java.math.BigDecimal";

#[cfg(feature = "rust_decimal")]
fn big_decimal_definition() -> &'static Definition {
    static DEF: std::sync::OnceLock<Definition> = std::sync::OnceLock::new();
    DEF.get_or_init(|| Definition::new(BIG_DECIMAL_CLASS, vec!["value".to_string()]))
}

/// Written as a `java.math.BigDecimal` instance whose single `value` field holds the
/// decimal string.
#[cfg(feature = "rust_decimal")]
impl ToHessian for Decimal {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.encode_class_instance_begin(big_decimal_definition())?;
        encoder.write_str(&self.to_string())?;
        encoder.encode_class_instance_end()
    }
}

/// Also accepts a bare decimal string.
#[cfg(feature = "rust_decimal")]
impl FromHessian for Decimal {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let text = if is_string_code(decoder.peek_u8()?) {
            decoder.read_string()?
        } else {
            let def = decoder.decode_class_instance_begin()?;
            let mut value = None;
            for field in &def.field_names {
                if field == "value" && value.is_none() {
                    value = Some(String::from_hessian(decoder)?);
                } else {
                    decoder.skip_value()?;
                }
            }
            decoder.decode_class_instance_end()?;
            value.ok_or_else(|| {
                Error::Decode(format!("{} instance without a value field", def.type_name))
            })?
        };
        text.parse::<Decimal>()
            .map_err(|e| Error::Decode(format!("invalid decimal {:?}: {}", text, e)))
    }
}

// --- serde_json::Value ---
/// Numbers that fit `i32` are written as ints, other integers as longs, the rest as
/// doubles. Objects become untyped maps with string keys.
#[cfg(feature = "serde_json")]
impl ToHessian for Value {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Value::Null => encoder.write_null(),
            Value::Bool(b) => encoder.write_bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(v) => encoder.write_i32(v),
                        Err(_) => encoder.write_i64(i),
                    }
                } else {
                    encoder.write_f64(n.as_f64().unwrap_or(f64::NAN));
                }
            }
            Value::String(s) => encoder.write_str(s)?,
            Value::Array(arr) => encoder.write_list(arr.iter())?,
            Value::Object(obj) => encoder.write_map(obj.iter())?,
        }
        Ok(())
    }
}

#[cfg(feature = "serde_json")]
impl FromHessian for Value {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        Value::try_from(&decoder.decode_object()?)
    }
}

#[cfg(feature = "serde_json")]
impl From<Value> for Object {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Object::Null,
            Value::Bool(b) => Object::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => match i32::try_from(i) {
                    Ok(v) => Object::Integer(v),
                    Err(_) => Object::Long(i),
                },
                None => Object::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Object::String(s),
            Value::Array(arr) => Object::UntypedList(arr.into_iter().map(Object::from).collect()),
            Value::Object(obj) => Object::UntypedMap(
                obj.into_iter()
                    .map(|(k, v)| (Object::String(k), Object::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(feature = "serde_json")]
fn json_key(key: &Object) -> Result<String> {
    match key {
        Object::String(s) => Ok(s.clone()),
        Object::Integer(v) => Ok(v.to_string()),
        Object::Long(v) => Ok(v.to_string()),
        Object::Boolean(v) => Ok(v.to_string()),
        other => Err(Error::Decode(format!(
            "{:?} map key has no JSON representation",
            other.object_type()
        ))),
    }
}

#[cfg(feature = "serde_json")]
fn json_map<'a>(entries: impl Iterator<Item = (&'a Object, &'a Object)>) -> Result<Value> {
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert(json_key(k)?, Value::try_from(v)?);
    }
    Ok(Value::Object(map))
}

/// Dates become epoch milliseconds, binaries arrays of byte values, class instances
/// objects keyed by field name. References and non-finite doubles have no JSON form.
#[cfg(feature = "serde_json")]
impl TryFrom<&Object> for Value {
    type Error = Error;

    fn try_from(value: &Object) -> Result<Self> {
        let list = |values: &[Object]| -> Result<Value> {
            values
                .iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        };
        match value {
            Object::Null => Ok(Value::Null),
            Object::Boolean(b) => Ok(Value::Bool(*b)),
            Object::Integer(v) => Ok(Value::from(*v)),
            Object::Long(v) | Object::Date(v) => Ok(Value::from(*v)),
            Object::Double(v) => Number::from_f64(*v)
                .map(Value::Number)
                .ok_or_else(|| Error::Decode(format!("{} has no JSON representation", v))),
            Object::Binary(b) => Ok(Value::Array(b.iter().map(|&x| Value::from(x)).collect())),
            Object::String(s) => Ok(Value::String(s.clone())),
            Object::Ref(index) => Err(Error::Decode(format!(
                "reference {} has no JSON representation",
                index
            ))),
            Object::TypedList(l) => list(&l.values),
            Object::UntypedList(l) => list(l),
            Object::TypedMap(m) => json_map(m.entries.iter()),
            Object::UntypedMap(m) => json_map(m.iter()),
            Object::ClassInstance(c) => {
                let mut map = Map::new();
                for (name, v) in c.def.field_names.iter().zip(&c.data) {
                    map.insert(name.clone(), Value::try_from(v)?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

// --- SmolStr ---
#[cfg(feature = "smol_str")]
impl ToHessian for SmolStr {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_str(self)
    }
}

#[cfg(feature = "smol_str")]
impl FromHessian for SmolStr {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        Ok(SmolStr::new(decoder.read_string()?))
    }
}
