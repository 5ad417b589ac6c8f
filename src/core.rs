use crate::*;
use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

/// Lead bytes of the Hessian2 grammar.
///
/// Range-encoded forms (compact ints, short strings, short binaries, short lists)
/// are listed by their base byte; the value is added to or subtracted from it.
/// Tags are part of the wire format and never change.

pub const TAG_NULL: u8 = b'N';
pub const TAG_TRUE: u8 = b'T';
pub const TAG_FALSE: u8 = b'F';

///< 'I' + 4-byte int
pub const TAG_INT: u8 = b'I';
///< single-byte int base, `[-16, 47]` maps to `0x80..=0xbf`
pub const TAG_INT_ZERO: u8 = 0x90;
///< two-byte int base, `0xc0..=0xcf`
pub const TAG_INT_BYTE_ZERO: u8 = 0xc8;
///< three-byte int base, `0xd0..=0xd7`
pub const TAG_INT_SHORT_ZERO: u8 = 0xd4;

///< 'L' + 8-byte long
pub const TAG_LONG: u8 = b'L';
///< 0x59 + 4-byte int as long
pub const TAG_LONG_INT: u8 = 0x59;
///< single-byte long base, `[-8, 15]` maps to `0xd8..=0xef`
pub const TAG_LONG_ZERO: u8 = 0xe0;
///< two-byte long base, `0xf0..=0xff`
pub const TAG_LONG_BYTE_ZERO: u8 = 0xf8;
///< three-byte long base, `0x38..=0x3f`
pub const TAG_LONG_SHORT_ZERO: u8 = 0x3c;

pub const TAG_DOUBLE: u8 = b'D';
pub const TAG_DOUBLE_ZERO: u8 = 0x5b;
pub const TAG_DOUBLE_ONE: u8 = 0x5c;
pub const TAG_DOUBLE_BYTE: u8 = 0x5d;
pub const TAG_DOUBLE_SHORT: u8 = 0x5e;
///< int32 scaled by 0.001, decode only
pub const TAG_DOUBLE_MILLI: u8 = 0x5f;

///< 0x4a + 8-byte milliseconds
pub const TAG_DATE_MILLIS: u8 = 0x4a;
///< 0x4b + 4-byte minutes
pub const TAG_DATE_MINUTES: u8 = 0x4b;

///< non-final binary chunk
pub const TAG_BINARY_CHUNK: u8 = b'A';
///< final binary chunk
pub const TAG_BINARY_FINAL: u8 = b'B';
///< `0x20..=0x2f`, length in tag
pub const TAG_BINARY_SHORT: u8 = 0x20;
///< `0x34..=0x37` + 1 byte
pub const TAG_BINARY_MEDIUM: u8 = 0x34;
pub const BINARY_SHORT_MAX: usize = 15;
pub const BINARY_MEDIUM_MAX: usize = 1023;
pub const BINARY_CHUNK_SIZE: usize = 1024;

///< non-final string chunk
pub const TAG_STRING_CHUNK: u8 = b'R';
///< final string chunk
pub const TAG_STRING_FINAL: u8 = b'S';
///< `0x30..=0x33` + 1 byte
pub const TAG_STRING_MEDIUM: u8 = 0x30;
pub const STRING_SHORT_MAX: usize = 31;
pub const STRING_MEDIUM_MAX: usize = 1023;

///< variable-length typed list
pub const TAG_LIST_VAR_TYPED: u8 = 0x55;
///< fixed-length typed list
pub const TAG_LIST_FIXED_TYPED: u8 = 0x56;
///< variable-length untyped list
pub const TAG_LIST_VAR_UNTYPED: u8 = 0x57;
///< fixed-length untyped list
pub const TAG_LIST_FIXED_UNTYPED: u8 = 0x58;
///< `0x70..=0x77`, typed, length in tag
pub const TAG_LIST_TYPED_SHORT: u8 = 0x70;
///< `0x78..=0x7f`, untyped, length in tag
pub const TAG_LIST_UNTYPED_SHORT: u8 = 0x78;
pub const LIST_SHORT_MAX: usize = 7;

pub const TAG_MAP_TYPED: u8 = b'M';
pub const TAG_MAP_UNTYPED: u8 = b'H';
///< end of list or map
pub const TAG_END: u8 = b'Z';

pub const TAG_CLASS_DEF: u8 = b'C';
pub const TAG_OBJECT: u8 = b'O';
pub const TAG_OBJECT_COMPACT_START: u8 = 0x60;
pub const TAG_OBJECT_COMPACT_END: u8 = 0x6f;
///< value reference
pub const TAG_REF: u8 = b'Q';

pub(crate) use crate::string::is_string_code;

// --- primitive reads ---

impl Decoder {
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            TAG_TRUE => Ok(true),
            TAG_FALSE => Ok(false),
            other => Err(self.unexpected(other)),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let code = self.read_u8()?;
        match code {
            0x80..=0xbf => Ok(code as i32 - TAG_INT_ZERO as i32),
            0xc0..=0xcf => {
                let b0 = self.read_u8()? as i32;
                Ok(((code as i32 - TAG_INT_BYTE_ZERO as i32) << 8) + b0)
            }
            0xd0..=0xd7 => {
                let low = self.read_u16_be()? as i32;
                Ok(((code as i32 - TAG_INT_SHORT_ZERO as i32) << 16) + low)
            }
            TAG_INT => self.read_i32_be(),
            other => Err(self.unexpected(other)),
        }
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let code = self.read_u8()?;
        match code {
            0xd8..=0xef => Ok(code as i64 - TAG_LONG_ZERO as i64),
            0xf0..=0xff => {
                let b0 = self.read_u8()? as i64;
                Ok(((code as i64 - TAG_LONG_BYTE_ZERO as i64) << 8) + b0)
            }
            0x38..=0x3f => {
                let low = self.read_u16_be()? as i64;
                Ok(((code as i64 - TAG_LONG_SHORT_ZERO as i64) << 16) + low)
            }
            TAG_LONG_INT => Ok(self.read_i32_be()? as i64),
            TAG_LONG => self.read_i64_be(),
            other => Err(self.unexpected(other)),
        }
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let code = self.read_u8()?;
        match code {
            TAG_DOUBLE_ZERO => Ok(0.0),
            TAG_DOUBLE_ONE => Ok(1.0),
            TAG_DOUBLE_BYTE => Ok(self.read_u8()? as i8 as f64),
            TAG_DOUBLE_SHORT => Ok(self.read_u16_be()? as i16 as f64),
            TAG_DOUBLE_MILLI => Ok(0.001 * self.read_i32_be()? as f64),
            TAG_DOUBLE => Ok(f64::from_bits(self.read_i64_be()? as u64)),
            other => Err(self.unexpected(other)),
        }
    }

    /// Reads a binary value, following non-final chunks until the final one.
    pub fn read_binary(&mut self) -> Result<Bytes> {
        let mut joined: Option<BytesMut> = None;
        loop {
            let code = self.read_u8()?;
            let (is_final, len) = match code {
                0x20..=0x2f => (true, (code - TAG_BINARY_SHORT) as usize),
                0x34..=0x37 => {
                    let low = self.read_u8()? as usize;
                    (true, (((code - TAG_BINARY_MEDIUM) as usize) << 8) + low)
                }
                TAG_BINARY_CHUNK => (false, self.read_u16_be()? as usize),
                TAG_BINARY_FINAL => (true, self.read_u16_be()? as usize),
                other => return Err(self.unexpected(other)),
            };
            let chunk = self.read_bytes(len)?;
            tracing::trace!(len, is_final, "binary chunk");
            if let Some(buf) = joined.as_mut() {
                buf.put_slice(&chunk);
            } else if is_final {
                return Ok(chunk);
            } else {
                joined = Some(BytesMut::from(&chunk[..]));
            }
            if is_final {
                return Ok(joined.map(BytesMut::freeze).unwrap_or_default());
            }
        }
    }

    /// Reads a date as milliseconds since the Unix epoch.
    pub fn read_date_millis(&mut self) -> Result<i64> {
        match self.read_u8()? {
            TAG_DATE_MILLIS => self.read_i64_be(),
            TAG_DATE_MINUTES => Ok(self.read_i32_be()? as i64 * 60_000),
            other => Err(self.unexpected(other)),
        }
    }
}

// --- primitive writes ---

impl Encoder {
    pub fn write_bool(&mut self, value: bool) {
        self.writer.put_u8(if value { TAG_TRUE } else { TAG_FALSE });
    }

    pub fn write_i32(&mut self, value: i32) {
        if (-0x10..=0x2f).contains(&value) {
            self.writer.put_u8((value + TAG_INT_ZERO as i32) as u8);
        } else if (-0x800..=0x7ff).contains(&value) {
            self.writer.put_u8((TAG_INT_BYTE_ZERO as i32 + (value >> 8)) as u8);
            self.writer.put_u8(value as u8);
        } else if (-0x40000..=0x3ffff).contains(&value) {
            self.writer.put_u8((TAG_INT_SHORT_ZERO as i32 + (value >> 16)) as u8);
            self.writer.put_u16(value as u16);
        } else {
            self.writer.put_u8(TAG_INT);
            self.writer.put_i32(value);
        }
    }

    pub fn write_i64(&mut self, value: i64) {
        if (-0x08..=0x0f).contains(&value) {
            self.writer.put_u8((value + TAG_LONG_ZERO as i64) as u8);
        } else if (-0x800..=0x7ff).contains(&value) {
            self.writer.put_u8((TAG_LONG_BYTE_ZERO as i64 + (value >> 8)) as u8);
            self.writer.put_u8(value as u8);
        } else if (-0x40000..=0x3ffff).contains(&value) {
            self.writer.put_u8((TAG_LONG_SHORT_ZERO as i64 + (value >> 16)) as u8);
            self.writer.put_u16(value as u16);
        } else if let Ok(v) = i32::try_from(value) {
            self.writer.put_u8(TAG_LONG_INT);
            self.writer.put_i32(v);
        } else {
            self.writer.put_u8(TAG_LONG);
            self.writer.put_i64(value);
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        let int_value = value as i32;
        if int_value as f64 == value {
            if int_value == 0 {
                self.writer.put_u8(TAG_DOUBLE_ZERO);
                return;
            }
            if int_value == 1 {
                self.writer.put_u8(TAG_DOUBLE_ONE);
                return;
            }
            if let Ok(v) = i8::try_from(int_value) {
                self.writer.put_u8(TAG_DOUBLE_BYTE);
                self.writer.put_i8(v);
                return;
            }
            if let Ok(v) = i16::try_from(int_value) {
                self.writer.put_u8(TAG_DOUBLE_SHORT);
                self.writer.put_i16(v);
                return;
            }
        }
        self.writer.put_u8(TAG_DOUBLE);
        self.writer.put_u64(value.to_bits());
    }

    /// Writes a binary value. Data longer than one chunk is split into 1024-byte
    /// non-final chunks; a remainder of exactly 1024 bytes goes into the final chunk.
    pub fn write_binary(&mut self, data: &[u8]) {
        if data.len() <= BINARY_SHORT_MAX {
            self.writer.put_u8(TAG_BINARY_SHORT + data.len() as u8);
            self.writer.put_slice(data);
            return;
        }
        if data.len() <= BINARY_MEDIUM_MAX {
            self.writer.put_u8(TAG_BINARY_MEDIUM + (data.len() >> 8) as u8);
            self.writer.put_u8(data.len() as u8);
            self.writer.put_slice(data);
            return;
        }
        let mut rest = data;
        while rest.len() > BINARY_CHUNK_SIZE {
            let (chunk, tail) = rest.split_at(BINARY_CHUNK_SIZE);
            tracing::trace!(len = chunk.len(), "binary chunk");
            self.writer.put_u8(TAG_BINARY_CHUNK);
            self.writer.put_u16(chunk.len() as u16);
            self.writer.put_slice(chunk);
            rest = tail;
        }
        if !rest.is_empty() {
            self.writer.put_u8(TAG_BINARY_FINAL);
            self.writer.put_u16(rest.len() as u16);
            self.writer.put_slice(rest);
        }
    }

    /// Writes a date. Whole minutes that fit an `i32` use the compact form.
    pub fn write_date_millis(&mut self, millis: i64) {
        if millis % 60_000 == 0 {
            if let Ok(minutes) = i32::try_from(millis / 60_000) {
                self.writer.put_u8(TAG_DATE_MINUTES);
                self.writer.put_i32(minutes);
                return;
            }
        }
        self.writer.put_u8(TAG_DATE_MILLIS);
        self.writer.put_i64(millis);
    }

    /// Encodes `values` as an untyped fixed-length list.
    pub fn write_list<'a, T: ToHessian + 'a>(
        &mut self,
        values: impl ExactSizeIterator<Item = &'a T>,
    ) -> Result<()> {
        self.encode_fixed_list_begin("", values.len())?;
        self.nested(|e| values.into_iter().try_for_each(|v| v.to_hessian(e)))?;
        self.encode_fixed_list_end()
    }

    /// Encodes `entries` as an untyped map.
    pub fn write_map<'a, K: ToHessian + 'a, V: ToHessian + 'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a K, &'a V)>,
    ) -> Result<()> {
        self.encode_map_begin("")?;
        self.nested(|e| {
            entries.into_iter().try_for_each(|(k, v)| {
                k.to_hessian(e)?;
                v.to_hessian(e)
            })
        })?;
        self.encode_map_end()
    }
}

// --- bool / integers / floats ---

impl ToHessian for bool {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_bool(*self);
        Ok(())
    }
}

impl FromHessian for bool {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_bool()
    }
}

macro_rules! impl_int {
    ($write:ident, $read:ident, $wide:ty; $($t:ty),+) => {
        $(
            impl ToHessian for $t {
                fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
                    encoder.$write(<$wide>::from(*self));
                    Ok(())
                }
            }

            impl FromHessian for $t {
                fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
                    let value = decoder.$read()?;
                    <$t>::try_from(value).map_err(|_| {
                        Error::Decode(format!(
                            "{} is out of range for {}",
                            value,
                            stringify!($t)
                        ))
                    })
                }
            }
        )+
    };
}

impl_int!(write_i32, read_i32, i32; i8, i16, u8, u16, i32);
impl_int!(write_i64, read_i64, i64; u32, i64);

/// `u64` values are written through the signed 64-bit path and cannot be read back.
impl ToHessian for u64 {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        let value = i64::try_from(*self)
            .map_err(|_| Error::Encode(format!("u64 value {} exceeds i64::MAX", self)))?;
        encoder.write_i64(value);
        Ok(())
    }
}

impl ToHessian for f64 {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_f64(*self);
        Ok(())
    }
}

impl FromHessian for f64 {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_f64()
    }
}

impl ToHessian for f32 {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_f64(*self as f64);
        Ok(())
    }
}

impl FromHessian for f32 {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        Ok(decoder.read_f64()? as f32)
    }
}

// --- strings ---

impl ToHessian for str {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_str(self)
    }
}

impl ToHessian for String {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_str(self)
    }
}

impl FromHessian for String {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_string()
    }
}

impl FromHessian for Box<str> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        Ok(decoder.read_string()?.into_boxed_str())
    }
}

// --- binary ---

impl ToHessian for Bytes {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_binary(self);
        Ok(())
    }
}

impl FromHessian for Bytes {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_binary()
    }
}

// --- sequences ---

/// `[u8]` is written as binary, any other element type as an untyped list.
impl<T: ToHessian + 'static> ToHessian for [T] {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            let data: Vec<u8> = self
                .iter()
                .filter_map(|v| (v as &dyn Any).downcast_ref::<u8>().copied())
                .collect();
            encoder.write_binary(&data);
            return Ok(());
        }
        encoder.write_list(self.iter())
    }
}

/// `Vec<u8>` is written as binary, any other element type as an untyped list.
impl<T: ToHessian + 'static> ToHessian for Vec<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        if let Some(data) = (self as &dyn Any).downcast_ref::<Vec<u8>>() {
            encoder.write_binary(data);
            return Ok(());
        }
        encoder.write_list(self.iter())
    }
}

/// `Vec<u8>` is read from binary, any other element type from any list form.
impl<T: FromHessian + 'static> FromHessian for Vec<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            let data: Box<dyn Any> = Box::new(decoder.read_binary()?.to_vec());
            return data
                .downcast::<Vec<T>>()
                .map(|v| *v)
                .map_err(|_| Error::Decode("binary element type mismatch".to_string()));
        }
        Ok(decoder.decode_list_with(T::from_hessian)?.1)
    }
}

impl<T: ToHessian> ToHessian for VecDeque<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_list(self.iter())
    }
}

impl<T: FromHessian> FromHessian for VecDeque<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        Ok(decoder.decode_list_with(T::from_hessian)?.1.into())
    }
}

// --- maps ---

impl<K: ToHessian, V: ToHessian> ToHessian for HashMap<K, V> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_map(self.iter())
    }
}

impl<K: FromHessian + Eq + Hash, V: FromHessian> FromHessian for HashMap<K, V> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let (_, entries) = decoder.decode_map_with(K::from_hessian, V::from_hessian)?;
        Ok(entries.into_iter().collect())
    }
}

impl<K: ToHessian, V: ToHessian> ToHessian for BTreeMap<K, V> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_map(self.iter())
    }
}

impl<K: FromHessian + Ord, V: FromHessian> FromHessian for BTreeMap<K, V> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let (_, entries) = decoder.decode_map_with(K::from_hessian, V::from_hessian)?;
        Ok(entries.into_iter().collect())
    }
}

impl<K: ToHessian, V: ToHessian> ToHessian for IndexMap<K, V> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_map(self.iter())
    }
}

impl<K: FromHessian + Eq + Hash, V: FromHessian> FromHessian for IndexMap<K, V> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let (_, entries) = decoder.decode_map_with(K::from_hessian, V::from_hessian)?;
        Ok(entries.into_iter().collect())
    }
}

// --- wrappers ---

/// `None` is written as null.
impl<T: ToHessian> ToHessian for Option<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Some(value) => value.to_hessian(encoder),
            None => {
                encoder.write_null();
                Ok(())
            }
        }
    }
}

impl<T: FromHessian> FromHessian for Option<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        if decoder.next_is_null() {
            decoder.read_null()?;
            return Ok(None);
        }
        T::from_hessian(decoder).map(Some)
    }
}

impl<T: ToHessian + ?Sized> ToHessian for &T {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).to_hessian(encoder)
    }
}

impl<T: ToHessian + ?Sized> ToHessian for Box<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).to_hessian(encoder)
    }
}

impl<T: FromHessian> FromHessian for Box<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        T::from_hessian(decoder).map(Box::new)
    }
}

impl<T: ToHessian + ?Sized> ToHessian for Rc<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).to_hessian(encoder)
    }
}

impl<T: FromHessian> FromHessian for Rc<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        T::from_hessian(decoder).map(Rc::new)
    }
}

impl<T: ToHessian + ?Sized> ToHessian for Arc<T> {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).to_hessian(encoder)
    }
}

impl<T: FromHessian> FromHessian for Arc<T> {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        T::from_hessian(decoder).map(Arc::new)
    }
}
