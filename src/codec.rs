//! Encode/decode sessions.
//!
//! An [`Encoder`] or [`Decoder`] owns one byte cursor and one set of reference
//! tables. Tables are append-only for the lifetime of the session and are never
//! shared between sessions. Neither type is meant for concurrent use.

use crate::core::*;
use crate::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;

/// Header of a list as read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListHeader {
    /// Element type for typed lists.
    pub type_name: Option<String>,
    /// Element count for fixed-length lists, `None` for lists terminated by `'Z'`.
    pub len: Option<usize>,
}

/// Decoding session over a `Bytes` cursor.
pub struct Decoder {
    pub(crate) reader: Bytes,
    total_len: usize,
    config: Config,
    types_ref: Vec<String>,
    def_ref: Vec<Arc<Definition>>,
    values_ref: usize,
    depth: u32,
    error_code: ErrorCode,
    error_pos: usize,
    error_message: String,
}

impl Decoder {
    pub fn new(input: impl Into<Bytes>) -> Self {
        Self::with_config(input, Config::default())
    }

    pub fn with_config(input: impl Into<Bytes>, config: Config) -> Self {
        let reader = input.into();
        Decoder {
            total_len: reader.len(),
            reader,
            config,
            types_ref: Vec::new(),
            def_ref: Vec::new(),
            values_ref: 0,
            depth: 0,
            error_code: ErrorCode::NoError,
            error_pos: 0,
            error_message: String::new(),
        }
    }

    /// Decodes one value of type `T`.
    ///
    /// On failure the error is also recorded on the session (see [`Decoder::error_code`]);
    /// the decoder cannot be resumed afterwards.
    pub fn decode<T: FromHessian>(&mut self) -> Result<T> {
        let result = T::from_hessian(self);
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    fn record_error(&mut self, e: &Error) {
        if self.error_code != ErrorCode::NoError {
            return;
        }
        self.error_code = e.code();
        self.error_pos = e.offset().unwrap_or_else(|| self.offset());
        self.error_message = e.to_string();
        tracing::debug!(
            offset = self.error_pos,
            code = ?self.error_code,
            "hessian2 decode failed: {}",
            self.error_message
        );
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.total_len - self.reader.remaining()
    }

    pub fn available_bytes(&self) -> usize {
        self.reader.remaining()
    }

    /// Non-advancing view of `len` bytes starting `offset` bytes past the cursor.
    pub fn peek(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.reader.get(offset..offset.checked_add(len)?)
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn error_pos(&self) -> usize {
        self.error_pos
    }

    pub fn error_message(&self) -> String {
        if self.error_code == ErrorCode::NoError {
            return String::new();
        }
        format!("pos: {}, {}", self.error_pos, self.error_message)
    }

    pub fn type_ref_size(&self) -> usize {
        self.types_ref.len()
    }

    pub fn def_ref_size(&self) -> usize {
        self.def_ref.len()
    }

    pub fn value_ref_size(&self) -> usize {
        self.values_ref
    }

    pub fn def_refs(&self) -> &[Arc<Definition>] {
        &self.def_ref
    }

    // --- cursor primitives ---

    #[inline]
    pub(crate) fn need(&self, len: usize) -> Result<()> {
        if self.reader.remaining() < len {
            return Err(Error::NotEnoughBuffer {
                offset: self.offset(),
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn peek_u8(&self) -> Result<u8> {
        self.reader.first().copied().ok_or(Error::NotEnoughBuffer {
            offset: self.offset(),
        })
    }

    #[inline]
    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.reader.get_u8())
    }

    #[inline]
    pub(crate) fn read_u16_be(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.reader.get_u16())
    }

    #[inline]
    pub(crate) fn read_i32_be(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.reader.get_i32())
    }

    #[inline]
    pub(crate) fn read_i64_be(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.reader.get_i64())
    }

    /// Splits `len` bytes off the cursor without copying.
    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.need(len)?;
        Ok(self.reader.split_to(len))
    }

    pub(crate) fn unexpected(&self, code: u8) -> Error {
        Error::UnexpectedType {
            code,
            offset: self.offset().saturating_sub(1),
        }
    }

    /// Runs `f` one nesting level deeper, failing once `Config::max_depth` is reached.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Consumes a `'Z'` end marker if one is next.
    fn consume_end_marker(&mut self) -> Result<bool> {
        if self.peek_u8()? == TAG_END {
            self.reader.advance(1);
            return Ok(true);
        }
        Ok(false)
    }

    /// Returns true (without consuming anything) when the next value is `'N'`.
    pub fn next_is_null(&self) -> bool {
        self.reader.first() == Some(&TAG_NULL)
    }

    pub fn read_null(&mut self) -> Result<()> {
        let code = self.read_u8()?;
        if code != TAG_NULL {
            return Err(self.unexpected(code));
        }
        Ok(())
    }

    // --- reference tables ---

    /// Reads a type: a string on first use, an int index into the type table afterwards.
    pub(crate) fn read_type(&mut self) -> Result<String> {
        let offset = self.offset();
        if is_string_code(self.peek_u8()?) {
            let type_name = self.read_string()?;
            tracing::debug!(index = self.types_ref.len(), %type_name, "register type");
            self.types_ref.push(type_name.clone());
            return Ok(type_name);
        }
        let index = self.read_i32()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.types_ref.get(i))
            .cloned()
            .ok_or(Error::InvalidReference {
                kind: RefKind::Type,
                index: index as i64,
                offset,
            })
    }

    /// Reads a `'C'` class definition body and registers it.
    fn read_definition_body(&mut self) -> Result<Arc<Definition>> {
        let type_name = self.read_string()?;
        let offset = self.offset();
        let count = self.read_i32()?;
        if count < 0 {
            return Err(Error::UnexpectedType {
                code: TAG_CLASS_DEF,
                offset,
            });
        }
        let mut field_names = Vec::with_capacity((count as usize).min(self.available_bytes()));
        for _ in 0..count {
            field_names.push(self.read_string()?);
        }
        let def = Arc::new(Definition::new(type_name, field_names));
        tracing::debug!(index = self.def_ref.len(), type_name = %def.type_name, "register definition");
        self.def_ref.push(def.clone());
        Ok(def)
    }

    fn definition_at(&self, index: i64, offset: usize) -> Result<Arc<Definition>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.def_ref.get(i))
            .cloned()
            .ok_or(Error::InvalidReference {
                kind: RefKind::Definition,
                index,
                offset,
            })
    }

    /// Reads the header of a class instance and returns its definition.
    ///
    /// Accepts any number of leading `'C'` definitions followed by `'O'` + index or a
    /// compact `0x60..=0x6f` instance. The instance is registered in the value table;
    /// the caller then reads exactly `def.field_names.len()` values.
    pub fn decode_class_instance_begin(&mut self) -> Result<Arc<Definition>> {
        loop {
            let offset = self.offset();
            let code = self.read_u8()?;
            let def = match code {
                TAG_CLASS_DEF => {
                    self.read_definition_body()?;
                    continue;
                }
                TAG_OBJECT => {
                    let index = self.read_i32()?;
                    self.definition_at(index as i64, offset)?
                }
                TAG_OBJECT_COMPACT_START..=TAG_OBJECT_COMPACT_END => {
                    self.definition_at((code - TAG_OBJECT_COMPACT_START) as i64, offset)?
                }
                other => return Err(self.unexpected(other)),
            };
            self.values_ref += 1;
            return Ok(def);
        }
    }

    pub fn decode_class_instance_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads a list header and registers the list in the value table.
    pub fn decode_list_begin(&mut self) -> Result<ListHeader> {
        let code = self.read_u8()?;
        let header = match code {
            TAG_LIST_VAR_TYPED => ListHeader {
                type_name: Some(self.read_type()?),
                len: None,
            },
            TAG_LIST_FIXED_TYPED => {
                let type_name = self.read_type()?;
                let len = self.read_length()?;
                ListHeader {
                    type_name: Some(type_name),
                    len: Some(len),
                }
            }
            TAG_LIST_VAR_UNTYPED => ListHeader {
                type_name: None,
                len: None,
            },
            TAG_LIST_FIXED_UNTYPED => ListHeader {
                type_name: None,
                len: Some(self.read_length()?),
            },
            TAG_LIST_TYPED_SHORT..=0x77 => ListHeader {
                type_name: Some(self.read_type()?),
                len: Some((code - TAG_LIST_TYPED_SHORT) as usize),
            },
            TAG_LIST_UNTYPED_SHORT..=0x7f => ListHeader {
                type_name: None,
                len: Some((code - TAG_LIST_UNTYPED_SHORT) as usize),
            },
            other => return Err(self.unexpected(other)),
        };
        self.values_ref += 1;
        Ok(header)
    }

    fn read_length(&mut self) -> Result<usize> {
        let offset = self.offset();
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| Error::Decode(format!("negative list length {} at offset {}", len, offset)))
    }

    /// Decodes a whole list, reading each element with `f`.
    pub fn decode_list_with<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<(Option<String>, Vec<T>)> {
        let header = self.decode_list_begin()?;
        let values = self.nested(|d| match header.len {
            Some(len) => {
                let mut values = Vec::with_capacity(len.min(d.available_bytes()));
                for _ in 0..len {
                    values.push(f(d)?);
                }
                Ok(values)
            }
            None => {
                let mut values = Vec::new();
                while !d.consume_end_marker()? {
                    values.push(f(d)?);
                }
                Ok(values)
            }
        })?;
        Ok((header.type_name, values))
    }

    /// Reads a map header (`'M'` type or `'H'`) and registers the map in the value table.
    pub fn decode_map_begin(&mut self) -> Result<Option<String>> {
        let code = self.read_u8()?;
        let type_name = match code {
            TAG_MAP_TYPED => Some(self.read_type()?),
            TAG_MAP_UNTYPED => None,
            other => return Err(self.unexpected(other)),
        };
        self.values_ref += 1;
        Ok(type_name)
    }

    /// Decodes a whole map, reading keys with `fk` and values with `fv`.
    pub fn decode_map_with<K, V>(
        &mut self,
        mut fk: impl FnMut(&mut Self) -> Result<K>,
        mut fv: impl FnMut(&mut Self) -> Result<V>,
    ) -> Result<(Option<String>, Vec<(K, V)>)> {
        let type_name = self.decode_map_begin()?;
        let entries = self.nested(|d| {
            let mut entries = Vec::new();
            while !d.consume_end_marker()? {
                let k = fk(d)?;
                let v = fv(d)?;
                entries.push((k, v));
            }
            Ok(entries)
        })?;
        Ok((type_name, entries))
    }

    fn read_ref(&mut self) -> Result<u32> {
        let offset = self.offset();
        let code = self.read_u8()?;
        if code != TAG_REF {
            return Err(self.unexpected(code));
        }
        let index = self.read_i32()?;
        match u32::try_from(index) {
            Ok(i) if (i as usize) < self.values_ref => Ok(i),
            _ => Err(Error::InvalidReference {
                kind: RefKind::Value,
                index: index as i64,
                offset,
            }),
        }
    }

    /// Reads and discards one value of any type.
    pub fn skip_value(&mut self) -> Result<()> {
        self.decode_object().map(|_| ())
    }

    /// Decodes the next value into the dynamic value model.
    pub fn decode_object(&mut self) -> Result<Object> {
        let code = self.peek_u8()?;
        match code {
            TAG_NULL => {
                self.reader.advance(1);
                Ok(Object::Null)
            }
            TAG_TRUE | TAG_FALSE => Ok(Object::Boolean(self.read_bool()?)),
            0x80..=0xd7 | TAG_INT => Ok(Object::Integer(self.read_i32()?)),
            0xd8..=0xff | 0x38..=0x3f | TAG_LONG_INT | TAG_LONG => {
                Ok(Object::Long(self.read_i64()?))
            }
            0x5b..=0x5f | TAG_DOUBLE => Ok(Object::Double(self.read_f64()?)),
            0x20..=0x2f | 0x34..=0x37 | TAG_BINARY_CHUNK | TAG_BINARY_FINAL => {
                Ok(Object::Binary(self.read_binary()?))
            }
            TAG_DATE_MILLIS | TAG_DATE_MINUTES => Ok(Object::Date(self.read_date_millis()?)),
            0x00..=0x1f | 0x30..=0x33 | TAG_STRING_FINAL | TAG_STRING_CHUNK => {
                Ok(Object::String(self.read_string()?))
            }
            TAG_LIST_VAR_TYPED..=TAG_LIST_FIXED_UNTYPED | 0x70..=0x7f => {
                let (type_name, values) = self.decode_list_with(Self::decode_object)?;
                Ok(match type_name {
                    Some(type_name) => Object::TypedList(TypedList { type_name, values }),
                    None => Object::UntypedList(values),
                })
            }
            TAG_MAP_TYPED | TAG_MAP_UNTYPED => {
                let (type_name, entries) =
                    self.decode_map_with(Self::decode_object, Self::decode_object)?;
                let entries: UntypedMap = entries.into_iter().collect();
                Ok(match type_name {
                    Some(type_name) => Object::TypedMap(TypedMap { type_name, entries }),
                    None => Object::UntypedMap(entries),
                })
            }
            TAG_CLASS_DEF | TAG_OBJECT | 0x60..=0x6f => {
                let def = self.decode_class_instance_begin()?;
                let data = self.nested(|d| {
                    (0..def.field_names.len())
                        .map(|_| d.decode_object())
                        .collect::<Result<Vec<_>>>()
                })?;
                self.decode_class_instance_end()?;
                Ok(Object::ClassInstance(ClassInstance { def, data }))
            }
            TAG_REF => Ok(Object::Ref(self.read_ref()?)),
            other => {
                self.reader.advance(1);
                Err(self.unexpected(other))
            }
        }
    }
}

/// Encoding session appending to a `BytesMut` buffer.
pub struct Encoder {
    pub(crate) writer: BytesMut,
    config: Config,
    types_ref: HashMap<String, usize>,
    def_ref: Vec<Arc<Definition>>,
    values_ref: usize,
    depth: u32,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_buffer(BytesMut::new())
    }

    /// Appends to an existing buffer.
    pub fn with_buffer(writer: BytesMut) -> Self {
        Self::with_config(writer, Config::default())
    }

    pub fn with_config(writer: BytesMut, config: Config) -> Self {
        Encoder {
            writer,
            config,
            types_ref: HashMap::new(),
            def_ref: Vec::new(),
            values_ref: 0,
            depth: 0,
        }
    }

    pub fn encode<T: ToHessian + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.to_hessian(self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.writer
    }

    pub fn into_bytes(self) -> Bytes {
        self.writer.freeze()
    }

    pub fn into_inner(self) -> BytesMut {
        self.writer
    }

    pub fn type_ref_size(&self) -> usize {
        self.types_ref.len()
    }

    pub fn def_ref_size(&self) -> usize {
        self.def_ref.len()
    }

    pub fn value_ref_size(&self) -> usize {
        self.values_ref
    }

    pub fn get_type_ref(&self, type_name: &str) -> Option<usize> {
        self.types_ref.get(type_name).copied()
    }

    pub fn get_def_ref(&self, def: &Definition) -> Option<usize> {
        self.def_ref.iter().position(|d| **d == *def)
    }

    pub fn def_refs(&self) -> &[Arc<Definition>] {
        &self.def_ref
    }

    /// Runs `f` one nesting level deeper, failing once `Config::max_depth` is reached.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub fn write_null(&mut self) {
        self.writer.put_u8(TAG_NULL);
    }

    /// Writes a type: the string on first use, its table index afterwards.
    fn write_type(&mut self, type_name: &str) -> Result<()> {
        if let Some(index) = self.get_type_ref(type_name) {
            self.write_i32(index as i32);
            return Ok(());
        }
        tracing::debug!(index = self.types_ref.len(), %type_name, "register type");
        self.types_ref
            .insert(type_name.to_string(), self.types_ref.len());
        self.write_str(type_name)
    }

    /// Writes `def` as a `'C'` definition unless this session already has it, and
    /// returns its index in the definition table.
    pub fn encode_definition(&mut self, def: &Definition) -> Result<usize> {
        if let Some(index) = self.get_def_ref(def) {
            return Ok(index);
        }
        self.writer.put_u8(TAG_CLASS_DEF);
        self.write_str(&def.type_name)?;
        self.write_i32(def.field_names.len() as i32);
        for field in &def.field_names {
            self.write_str(field)?;
        }
        let index = self.def_ref.len();
        tracing::debug!(index, type_name = %def.type_name, "register definition");
        self.def_ref.push(Arc::new(def.clone()));
        Ok(index)
    }

    /// Starts a class instance. The caller then writes exactly
    /// `def.field_names.len()` values in definition order.
    pub fn encode_class_instance_begin(&mut self, def: &Definition) -> Result<()> {
        let index = self.encode_definition(def)?;
        if index <= (TAG_OBJECT_COMPACT_END - TAG_OBJECT_COMPACT_START) as usize {
            self.writer.put_u8(TAG_OBJECT_COMPACT_START + index as u8);
        } else {
            self.writer.put_u8(TAG_OBJECT);
            self.write_i32(index as i32);
        }
        self.values_ref += 1;
        Ok(())
    }

    pub fn encode_class_instance_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Starts a `'Z'`-terminated list. An empty `type_name` writes an untyped list.
    pub fn encode_var_list_begin(&mut self, type_name: &str) -> Result<()> {
        if type_name.is_empty() {
            self.writer.put_u8(TAG_LIST_VAR_UNTYPED);
        } else {
            self.writer.put_u8(TAG_LIST_VAR_TYPED);
            self.write_type(type_name)?;
        }
        self.values_ref += 1;
        Ok(())
    }

    pub fn encode_var_list_end(&mut self) -> Result<()> {
        self.writer.put_u8(TAG_END);
        Ok(())
    }

    /// Starts a list of `len` elements. An empty `type_name` writes an untyped list.
    pub fn encode_fixed_list_begin(&mut self, type_name: &str, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::Encode(format!("list length {} exceeds i32", len)))?;
        let short = len <= LIST_SHORT_MAX as i32;
        match (type_name.is_empty(), short) {
            (true, true) => self.writer.put_u8(TAG_LIST_UNTYPED_SHORT + len as u8),
            (true, false) => {
                self.writer.put_u8(TAG_LIST_FIXED_UNTYPED);
                self.write_i32(len);
            }
            (false, true) => {
                self.writer.put_u8(TAG_LIST_TYPED_SHORT + len as u8);
                self.write_type(type_name)?;
            }
            (false, false) => {
                self.writer.put_u8(TAG_LIST_FIXED_TYPED);
                self.write_type(type_name)?;
                self.write_i32(len);
            }
        }
        self.values_ref += 1;
        Ok(())
    }

    pub fn encode_fixed_list_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Starts a map. An empty `type_name` writes an untyped `'H'` map.
    pub fn encode_map_begin(&mut self, type_name: &str) -> Result<()> {
        if type_name.is_empty() {
            self.writer.put_u8(TAG_MAP_UNTYPED);
        } else {
            self.writer.put_u8(TAG_MAP_TYPED);
            self.write_type(type_name)?;
        }
        self.values_ref += 1;
        Ok(())
    }

    pub fn encode_map_end(&mut self) -> Result<()> {
        self.writer.put_u8(TAG_END);
        Ok(())
    }

    /// Writes a back-reference to the list, map or class instance started at `index`.
    pub fn write_ref(&mut self, index: u32) -> Result<()> {
        if index as usize >= self.values_ref {
            return Err(Error::Encode(format!(
                "reference {} is beyond the {} values written so far",
                index, self.values_ref
            )));
        }
        self.writer.put_u8(TAG_REF);
        self.write_i32(index as i32);
        Ok(())
    }

    fn write_object_list<'a>(
        &mut self,
        type_name: &str,
        values: impl ExactSizeIterator<Item = &'a Object>,
    ) -> Result<()> {
        self.encode_fixed_list_begin(type_name, values.len())?;
        self.nested(|e| values.into_iter().try_for_each(|v| e.encode_object(v)))?;
        self.encode_fixed_list_end()
    }

    fn write_object_map(&mut self, type_name: &str, entries: &UntypedMap) -> Result<()> {
        self.encode_map_begin(type_name)?;
        self.nested(|e| {
            entries.iter().try_for_each(|(k, v)| {
                e.encode_object(k)?;
                e.encode_object(v)
            })
        })?;
        self.encode_map_end()
    }

    /// Encodes a dynamic value.
    ///
    /// A class instance whose data length differs from its definition's field count, or a
    /// typed list or map with an empty type name, is rejected with `Error::Encode` before
    /// anything is written for it.
    pub fn encode_object(&mut self, value: &Object) -> Result<()> {
        match value {
            Object::Null => self.write_null(),
            Object::Boolean(v) => self.write_bool(*v),
            Object::Integer(v) => self.write_i32(*v),
            Object::Long(v) => self.write_i64(*v),
            Object::Double(v) => self.write_f64(*v),
            Object::Binary(v) => self.write_binary(v),
            Object::Date(v) => self.write_date_millis(*v),
            Object::String(v) => self.write_str(v)?,
            Object::Ref(v) => self.write_ref(*v)?,
            Object::TypedList(l) => {
                require_type_name(&l.type_name, "list")?;
                self.write_object_list(&l.type_name, l.values.iter())?
            }
            Object::UntypedList(l) => self.write_object_list("", l.iter())?,
            Object::TypedMap(m) => {
                require_type_name(&m.type_name, "map")?;
                self.write_object_map(&m.type_name, &m.entries)?
            }
            Object::UntypedMap(m) => self.write_object_map("", m)?,
            Object::ClassInstance(c) => {
                if c.data.len() != c.def.field_names.len() {
                    return Err(Error::Encode(format!(
                        "class {} declares {} fields but the instance holds {} values",
                        c.def.type_name,
                        c.def.field_names.len(),
                        c.data.len()
                    )));
                }
                self.encode_class_instance_begin(&c.def)?;
                self.nested(|e| c.data.iter().try_for_each(|v| e.encode_object(v)))?;
                self.encode_class_instance_end()?;
            }
        }
        Ok(())
    }
}

/// An empty type name would be written as the untyped form and read back untyped.
fn require_type_name(type_name: &str, kind: &str) -> Result<()> {
    if type_name.is_empty() {
        return Err(Error::Encode(format!("typed {} with an empty type name", kind)));
    }
    Ok(())
}

impl ToHessian for Object {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.encode_object(self)
    }
}

impl FromHessian for Object {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        decoder.decode_object()
    }
}

/// Writes a standalone `'C'` definition (no instance) if the session lacks it.
impl ToHessian for Definition {
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.encode_definition(self).map(|_| ())
    }
}

/// Reads a standalone `'C'` definition and registers it.
impl FromHessian for Definition {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self> {
        let code = decoder.read_u8()?;
        if code != TAG_CLASS_DEF {
            return Err(decoder.unexpected(code));
        }
        Ok(decoder.read_definition_body()?.as_ref().clone())
    }
}
