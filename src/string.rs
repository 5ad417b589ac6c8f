use crate::core::*;
use crate::*;
use bytes::{BufMut, Bytes, BytesMut};

/// Characters per string chunk.
pub(crate) const STRING_CHUNK_SIZE: usize = 32768;

/// UTF-8 sequence length indexed by the top five bits of the lead byte. Zero marks a byte
/// that cannot start a character.
const UTF8_LEAD_LEN: [u8; 32] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    0, 0, 0, 0, 0, 0, 0, 0, //
    2, 2, 2, 2, 3, 3, 4, 0,
];

#[inline]
pub(crate) fn utf8_lead_len(lead: u8) -> usize {
    UTF8_LEAD_LEN[(lead >> 3) as usize] as usize
}

pub(crate) fn is_string_code(code: u8) -> bool {
    matches!(code, 0x00..=0x1f | 0x30..=0x33 | TAG_STRING_FINAL | TAG_STRING_CHUNK)
}

enum Scan {
    /// `(chars, bytes)` consumed.
    Done(usize, usize),
    BadLead(usize),
    Truncated(usize),
}

/// Walks at most `max_chars` characters of `data`, returning how many characters and
/// bytes were covered.
fn scan_chars(data: &[u8], max_chars: usize) -> Scan {
    let mut pos = 0;
    let mut chars = 0;
    while chars < max_chars && pos < data.len() {
        let len = utf8_lead_len(data[pos]);
        if len == 0 {
            return Scan::BadLead(pos);
        }
        if pos + len > data.len() {
            return Scan::Truncated(pos);
        }
        pos += len;
        chars += 1;
    }
    Scan::Done(chars, pos)
}

fn push_three_byte(out: &mut Vec<u8>, unit: u32) {
    out.push(0xe0 | (unit >> 12) as u8);
    out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
    out.push(0x80 | (unit & 0x3f) as u8);
}

/// Re-expresses every 4-byte character as a UTF-16 surrogate pair, each half written as a
/// 3-byte sequence. Java readers only understand this form.
fn rewrite_astral(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 2);
    let mut pos = 0;
    while pos < data.len() {
        let len = utf8_lead_len(data[pos]);
        let ch = data
            .get(pos..pos + len.max(1))
            .filter(|_| len != 0)
            .ok_or(Error::InvalidUtf8 { offset: pos })?;
        if len != 4 {
            out.extend_from_slice(ch);
            pos += len;
            continue;
        }
        let code_point = ((ch[0] as u32 & 0x07) << 18)
            | ((ch[1] as u32 & 0x3f) << 12)
            | ((ch[2] as u32 & 0x3f) << 6)
            | (ch[3] as u32 & 0x3f);
        if !(0x10000..=0x10ffff).contains(&code_point) {
            return Err(Error::InvalidUtf8 { offset: pos });
        }
        let c = code_point - 0x10000;
        push_three_byte(&mut out, 0xd800 + (c >> 10));
        push_three_byte(&mut out, 0xdc00 + (c & 0x3ff));
        pos += 4;
    }
    Ok(out)
}

/// Decodes wire bytes that may carry 3-byte surrogate halves into a `String`.
fn decode_surrogates(raw: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut pos = 0;
    while pos < raw.len() {
        let len = utf8_lead_len(raw[pos]).max(1);
        let Some(ch) = raw.get(pos..pos + len) else {
            units.push(0xfffd);
            break;
        };
        let code_point = match len {
            1 => ch[0] as u32,
            2 => ((ch[0] as u32 & 0x1f) << 6) | (ch[1] as u32 & 0x3f),
            3 => ((ch[0] as u32 & 0x0f) << 12) | ((ch[1] as u32 & 0x3f) << 6) | (ch[2] as u32 & 0x3f),
            _ => {
                ((ch[0] as u32 & 0x07) << 18)
                    | ((ch[1] as u32 & 0x3f) << 12)
                    | ((ch[2] as u32 & 0x3f) << 6)
                    | (ch[3] as u32 & 0x3f)
            }
        };
        match char::from_u32(code_point) {
            Some(c) if code_point >= 0x10000 => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
            }
            _ if code_point <= 0xffff => units.push(code_point as u16),
            _ => units.push(0xfffd),
        }
        pos += len;
    }
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

impl Encoder {
    /// Encodes a string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.encode_utf8_bytes(value.as_bytes())
    }

    /// Encodes caller-supplied UTF-8 bytes as a string.
    ///
    /// Only lead bytes and sequence lengths are checked; continuation bytes are copied as-is.
    pub fn encode_utf8_bytes(&mut self, data: &[u8]) -> Result<()> {
        let rewritten;
        let mut rest = if data.iter().any(|&b| b >= 0xf0) {
            rewritten = rewrite_astral(data)?;
            &rewritten[..]
        } else {
            data
        };
        let mut consumed = 0;
        loop {
            let (chars, len) = match scan_chars(rest, STRING_CHUNK_SIZE) {
                Scan::Done(chars, len) => (chars, len),
                Scan::BadLead(pos) | Scan::Truncated(pos) => {
                    return Err(Error::InvalidUtf8 {
                        offset: consumed + pos,
                    })
                }
            };
            if len < rest.len() {
                tracing::trace!(chars, bytes = len, "string chunk");
                self.writer.put_u8(TAG_STRING_CHUNK);
                self.writer.put_u16(chars as u16);
                self.writer.put_slice(&rest[..len]);
                rest = &rest[len..];
                consumed += len;
                continue;
            }
            if chars <= STRING_SHORT_MAX {
                self.writer.put_u8(chars as u8);
            } else if chars <= STRING_MEDIUM_MAX {
                self.writer.put_u8(TAG_STRING_MEDIUM + (chars >> 8) as u8);
                self.writer.put_u8(chars as u8);
            } else {
                self.writer.put_u8(TAG_STRING_FINAL);
                self.writer.put_u16(chars as u16);
            }
            self.writer.put_slice(rest);
            return Ok(());
        }
    }
}

impl Decoder {
    /// Reads a chunk header, returning `(is_final, char_count)`.
    fn read_string_header(&mut self) -> Result<(bool, usize)> {
        let code = self.read_u8()?;
        match code {
            0x00..=0x1f => Ok((true, code as usize)),
            0x30..=0x33 => {
                let low = self.read_u8()?;
                Ok((true, (((code - TAG_STRING_MEDIUM) as usize) << 8) + low as usize))
            }
            TAG_STRING_FINAL => Ok((true, self.read_u16_be()? as usize)),
            TAG_STRING_CHUNK => Ok((false, self.read_u16_be()? as usize)),
            other => Err(self.unexpected(other)),
        }
    }

    /// Byte length of the next `chars` characters at the cursor.
    fn string_byte_len(&self, chars: usize) -> Result<usize> {
        let start = self.offset();
        match scan_chars(&self.reader, chars) {
            Scan::Done(n, len) if n == chars => Ok(len),
            Scan::Done(_, len) => Err(Error::NotEnoughBuffer { offset: start + len }),
            Scan::Truncated(pos) => Err(Error::NotEnoughBuffer { offset: start + pos }),
            Scan::BadLead(pos) => Err(Error::InvalidUtf8 { offset: start + pos }),
        }
    }

    /// Reads a string and returns its wire bytes untouched, surrogate halves included.
    pub fn decode_raw_string(&mut self) -> Result<Bytes> {
        let mut parts: Vec<Bytes> = Vec::new();
        loop {
            let (is_final, chars) = self.read_string_header()?;
            let len = self.string_byte_len(chars)?;
            tracing::trace!(chars, bytes = len, is_final, "string chunk");
            parts.push(self.read_bytes(len)?);
            if is_final {
                break;
            }
        }
        if parts.len() == 1 {
            return Ok(parts.pop().unwrap_or_default());
        }
        let mut joined = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
        for part in parts {
            joined.put_slice(&part);
        }
        Ok(joined.freeze())
    }

    /// Reads a string, recombining surrogate pairs. Unpaired halves become U+FFFD.
    pub fn read_string(&mut self) -> Result<String> {
        let raw = self.decode_raw_string()?;
        match std::str::from_utf8(&raw) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => Ok(decode_surrogates(&raw)),
        }
    }
}
