//! # hessian2-codec
//!
//! A codec for the Hessian2 binary serialization format, the compact, self-describing
//! wire format used for Dubbo-style RPC payloads.
//!
//! - Bit-exact encoding of booleans, 32/64-bit integers, doubles, binary blobs, dates and
//!   strings, always choosing the most compact legal wire form
//! - UTF-8 strings measured and chunked in UTF-16 units, with the surrogate-pair rewrite of
//!   astral code points that the Java implementation performs
//! - A dynamic value model ([`Object`]) able to hold anything a Hessian2 stream carries
//! - Per-session type, definition and value reference tables
//! - Custom derive macros mapping Rust structs onto Hessian2 class instances
//! - Feature-gated support for optional dependencies
//!
//! ## Attribute Macros
//!
//! `#[derive(ToHessian, FromHessian)]` is supported on structs with named fields:
//!
//! - `#[hessian(class = "com.example.Person")]`: Type name written into the class definition.
//!   Defaults to the Rust struct name.
//! - `#[hessian(rename = "name")]`: Field name used on the wire instead of the Rust identifier.
//! - `#[hessian(default)]`: If the field is missing from the decoded definition, it is set to
//!   `Default::default()` instead of causing an error. `Option<T>` fields behave this way implicitly.
//! - `#[hessian(skip)]`: The field is never written and always decoded as `Default::default()`.
//!
//! ## Feature Flags
//!
//! - `chrono`: Encodes `chrono::DateTime<Utc>` and `NaiveDateTime` as Hessian2 dates.
//! - `rust_decimal`: Encodes `rust_decimal::Decimal` as a `java.math.BigDecimal` class instance.
//! - `serde_json`: Converts between [`Object`] and `serde_json::Value`, and encodes JSON values.
//! - `smol_str`: Encodes `smol_str::SmolStr` as a Hessian2 string.

pub mod codec;
pub mod config;
pub mod core;
pub mod date;
mod features;
pub mod object;
mod string;

use bytes::Bytes;
pub use hessian2_codec_derive::{FromHessian, ToHessian};
use std::fmt;

pub use crate::codec::{Decoder, Encoder, ListHeader};
pub use crate::config::Config;
pub use crate::date::{Days, Hours, Millis, Minutes, Months, Seconds, Weeks, Years};
pub use crate::object::{
    ClassInstance, Definition, Object, ObjectType, TypedList, TypedMap, UntypedList, UntypedMap,
};

/// Errors that can occur during encoding or decoding operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cursor ran out of bytes before a declared or required length.
    #[error("There is not enough buffer at offset {offset}")]
    NotEnoughBuffer { offset: usize },
    /// The lead byte does not match any grammar rule for the requested type.
    #[error("Unexpected type code 0x{code:02x} at offset {offset}")]
    UnexpectedType { code: u8, offset: usize },
    /// A type, definition or value reference points past the end of its session table.
    #[error("Unknown {kind} reference {index} at offset {offset}")]
    InvalidReference {
        kind: RefKind,
        index: i64,
        offset: usize,
    },
    /// Malformed UTF-8 lead byte, truncated character or out-of-range code point.
    #[error("Invalid UTF-8 data at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// Nesting went deeper than `Config::max_depth`.
    #[error("Maximum nesting depth {limit} exceeded")]
    DepthLimitExceeded { limit: u32 },
    /// The value cannot be expressed on the wire.
    #[error("Encode error: {0}")]
    Encode(String),
    /// A custom type rejected a well-formed value.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Derived struct decode error
    #[error(transparent)]
    StructDecode(#[from] StructDecodeError),
}

/// The result type used throughout this crate for encode/decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Derive-specific error types for class-instance structs
#[derive(Debug, thiserror::Error)]
pub enum StructDecodeError {
    #[error("Required field '{field}' not found for struct {struct_name}")]
    MissingRequiredField {
        field: &'static str,
        struct_name: &'static str,
    },
}

/// The reference table an [`Error::InvalidReference`] was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Type,
    Definition,
    Value,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Type => f.write_str("type"),
            RefKind::Definition => f.write_str("definition"),
            RefKind::Value => f.write_str("value"),
        }
    }
}

/// Coarse decode error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    NoError,
    NotEnoughBuffer,
    UnexpectedType,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "",
            ErrorCode::NotEnoughBuffer => "There is not enough buffer",
            ErrorCode::UnexpectedType => "Unexpected type",
        }
    }
}

impl Error {
    /// Collapses the error into the decode taxonomy.
    ///
    /// Everything that is not a short buffer is reported as `UnexpectedType`: the stream
    /// did not match what the grammar allows at that point.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::NotEnoughBuffer { .. } => ErrorCode::NotEnoughBuffer,
            _ => ErrorCode::UnexpectedType,
        }
    }

    /// Byte offset the error was raised at, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::NotEnoughBuffer { offset }
            | Error::UnexpectedType { offset, .. }
            | Error::InvalidReference { offset, .. }
            | Error::InvalidUtf8 { offset } => Some(*offset),
            _ => None,
        }
    }
}

/// Trait for types that can be written to a Hessian2 stream.
///
/// Implement this trait for your type to take part in encoding, or use
/// `#[derive(ToHessian)]` to map a struct onto a class instance.
///
/// # Errors
/// Returns an `Error` if the value cannot be expressed on the wire. Bytes already
/// written to the encoder are not rolled back.
pub trait ToHessian {
    /// Write the value into the encoder's buffer, using its reference tables as needed.
    fn to_hessian(&self, encoder: &mut Encoder) -> Result<()>;
}

/// Trait for types that can be read from a Hessian2 stream.
///
/// The decoder is passed in so nested values are read through the same session
/// and share its reference tables.
///
/// # Errors
/// Returns an `Error` if the bytes do not match the grammar for this type. The
/// decoder must be discarded after a failure.
pub trait FromHessian: Sized {
    fn from_hessian(decoder: &mut Decoder) -> Result<Self>;
}

/// Convenience function to encode a value in a fresh session.
///
/// # Example
/// ```rust
/// use hessian2_codec::{decode, encode};
///
/// let bytes = encode(&10i32).unwrap();
/// assert_eq!(&bytes[..], &[0x9a]);
/// let value: i32 = decode(bytes).unwrap();
/// assert_eq!(value, 10);
/// ```
pub fn encode<T: ToHessian + ?Sized>(value: &T) -> Result<Bytes> {
    let mut encoder = Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Convenience function to decode a value from bytes in a fresh session.
///
/// # Example
/// ```rust
/// use hessian2_codec::{decode, encode, FromHessian, ToHessian};
///
/// #[derive(ToHessian, FromHessian, PartialEq, Debug)]
/// #[hessian(class = "com.example.Person")]
/// struct Person {
///     age: i32,
///     name: String,
/// }
///
/// let value = Person { age: 12, name: "test".to_string() };
/// let bytes = encode(&value).unwrap();
/// let decoded: Person = decode(bytes).unwrap();
/// assert_eq!(value, decoded);
/// ```
pub fn decode<T: FromHessian>(input: impl Into<Bytes>) -> Result<T> {
    Decoder::new(input).decode()
}
