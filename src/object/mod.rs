//! PDF object types.
//!
//! The object graph is a tree of plain values (numbers, names, strings,
//! arrays, dictionaries) plus two kinds of shared handles: [`IndirectRef`]
//! for `n g R` references into a document's pool and [`Stream`] for stream
//! objects whose bytes live in a scratch buffer.

mod array;
mod dictionary;
mod name;
mod number;
mod reference;
mod stream;

pub use array::Array;
pub use dictionary::{Dictionary, Iter as DictionaryIter, MAP_THRESHOLD};
pub use name::Name;
pub use number::Integer;
pub use reference::{IndirectRef, ObjectKey};
pub use stream::{RawStreamWriter, Stream, StreamWriter};

use bytes::Bytes;
use crate::error::{Error, Result};

/// PDF object representation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    /// Null object
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(Integer),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Bytes),
    /// Name (starting with /)
    Name(Name),
    /// Array of objects
    Array(Array),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream(Stream),
    /// Indirect object reference
    Reference(IndirectRef),
}

impl Object {
    /// A name object.
    pub fn name(value: &str) -> Self {
        Object::Name(Name::new(value))
    }

    /// A string object.
    pub fn string(value: impl Into<Bytes>) -> Self {
        Object::String(value.into())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<Integer> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as an integer; reals are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(i.value()),
            Object::Real(r) => Some(*r as i64),
            _ => None,
        }
    }

    /// Numeric value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(i.as_f64()),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Try to cast to name, as text.
    pub fn as_name_str(&self) -> Option<&str> {
        self.as_name().map(Name::as_str)
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<&IndirectRef> {
        match self {
            Object::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Check if object is an indirect reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, Object::Reference(_))
    }

    /// The object itself, or the object a reference points to.
    pub fn dereference(&self) -> Object {
        match self {
            Object::Reference(r) => r.get_object(),
            other => other.clone(),
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Integer(Integer::from(value))
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(Integer::new(value))
    }
}

impl From<Integer> for Object {
    fn from(value: Integer) -> Self {
        Object::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Real(value)
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Object::Name(value)
    }
}

impl From<Array> for Object {
    fn from(value: Array) -> Self {
        Object::Array(value)
    }
}

impl From<Dictionary> for Object {
    fn from(value: Dictionary) -> Self {
        Object::Dictionary(value)
    }
}

impl From<Stream> for Object {
    fn from(value: Stream) -> Self {
        Object::Stream(value)
    }
}

impl From<IndirectRef> for Object {
    fn from(value: IndirectRef) -> Self {
        Object::Reference(value)
    }
}

impl<T: Into<Object>> From<Option<T>> for Object {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Object::Null)
    }
}

fn type_mismatch(expected: &str, found: &Object) -> Error {
    Error::InvalidObjectType {
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

/// Typed conversions follow references first.
impl TryFrom<Object> for Dictionary {
    type Error = Error;

    fn try_from(value: Object) -> Result<Self> {
        match value.dereference() {
            Object::Dictionary(d) => Ok(d),
            other => Err(type_mismatch("Dictionary", &other)),
        }
    }
}

impl TryFrom<Object> for Array {
    type Error = Error;

    fn try_from(value: Object) -> Result<Self> {
        match value.dereference() {
            Object::Array(a) => Ok(a),
            other => Err(type_mismatch("Array", &other)),
        }
    }
}

impl TryFrom<Object> for Stream {
    type Error = Error;

    fn try_from(value: Object) -> Result<Self> {
        match value.dereference() {
            Object::Stream(s) => Ok(s),
            other => Err(type_mismatch("Stream", &other)),
        }
    }
}
