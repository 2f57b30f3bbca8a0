//! Object serialization.
//!
//! Writes objects in PDF syntax. Dictionaries keep their insertion order, so
//! a document written twice produces the same bytes.

use crate::error::Result;
use crate::object::{Array, Dictionary, Name, Object, ObjectKey, Stream};
use std::io::{self, Write};

/// Serializer for objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Minimal whitespace inside dictionaries
    compact: bool,
}

impl ObjectSerializer {
    /// A serializer that puts each dictionary entry on its own line.
    pub fn new() -> Self {
        Self::default()
    }

    /// A serializer with minimal whitespace.
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)?;
        Ok(buf)
    }

    /// Serialize an object to a string, lossily, for logging.
    pub fn serialize_to_string(&self, obj: &Object) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(obj)?).into_owned())
    }

    /// Write an indirect object definition:
    /// `{number} {generation} obj\n{object}\nendobj\n`.
    pub fn write_indirect<W: Write>(&self, w: &mut W, key: ObjectKey, obj: &Object) -> Result<()> {
        writeln!(w, "{} {} obj", key.number, key.generation)?;
        self.write_object(w, obj)?;
        w.write_all(b"\nendobj\n")?;
        Ok(())
    }

    /// Write a direct object.
    ///
    /// References are written as `n g R`, never followed.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> Result<()> {
        match obj {
            Object::Null => w.write_all(b"null")?,
            Object::Boolean(b) => w.write_all(if *b { &b"true"[..] } else { &b"false"[..] })?,
            Object::Integer(i) => write!(w, "{}", i)?,
            Object::Real(r) => write_real(w, *r)?,
            Object::String(s) => write_string(w, s)?,
            Object::Name(n) => write_name(w, n)?,
            Object::Array(arr) => self.write_array(w, arr)?,
            Object::Dictionary(dict) => self.write_dictionary(w, dict)?,
            Object::Stream(stream) => self.write_stream(w, stream)?,
            Object::Reference(r) => {
                let key = r.key();
                write!(w, "{} {} R", key.number, key.generation)?
            },
        }
        Ok(())
    }

    fn write_array<W: Write>(&self, w: &mut W, arr: &Array) -> Result<()> {
        w.write_all(b"[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                w.write_all(b" ")?;
            }
            self.write_object(w, obj)?;
        }
        w.write_all(b"]")?;
        Ok(())
    }

    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary) -> Result<()> {
        w.write_all(b"<<")?;
        for (key, value) in dict.iter() {
            if self.compact {
                w.write_all(b" ")?;
            } else {
                w.write_all(b"\n  ")?;
            }
            write_name(w, key)?;
            w.write_all(b" ")?;
            self.write_object(w, value)?;
        }
        if !dict.is_empty() {
            w.write_all(if self.compact { b" " } else { b"\n" })?;
        }
        w.write_all(b">>")?;
        Ok(())
    }

    /// The stream's raw (encoded) body goes out unchanged; `/Length` is
    /// rewritten to the body's actual size.
    fn write_stream<W: Write>(&self, w: &mut W, stream: &Stream) -> Result<()> {
        let mut reader = stream.create_raw_reader()?;
        let length = reader.remaining()?;

        let mut dict = stream.dictionary();
        dict.set_int("Length", length as i64);
        self.write_dictionary(w, &dict)?;

        w.write_all(b"\nstream\n")?;
        let copied = io::copy(&mut reader, w)?;
        if copied != length {
            log::warn!("Stream body changed while writing: expected {} bytes, wrote {}", length, copied);
        }
        w.write_all(b"\nendstream")?;
        Ok(())
    }
}

/// Reals are written without exponent and with trailing zeros trimmed.
fn write_real<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    if !value.is_finite() {
        log::warn!("Writing non-finite real {} as 0", value);
        return w.write_all(b"0");
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        write!(w, "{}", value as i64)
    } else {
        let formatted = format!("{:.5}", value);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        match trimmed {
            "" | "-" | "-0" => w.write_all(b"0"),
            _ => w.write_all(trimmed.as_bytes()),
        }
    }
}

/// Printable text as a literal string, anything else as hex.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    let is_printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if is_printable {
        w.write_all(b"(")?;
        for &byte in data {
            match byte {
                b'(' => w.write_all(b"\\(")?,
                b')' => w.write_all(b"\\)")?,
                b'\\' => w.write_all(b"\\\\")?,
                b'\n' => w.write_all(b"\\n")?,
                b'\r' => w.write_all(b"\\r")?,
                b'\t' => w.write_all(b"\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        w.write_all(b")")
    } else {
        w.write_all(b"<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        w.write_all(b">")
    }
}

/// `/` followed by the name, with delimiters, whitespace, `#` and
/// non-ASCII bytes escaped as `#xx`.
fn write_name<W: Write>(w: &mut W, name: &Name) -> io::Result<()> {
    w.write_all(b"/")?;
    for byte in name.as_str().bytes() {
        match byte {
            b'!'
            | b'"'
            | b'$'
            | b'&'
            | b'\''
            | b'*'..=b'.'
            | b'0'..=b'9'
            | b';'
            | b'='
            | b'?'
            | b'@'
            | b'A'..=b'Z'
            | b'^'..=b'z'
            | b'|'
            | b'~' => w.write_all(&[byte])?,
            _ => write!(w, "#{:02X}", byte)?,
        }
    }
    Ok(())
}
