//! Writing a document out as a PDF file.
//!
//! ```text
//! CosDocument
//!     ↓
//! [save] (header, pool objects in key order, xref, trailer)
//!     ↓
//! [ObjectSerializer] (objects in PDF syntax)
//!     ↓
//! PDF bytes
//! ```
//!
//! Only a full save with a classic cross-reference table is produced.
//! Stream bodies are copied raw, so filtered streams stay encoded.

mod object_serializer;

pub use object_serializer::ObjectSerializer;

use crate::document::CosDocument;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Tracks how many bytes went through, for xref offsets.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write `document` to `writer`, returning the number of bytes written.
///
/// Unresolved placeholders in the pool are written as free entries. The
/// trailer is copied with `/Size` recomputed and the incremental-update
/// keys (`/Prev`, `/XRefStm`) dropped.
///
/// # Errors
///
/// [`Error::ClosedResource`] if the document was closed, otherwise any
/// error raised while reading stream bodies or writing.
pub fn save<W: Write>(document: &CosDocument, writer: W) -> Result<u64> {
    if document.is_closed() {
        return Err(Error::ClosedResource("Cannot save a closed document".to_string()));
    }

    let serializer = ObjectSerializer::compact();
    let mut out = CountingWriter {
        inner: writer,
        count: 0,
    };

    writeln!(out, "%PDF-{:.1}", document.version())?;
    // binary marker
    out.write_all(b"%\xE2\xE3\xCF\xD3\n")?;

    let mut entries: Vec<_> = document.pool_entries().collect();
    entries.sort_by_key(|(key, _)| **key);

    // object number -> (generation, offset); a later generation replaces an earlier one
    let mut offsets: BTreeMap<u64, (u16, u64)> = BTreeMap::new();
    for (key, reference) in entries {
        let Some(object) = reference.raw_object() else {
            log::debug!("Skipping unresolved object {}", key);
            continue;
        };
        offsets.insert(key.number, (key.generation, out.count));
        serializer.write_indirect(&mut out, *key, &object)?;
    }

    let size = offsets.keys().next_back().map_or(1, |n| n + 1);
    let xref_start = out.count;
    writeln!(out, "xref")?;
    writeln!(out, "0 {}", size)?;
    // every line is exactly 20 bytes
    out.write_all(b"0000000000 65535 f \n")?;
    for number in 1..size {
        match offsets.get(&number) {
            Some((generation, offset)) => write!(out, "{:010} {:05} n \n", offset, generation)?,
            None => out.write_all(b"0000000000 65535 f \n")?,
        }
    }

    let mut trailer = document.trailer().clone();
    trailer.remove("Prev");
    trailer.remove("XRefStm");
    trailer.set_int("Size", size as i64);
    writeln!(out, "trailer")?;
    serializer.write_object(&mut out, &trailer.into())?;
    writeln!(out)?;
    writeln!(out, "startxref")?;
    writeln!(out, "{}", xref_start)?;
    out.write_all(b"%%EOF\n")?;
    out.flush()?;

    log::debug!("Saved {} objects, {} bytes", offsets.len(), out.count);
    Ok(out.count)
}
