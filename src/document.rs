//! Document object store.
//!
//! A [`CosDocument`] owns the trailer, the pool of indirect objects, the
//! cross-reference table and the scratch file every stream body lives in.
//! It is the unit of lifecycle: closing it releases every buffer and page
//! its streams ever acquired.

use crate::error::{Error, Result};
use crate::io::{MemoryUsageSetting, ScratchFile};
use crate::object::{Array, Dictionary, IndirectRef, Object, ObjectKey, Stream};
use crate::xref::{CrossRefTable, XRefEntry};
use indexmap::IndexMap;
use std::io::Write;

/// Header version of new documents.
pub const DEFAULT_VERSION: f32 = 1.4;

/// The object store of one document.
///
/// # Example
///
/// ```
/// use pdf_cos::document::CosDocument;
///
/// let mut doc = CosDocument::blank();
/// let stream = doc.create_stream();
/// stream.set_raw_data(b"BT ET")?;
/// doc.close()?;
/// # Ok::<(), pdf_cos::Error>(())
/// ```
pub struct CosDocument {
    version: f32,
    trailer: Dictionary,
    /// Indirect objects by key, placeholders included
    pool: IndexMap<ObjectKey, IndirectRef>,
    xref: CrossRefTable,
    /// Streams created through this document, closed with it
    streams: Vec<Stream>,
    scratch: ScratchFile,
    decrypted: bool,
    xref_stream: bool,
    start_xref: u64,
    highest_xref_object_number: u64,
    closed: bool,
    warn_missing_close: bool,
}

impl CosDocument {
    /// An empty document buffering streams in main memory.
    pub fn new() -> Self {
        Self::with_scratch_file(ScratchFile::main_memory_only())
    }

    /// An empty document buffering streams in `scratch`.
    pub fn with_scratch_file(scratch: ScratchFile) -> Self {
        Self {
            version: DEFAULT_VERSION,
            trailer: Dictionary::new(),
            pool: IndexMap::new(),
            xref: CrossRefTable::new(),
            streams: Vec::new(),
            scratch,
            decrypted: false,
            xref_stream: false,
            start_xref: 0,
            highest_xref_object_number: 0,
            closed: false,
            warn_missing_close: true,
        }
    }

    /// An empty document whose streams follow `setting`.
    ///
    /// If the scratch file cannot be set up (e.g. the temp directory does
    /// not exist), the document falls back to main memory.
    pub fn with_memory_setting(setting: MemoryUsageSetting) -> Self {
        match ScratchFile::new(setting.clone()) {
            Ok(scratch) => Self::with_scratch_file(scratch),
            Err(e) => {
                log::warn!(
                    "Error initializing scratch file for {}: {}. Fall back to main memory usage only.",
                    setting,
                    e
                );
                Self::new()
            },
        }
    }

    /// A new document with a catalog and an empty page tree.
    pub fn blank() -> Self {
        Self::blank_with(ScratchFile::main_memory_only())
    }

    /// [`blank`](Self::blank) with streams stored in `scratch`.
    pub fn blank_with(scratch: ScratchFile) -> Self {
        let mut doc = Self::with_scratch_file(scratch);

        let mut pages = Dictionary::new();
        pages.set_name("Type", "Pages");
        pages.set("Kids", Array::new());
        pages.set_int("Count", 0);
        let pages = doc.add_object(pages);

        let mut catalog = Dictionary::new();
        catalog.set_name("Type", "Catalog");
        catalog.set_name("Version", &format!("{:.1}", DEFAULT_VERSION));
        catalog.set("Pages", pages);
        let catalog = doc.add_object(catalog);

        doc.trailer.set("Root", catalog);
        doc
    }

    /// Header version.
    pub fn version(&self) -> f32 {
        self.version
    }

    /// Set the header version.
    pub fn set_version(&mut self, version: f32) {
        self.version = version;
    }

    /// The trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// The trailer dictionary, mutably.
    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Replace the trailer.
    pub fn set_trailer(&mut self, trailer: Dictionary) {
        self.trailer = trailer;
    }

    /// The document catalog (`/Root`).
    pub fn catalog(&self) -> Option<Dictionary> {
        self.trailer.get_dictionary("Root")
    }

    /// The page tree root (`/Root /Pages`).
    pub fn pages(&self) -> Option<Dictionary> {
        self.catalog()?.get_dictionary("Pages")
    }

    /// Whether the trailer carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.encryption_dictionary().is_some()
    }

    /// The trailer's `/Encrypt` dictionary.
    pub fn encryption_dictionary(&self) -> Option<Dictionary> {
        self.trailer.get_dictionary("Encrypt")
    }

    /// Set or (with `None`) remove the `/Encrypt` entry.
    pub fn set_encryption_dictionary(&mut self, dictionary: Option<Dictionary>) {
        self.trailer.set("Encrypt", dictionary);
    }

    /// The trailer's `/ID` array.
    pub fn document_id(&self) -> Option<Array> {
        self.trailer.get_array("ID")
    }

    /// Set or (with `None`) remove the `/ID` entry.
    pub fn set_document_id(&mut self, id: Option<Array>) {
        self.trailer.set("ID", id);
    }

    /// The trailer's `/Info` dictionary.
    pub fn info(&self) -> Option<Dictionary> {
        self.trailer.get_dictionary("Info")
    }

    /// Set the `/Info` entry, usually to a reference from
    /// [`add_object`](Self::add_object).
    pub fn set_info(&mut self, info: impl Into<Object>) {
        self.trailer.set("Info", info);
    }

    /// Whether the encryption layer already decrypted this document.
    pub fn is_decrypted(&self) -> bool {
        self.decrypted
    }

    /// Mark the document as decrypted.
    pub fn set_decrypted(&mut self) {
        self.decrypted = true;
    }

    /// Whether the document was read from a cross-reference stream.
    pub fn is_xref_stream(&self) -> bool {
        self.xref_stream
    }

    /// Record whether the document uses a cross-reference stream.
    pub fn set_is_xref_stream(&mut self, value: bool) {
        self.xref_stream = value;
    }

    /// Offset of the last cross-reference section.
    pub fn start_xref(&self) -> u64 {
        self.start_xref
    }

    /// Set the offset of the last cross-reference section.
    pub fn set_start_xref(&mut self, offset: u64) {
        self.start_xref = offset;
    }

    /// Highest object number used by a cross-reference stream; incremental
    /// saves must not reuse numbers up to it.
    pub fn highest_xref_object_number(&self) -> u64 {
        self.highest_xref_object_number
    }

    /// Set the highest cross-reference stream object number.
    pub fn set_highest_xref_object_number(&mut self, number: u64) {
        self.highest_xref_object_number = number;
    }

    /// Turn the warning for documents dropped without `close()` on or off.
    pub fn set_warn_missing_close(&mut self, warn: bool) {
        self.warn_missing_close = warn;
    }

    /// The scratch file stream bodies are stored in.
    pub fn scratch_file(&self) -> &ScratchFile {
        &self.scratch
    }

    /// The pool entry for `key`, creating an unresolved placeholder on first
    /// request.
    ///
    /// Every call for the same key returns a handle to the same entry, so
    /// filling the placeholder later is visible to all earlier callers.
    pub fn get_object_from_pool(&mut self, key: ObjectKey) -> IndirectRef {
        self.pool
            .entry(key)
            .or_insert_with(|| IndirectRef::new(key))
            .clone()
    }

    /// The pool entry for `key` without creating one.
    pub fn get_object(&self, key: &ObjectKey) -> Option<IndirectRef> {
        self.pool.get(key).cloned()
    }

    /// Add `object` under the next free object number, returning its
    /// reference.
    pub fn add_object(&mut self, object: impl Into<Object>) -> IndirectRef {
        let key = ObjectKey::new(self.next_object_number(), 0);
        let reference = IndirectRef::resolved(key, object.into());
        self.pool.insert(key, reference.clone());
        reference
    }

    /// One past the highest object number in use anywhere.
    pub fn next_object_number(&self) -> u64 {
        let in_pool = self.pool.keys().map(|k| k.number).max().unwrap_or(0);
        let in_xref = self.xref.highest_object_number().unwrap_or(0);
        in_pool.max(in_xref).max(self.highest_xref_object_number) + 1
    }

    /// All pool entries in insertion order.
    pub fn objects(&self) -> Vec<IndirectRef> {
        self.pool.values().cloned().collect()
    }

    /// Pool entries whose dictionary (or stream dictionary) has `/Type`
    /// equal to `type_name`.
    pub fn objects_by_type(&self, type_name: &str) -> Vec<IndirectRef> {
        self.pool
            .values()
            .filter(|r| {
                let found = match r.get_object() {
                    Object::Dictionary(d) => d.get_name("Type"),
                    Object::Stream(s) => s.get_name("Type"),
                    _ => None,
                };
                found.is_some_and(|n| n.as_str() == type_name)
            })
            .cloned()
            .collect()
    }

    /// The cross-reference table.
    pub fn xref_table(&self) -> &CrossRefTable {
        &self.xref
    }

    /// Merge cross-reference entries; incoming entries win.
    pub fn add_xref_table(&mut self, entries: impl IntoIterator<Item = (ObjectKey, XRefEntry)>) {
        self.xref.add_all(entries);
    }

    /// A new empty stream owned by this document.
    pub fn create_stream(&mut self) -> Stream {
        let stream = Stream::with_scratch_file(self.scratch.clone());
        self.streams.push(stream.clone());
        stream
    }

    /// A new stream owned by this document whose dictionary starts as a
    /// copy of `dictionary`.
    pub fn create_stream_with_dictionary(&mut self, dictionary: &Dictionary) -> Stream {
        let stream = Stream::from_dictionary(dictionary, self.scratch.clone());
        self.streams.push(stream.clone());
        stream
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release every stream body and then the scratch file.
    ///
    /// Every resource is released even if an earlier one fails; the first
    /// failure is returned. A second call does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let mut first_error: Option<Error> = None;
        for stream in self.streams.drain(..) {
            keep_first(&mut first_error, stream.close(), "stream");
        }
        keep_first(&mut first_error, self.scratch.close(), "scratch file");

        // unbind pool values so reference cycles between objects are freed
        for reference in self.pool.values() {
            reference.take_object();
        }
        self.closed = true;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Write the document; see [`crate::writer::save`].
    pub fn save<W: Write>(&self, writer: W) -> Result<u64> {
        crate::writer::save(self, writer)
    }

    pub(crate) fn pool_entries(&self) -> impl Iterator<Item = (&ObjectKey, &IndirectRef)> {
        self.pool.iter()
    }
}

fn keep_first(first: &mut Option<Error>, result: Result<()>, what: &str) {
    if let Err(e) = result {
        log::error!("Error while closing {}: {}", what, e);
        first.get_or_insert(e);
    }
}

impl Default for CosDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CosDocument {
    fn drop(&mut self) {
        if !self.closed {
            if self.warn_missing_close {
                log::warn!("Warning: You did not close a PDF Document");
            }
            if let Err(e) = self.close() {
                log::error!("Failed to close document on drop: {}", e);
            }
        }
    }
}
