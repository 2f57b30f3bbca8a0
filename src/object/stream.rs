//! Stream objects.
//!
//! A [`Stream`] is a dictionary plus a body held in a scratch buffer. The
//! body can be read raw, read decoded through the stream's filter chain, or
//! replaced through a writer. At most one writer may be open at a time and
//! no reader may be opened while it is; rewriting the body closes the old
//! buffer, so readers still holding it fail instead of seeing mixed data.

use super::{Dictionary, Name, Object};
use crate::config::FilterOptions;
use crate::decoders::{pipeline, DecodedStream, Filter, FilterRegistry};
use crate::error::{Error, Result};
use crate::io::{lock, BufferReader, ScratchBuffer, ScratchFile, SharedBuffer};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

struct StreamState {
    /// Raw body; created lazily on first access
    buffer: Option<SharedBuffer>,
    writing: bool,
    closed: bool,
}

struct StreamInner {
    dictionary: Mutex<Dictionary>,
    state: Mutex<StreamState>,
    scratch: ScratchFile,
}

/// Shared handle to a stream object.
///
/// Clones refer to the same stream; equality is identity.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl Stream {
    /// A standalone stream backed by its own main-memory scratch file.
    pub fn new() -> Self {
        Self::with_scratch_file(ScratchFile::main_memory_only())
    }

    /// An empty stream whose body is stored in `scratch`.
    pub fn with_scratch_file(scratch: ScratchFile) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.set_int("Length", 0);
        Stream {
            inner: Arc::new(StreamInner {
                dictionary: Mutex::new(dictionary),
                state: Mutex::new(StreamState {
                    buffer: None,
                    writing: false,
                    closed: false,
                }),
                scratch,
            }),
        }
    }

    /// An empty stream in `scratch` whose dictionary starts as a copy of
    /// `dictionary`.
    pub fn from_dictionary(dictionary: &Dictionary, scratch: ScratchFile) -> Self {
        let stream = Self::with_scratch_file(scratch);
        stream.with_dictionary_mut(|d| d.add_all(dictionary));
        stream
    }

    /// The scratch file holding the body.
    pub fn scratch_file(&self) -> &ScratchFile {
        &self.inner.scratch
    }

    /// Snapshot of the stream dictionary.
    pub fn dictionary(&self) -> Dictionary {
        lock(&self.inner.dictionary).clone()
    }

    /// Run `f` against the stream dictionary.
    pub fn with_dictionary<R>(&self, f: impl FnOnce(&Dictionary) -> R) -> R {
        f(&lock(&self.inner.dictionary))
    }

    /// Run `f` against the stream dictionary, mutably.
    pub fn with_dictionary_mut<R>(&self, f: impl FnOnce(&mut Dictionary) -> R) -> R {
        f(&mut lock(&self.inner.dictionary))
    }

    /// Dictionary lookup with references resolved.
    pub fn get(&self, key: &str) -> Option<Object> {
        self.with_dictionary(|d| d.get(key))
    }

    /// Integer dictionary entry, or `default`.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.with_dictionary(|d| d.get_int(key, default))
    }

    /// Name dictionary entry.
    pub fn get_name(&self, key: &str) -> Option<Name> {
        self.with_dictionary(|d| d.get_name(key))
    }

    /// Store a dictionary entry; `null` removes it.
    pub fn set(&self, key: impl Into<Name>, value: impl Into<Object>) {
        let (key, value) = (key.into(), value.into());
        self.with_dictionary_mut(|d| d.set(key, value));
    }

    /// Remove a dictionary entry.
    pub fn remove(&self, key: &str) -> Option<Object> {
        self.with_dictionary_mut(|d| d.remove(key))
    }

    /// The `/Filter` entry, resolved.
    pub fn filters(&self) -> Option<Object> {
        self.get("Filter")
    }

    /// Whether a writer is currently open.
    pub fn is_writing(&self) -> bool {
        lock(&self.inner.state).writing
    }

    /// Whether the body was closed, directly or by closing its store.
    pub fn is_closed(&self) -> bool {
        let state = lock(&self.inner.state);
        state.closed
            || match &state.buffer {
                Some(buffer) => lock(buffer).is_closed(),
                None => self.inner.scratch.is_closed(),
            }
    }

    /// Length of the raw body in bytes.
    pub fn raw_length(&self) -> Result<u64> {
        let state = lock(&self.inner.state);
        check_closed(&state)?;
        Ok(state.buffer.as_ref().map_or(0, |b| lock(b).len()))
    }

    /// Reader over the raw (still encoded) body.
    pub fn create_raw_reader(&self) -> Result<BufferReader> {
        let mut state = lock(&self.inner.state);
        check_closed(&state)?;
        if state.writing {
            return Err(Error::ConcurrentWriterConflict(
                "cannot read a stream while a writer is open".to_string(),
            ));
        }
        let buffer = self.ensure_buffer(&mut state)?;
        Ok(BufferReader::shared(buffer))
    }

    /// Reader over the decoded body, using the built-in filters.
    pub fn create_reader(&self) -> Result<DecodedStream> {
        self.create_reader_with(FilterRegistry::global(), &FilterOptions::default())
    }

    /// Reader over the decoded body using `registry` and `options`.
    ///
    /// Intermediate stages of a multi-filter chain are buffered in this
    /// stream's scratch file.
    pub fn create_reader_with(
        &self,
        registry: &FilterRegistry,
        options: &FilterOptions,
    ) -> Result<DecodedStream> {
        let raw = self.create_raw_reader()?;
        let dictionary = self.dictionary();
        let filters = pipeline::resolve_filters(registry, dictionary.get("Filter").as_ref())?;
        pipeline::decode(
            &filters,
            &dictionary,
            Box::new(raw),
            Some(&self.inner.scratch),
            options,
        )
    }

    /// Writer that replaces the raw body.
    ///
    /// The previous body is closed immediately; readers still open on it
    /// fail from then on. `/Length` is updated when the writer finishes.
    pub fn create_raw_writer(&self) -> Result<RawStreamWriter> {
        let mut state = lock(&self.inner.state);
        check_closed(&state)?;
        if state.writing {
            return Err(Error::ConcurrentWriterConflict(
                "a writer is already open on this stream".to_string(),
            ));
        }
        if let Some(old) = state.buffer.take() {
            lock(&old).close();
        }
        let buffer: SharedBuffer = Arc::new(Mutex::new(self.inner.scratch.create_buffer()?));
        state.buffer = Some(buffer.clone());
        state.writing = true;
        Ok(RawStreamWriter {
            stream: self.clone(),
            buffer,
            finished: false,
        })
    }

    /// Writer that takes decoded bytes and stores them encoded with `filters`.
    ///
    /// `filters` becomes the `/Filter` entry (a name, an array of names, or
    /// `null` for none). Predictor parameters for the encoders are read from
    /// `/DecodeParms` when the writer finishes.
    pub fn create_writer(&self, filters: impl Into<Object>) -> Result<StreamWriter> {
        let filters = filters.into();
        let chain = pipeline::resolve_filters(FilterRegistry::global(), Some(&filters))?;
        let raw = self.create_raw_writer()?;
        self.set("Filter", filters);
        let staging = self.inner.scratch.create_buffer()?;
        Ok(StreamWriter {
            raw: Some(raw),
            staging,
            filters: chain,
            options: FilterOptions::default(),
        })
    }

    /// Replace the raw body with `data`.
    pub fn set_raw_data(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.create_raw_writer()?;
        writer.write_all(data)?;
        writer.finish()
    }

    /// Replace the body with `data` encoded through `filters`.
    pub fn set_data(&self, data: &[u8], filters: impl Into<Object>) -> Result<()> {
        let mut writer = self.create_writer(filters)?;
        writer.write_all(data)?;
        writer.finish()
    }

    /// The whole raw body.
    pub fn to_raw_bytes(&self) -> Result<Vec<u8>> {
        self.create_raw_reader()?.read_all()
    }

    /// The whole decoded body.
    pub fn to_decoded_bytes(&self) -> Result<Vec<u8>> {
        self.create_reader()?.into_bytes()
    }

    /// Release the body's pages. Idempotent.
    ///
    /// A writer still open is cut off: the pages are released anyway and
    /// the first close reports [`Error::ConcurrentWriterConflict`].
    pub fn close(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        if let Some(buffer) = &state.buffer {
            lock(buffer).close();
        }
        if state.writing {
            return Err(Error::ConcurrentWriterConflict(
                "stream closed while a writer was open".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether both handles are the same stream.
    pub fn ptr_eq(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_buffer(&self, state: &mut StreamState) -> Result<SharedBuffer> {
        if let Some(buffer) = &state.buffer {
            return Ok(buffer.clone());
        }
        let buffer: SharedBuffer = Arc::new(Mutex::new(self.inner.scratch.create_buffer()?));
        state.buffer = Some(buffer.clone());
        Ok(buffer)
    }

    fn finish_writing(&self, length: u64) {
        self.set("Length", i64::try_from(length).unwrap_or(i64::MAX));
        lock(&self.inner.state).writing = false;
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

fn check_closed(state: &StreamState) -> Result<()> {
    match &state.buffer {
        _ if state.closed => Err(Error::ClosedResource("stream has been closed".to_string())),
        Some(buffer) if lock(buffer).is_closed() => Err(Error::ClosedResource(
            "stream body has been closed; was its document closed?".to_string(),
        )),
        _ => Ok(()),
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("dictionary", &*lock(&self.inner.dictionary))
            .field("writing", &lock(&self.inner.state).writing)
            .finish()
    }
}

/// Writer replacing a stream's raw body.
///
/// Finishing (explicitly or by dropping) records `/Length` and releases the
/// stream for readers and other writers.
pub struct RawStreamWriter {
    stream: Stream,
    buffer: SharedBuffer,
    finished: bool,
}

impl RawStreamWriter {
    /// Finish writing.
    pub fn finish(mut self) -> Result<()> {
        self.complete()
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        lock(&self.buffer).len()
    }

    /// True if nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn complete(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let length = lock(&self.buffer).len();
        self.stream.finish_writing(length);
        Ok(())
    }
}

impl Write for RawStreamWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(Error::ClosedResource("stream writer already finished".to_string()).into());
        }
        lock(&self.buffer).write(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawStreamWriter {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            log::warn!("Failed to finish stream writer: {}", e);
        }
    }
}

/// Writer taking decoded bytes; encodes them into the stream when finished.
pub struct StreamWriter {
    raw: Option<RawStreamWriter>,
    staging: ScratchBuffer,
    filters: Vec<Arc<dyn Filter>>,
    options: FilterOptions,
}

impl StreamWriter {
    /// Use `options` (compression level, size limits) when encoding.
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Encode what was written and store it as the stream body.
    pub fn finish(mut self) -> Result<()> {
        self.complete()
    }

    fn complete(&mut self) -> Result<()> {
        let Some(mut raw) = self.raw.take() else {
            return Ok(());
        };
        let result = (|| -> Result<()> {
            let data = self.staging.to_vec()?;
            let parameters = raw.stream.dictionary();
            let encoded = pipeline::encode(&self.filters, &parameters, &data, &self.options)?;
            raw.write_all(&encoded)?;
            Ok(())
        })();
        self.staging.close();
        raw.complete()?;
        result
    }
}

impl Write for StreamWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.raw.is_none() {
            return Err(Error::ClosedResource("stream writer already finished".to_string()).into());
        }
        self.staging.write(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        if let Err(e) = self.complete() {
            log::warn!("Failed to encode stream on drop: {}", e);
        }
    }
}
