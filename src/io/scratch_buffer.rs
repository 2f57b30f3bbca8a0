//! Random-access buffer over scratch pages.

use crate::error::{Error, Result};
use crate::io::scratch_file::{ScratchFile, PAGE_SIZE};
use std::io::{self, SeekFrom};

/// A seekable, readable and writable byte container.
///
/// The bytes live in pages obtained from a [`ScratchFile`]; pages are taken
/// as the buffer grows and given back on [`clear`](Self::clear),
/// [`truncate`](Self::truncate), [`close`](Self::close) or drop.
///
/// Once closed (or once its scratch file is closed) every read and write
/// fails with [`Error::ClosedResource`] instead of returning stale data.
pub struct ScratchBuffer {
    scratch: ScratchFile,
    pages: Vec<usize>,
    size: u64,
    position: u64,
    closed: bool,
}

impl std::fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("pages", &self.pages.len())
            .field("size", &self.size)
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ScratchBuffer {
    pub(crate) fn new(scratch: ScratchFile) -> Self {
        Self {
            scratch,
            pages: Vec::new(),
            size: 0,
            position: 0,
            closed: false,
        }
    }

    /// In-memory buffer with its own unrestricted page store.
    pub fn in_memory() -> Self {
        Self::new(ScratchFile::main_memory_only())
    }

    /// In-memory buffer holding a copy of `data`, positioned at the start.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut buffer = Self::in_memory();
        buffer.write(data)?;
        buffer.seek(0)?;
        Ok(buffer)
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedResource("scratch buffer already closed".to_string()));
        }
        if self.scratch.is_closed() {
            return Err(Error::ClosedResource(
                "scratch buffer's page store has been closed".to_string(),
            ));
        }
        Ok(())
    }

    /// Current length in bytes.
    pub fn len(&self) -> u64 {
        self.size
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current read/write position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the position is at the end of the data.
    pub fn is_eof(&self) -> Result<bool> {
        self.check_closed()?;
        Ok(self.position >= self.size)
    }

    /// Whether this buffer (or its page store) has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed || self.scratch.is_closed()
    }

    /// Move to an absolute position.
    ///
    /// Seeking past the end is an error; a buffer never has holes.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.check_closed()?;
        if position > self.size {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to {} beyond buffer length {}", position, self.size),
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Move the position back by `bytes`.
    pub fn rewind(&mut self, bytes: u64) -> Result<()> {
        let target = self.position.checked_sub(bytes).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot rewind {} bytes from position {}", bytes, self.position),
            ))
        })?;
        self.seek(target)
    }

    /// Read into `out`, returning the number of bytes read (0 at end).
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        self.check_closed()?;
        let available = self.size.saturating_sub(self.position);
        let total = (out.len() as u64).min(available) as usize;

        let mut done = 0;
        while done < total {
            let page_index = (self.position / PAGE_SIZE as u64) as usize;
            let offset = (self.position % PAGE_SIZE as u64) as usize;
            let n = (PAGE_SIZE - offset).min(total - done);
            self.scratch
                .read_page(self.pages[page_index], offset, &mut out[done..done + n])?;
            done += n;
            self.position += n as u64;
        }
        Ok(total)
    }

    /// Read exactly `length` bytes.
    pub fn read_fully(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; length];
        let n = self.read(&mut out)?;
        if n < length {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("premature end of buffer: wanted {} bytes, got {}", length, n),
            )));
        }
        Ok(out)
    }

    /// Read the next byte without advancing.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => {
                self.position -= 1;
                Ok(Some(byte[0]))
            },
        }
    }

    /// Write `data` at the current position, growing the buffer as needed.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.check_closed()?;
        let mut done = 0;
        while done < data.len() {
            let page_index = (self.position / PAGE_SIZE as u64) as usize;
            let offset = (self.position % PAGE_SIZE as u64) as usize;
            if page_index == self.pages.len() {
                let page = self.scratch.allocate_page()?;
                self.pages.push(page);
            }
            let n = (PAGE_SIZE - offset).min(data.len() - done);
            self.scratch
                .write_page(self.pages[page_index], offset, &data[done..done + n])?;
            done += n;
            self.position += n as u64;
            self.size = self.size.max(self.position);
        }
        Ok(())
    }

    /// Write a single byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    /// Drop all content and give every page back.
    pub fn clear(&mut self) -> Result<()> {
        self.check_closed()?;
        self.scratch.release_pages(&self.pages);
        self.pages.clear();
        self.size = 0;
        self.position = 0;
        Ok(())
    }

    /// Shorten the buffer to `length` bytes; no-op if already shorter.
    pub fn truncate(&mut self, length: u64) -> Result<()> {
        self.check_closed()?;
        if length >= self.size {
            return Ok(());
        }
        let keep = length.div_ceil(PAGE_SIZE as u64) as usize;
        let released: Vec<usize> = self.pages.drain(keep..).collect();
        self.scratch.release_pages(&released);
        self.size = length;
        self.position = self.position.min(length);
        Ok(())
    }

    /// Copy the whole content out, leaving the position unchanged.
    pub fn to_vec(&mut self) -> Result<Vec<u8>> {
        let saved = self.position;
        self.seek(0)?;
        let content = self.read_fully(self.size as usize);
        self.position = saved;
        content
    }

    /// Release the pages and mark the buffer closed. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.scratch.release_pages(&self.pages);
        self.pages.clear();
        self.size = 0;
        self.position = 0;
        self.closed = true;
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

impl io::Read for ScratchBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ScratchBuffer::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Write for ScratchBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ScratchBuffer::write(self, buf).map_err(io::Error::from)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for ScratchBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = resolve_seek(pos, self.position, self.size)?;
        ScratchBuffer::seek(self, target).map_err(io::Error::from)?;
        Ok(target)
    }
}

/// Turn a `SeekFrom` into an absolute offset.
pub(crate) fn resolve_seek(pos: SeekFrom, current: u64, len: u64) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
        SeekFrom::End(delta) => len.checked_add_signed(delta),
    };
    target.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryUsageSetting;

    #[test]
    fn test_write_read_across_pages() {
        let mut buffer = ScratchBuffer::in_memory();
        let data: Vec<u8> = (0..3 * PAGE_SIZE + 17).map(|i| (i % 251) as u8).collect();
        buffer.write(&data).unwrap();
        assert_eq!(buffer.len(), data.len() as u64);
        assert_eq!(buffer.position(), data.len() as u64);

        buffer.seek(0).unwrap();
        assert_eq!(buffer.read_fully(data.len()).unwrap(), data);
        assert!(buffer.is_eof().unwrap());
    }

    #[test]
    fn test_overwrite_in_middle() {
        let mut buffer = ScratchBuffer::from_bytes(b"Hello, World!").unwrap();
        buffer.seek(7).unwrap();
        buffer.write(b"Pages").unwrap();
        assert_eq!(buffer.to_vec().unwrap(), b"Hello, Pages!");
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn test_peek_and_rewind() {
        let mut buffer = ScratchBuffer::from_bytes(b"abc").unwrap();
        assert_eq!(buffer.peek().unwrap(), Some(b'a'));
        assert_eq!(buffer.position(), 0);
        buffer.read_fully(2).unwrap();
        buffer.rewind(1).unwrap();
        assert_eq!(buffer.read_fully(2).unwrap(), b"bc");
        assert_eq!(buffer.peek().unwrap(), None);
    }

    #[test]
    fn test_seek_beyond_end_rejected() {
        let mut buffer = ScratchBuffer::from_bytes(b"abc").unwrap();
        assert!(buffer.seek(4).is_err());
    }

    #[test]
    fn test_truncate_releases_pages() {
        let scratch = ScratchFile::main_memory_only();
        let mut buffer = scratch.create_buffer().unwrap();
        buffer.write(&vec![7u8; 3 * PAGE_SIZE]).unwrap();
        assert_eq!(scratch.pages_in_use(), 3);

        buffer.truncate(PAGE_SIZE as u64 + 1).unwrap();
        assert_eq!(scratch.pages_in_use(), 2);
        assert_eq!(buffer.len(), PAGE_SIZE as u64 + 1);
        assert_eq!(buffer.position(), PAGE_SIZE as u64 + 1);

        buffer.clear().unwrap();
        assert_eq!(scratch.pages_in_use(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_closed_buffer_fails_explicitly() {
        let mut buffer = ScratchBuffer::from_bytes(b"data").unwrap();
        buffer.close();
        buffer.close();
        let mut out = [0u8; 4];
        assert!(matches!(buffer.read(&mut out), Err(Error::ClosedResource(_))));
        assert!(matches!(buffer.write(b"x"), Err(Error::ClosedResource(_))));
        assert!(matches!(buffer.seek(0), Err(Error::ClosedResource(_))));
    }

    #[test]
    fn test_closing_store_invalidates_buffer() {
        let scratch = ScratchFile::main_memory_only();
        let mut buffer = scratch.create_buffer().unwrap();
        buffer.write(b"payload").unwrap();
        scratch.close().unwrap();
        assert!(buffer.is_closed());
        assert!(matches!(buffer.to_vec(), Err(Error::ClosedResource(_))));
    }

    #[test]
    fn test_capacity_exceeded_not_truncated() {
        let setting = MemoryUsageSetting::main_memory_only_with_limit(PAGE_SIZE as i64);
        let scratch = ScratchFile::new(setting).unwrap();
        let mut buffer = scratch.create_buffer().unwrap();
        let result = buffer.write(&vec![1u8; PAGE_SIZE + 1]);
        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
    }

    #[test]
    fn test_drop_returns_pages() {
        let scratch = ScratchFile::main_memory_only();
        {
            let mut buffer = scratch.create_buffer().unwrap();
            buffer.write(&[0u8; 10]).unwrap();
            assert_eq!(scratch.pages_in_use(), 1);
        }
        assert_eq!(scratch.pages_in_use(), 0);
    }

    #[test]
    fn test_std_io_traits() {
        use std::io::{Read, Seek, Write};
        let mut buffer = ScratchBuffer::in_memory();
        buffer.write_all(b"0123456789").unwrap();
        Seek::seek(&mut buffer, SeekFrom::End(-3)).unwrap();
        let mut tail = String::new();
        buffer.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "789");
    }
}
