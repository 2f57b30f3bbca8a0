//! Positioned readers over shared scratch buffers.

use crate::error::Result;
use crate::io::lock;
use crate::io::scratch_buffer::{resolve_seek, ScratchBuffer};
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

/// A scratch buffer shared between a stream and its open readers.
pub type SharedBuffer = Arc<Mutex<ScratchBuffer>>;

/// Reader with its own position over a (possibly shared) [`ScratchBuffer`].
///
/// Several readers may be open on the same buffer; each restores its own
/// position before touching the buffer. If the buffer is closed underneath a
/// reader (its stream got rewritten or its document closed), the next read
/// fails with [`Error::ClosedResource`](crate::Error::ClosedResource).
pub struct BufferReader {
    buffer: SharedBuffer,
    position: u64,
    /// Close the buffer when this reader goes away
    owns_buffer: bool,
}

impl BufferReader {
    /// Reader over a buffer shared with others; dropping it leaves the buffer open.
    pub fn shared(buffer: SharedBuffer) -> Self {
        Self {
            buffer,
            position: 0,
            owns_buffer: false,
        }
    }

    /// Reader that takes ownership of `buffer` and closes it on drop.
    pub fn owned(buffer: ScratchBuffer) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            position: 0,
            owns_buffer: true,
        }
    }

    /// Bytes left between this reader's position and the end of the buffer.
    pub fn remaining(&self) -> Result<u64> {
        let buffer = lock(&self.buffer);
        buffer.is_eof()?;
        Ok(buffer.len().saturating_sub(self.position))
    }

    /// This reader's position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read everything from the current position to the end.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out)?;
        Ok(out)
    }
}

impl Read for BufferReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut buffer = lock(&self.buffer);
        if buffer.len() <= self.position && !buffer.is_closed() {
            return Ok(0);
        }
        buffer.seek(self.position)?;
        let n = buffer.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for BufferReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = lock(&self.buffer).len();
        let target = resolve_seek(pos, self.position, len)?;
        if target > len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to {} beyond length {}", target, len),
            ));
        }
        self.position = target;
        Ok(target)
    }
}

impl Drop for BufferReader {
    fn drop(&mut self) {
        if self.owns_buffer {
            lock(&self.buffer).close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_independent_positions() {
        let shared: SharedBuffer =
            Arc::new(Mutex::new(ScratchBuffer::from_bytes(b"abcdef").unwrap()));
        let mut first = BufferReader::shared(shared.clone());
        let mut second = BufferReader::shared(shared);

        let mut two = [0u8; 2];
        first.read_exact(&mut two).unwrap();
        assert_eq!(&two, b"ab");
        second.read_exact(&mut two).unwrap();
        assert_eq!(&two, b"ab");
        first.read_exact(&mut two).unwrap();
        assert_eq!(&two, b"cd");
        assert_eq!(first.remaining().unwrap(), 2);
    }

    #[test]
    fn test_closed_underneath_reader() {
        let shared: SharedBuffer =
            Arc::new(Mutex::new(ScratchBuffer::from_bytes(b"abcdef").unwrap()));
        let mut reader = BufferReader::shared(shared.clone());
        lock(&shared).close();

        let mut out = [0u8; 3];
        let err = Error::from(reader.read(&mut out).unwrap_err());
        assert!(matches!(err, Error::ClosedResource(_)));
    }

    #[test]
    fn test_owned_reader_releases_pages() {
        let scratch = crate::io::ScratchFile::main_memory_only();
        let mut buffer = scratch.create_buffer().unwrap();
        buffer.write(b"owned").unwrap();
        {
            let mut reader = BufferReader::owned(buffer);
            assert_eq!(reader.read_all().unwrap(), b"owned");
        }
        assert_eq!(scratch.pages_in_use(), 0);
    }
}
