//! Page store backing every scratch buffer.
//!
//! A [`ScratchFile`] hands out fixed-size pages. Depending on its
//! [`MemoryUsageSetting`] a page lives in main memory or in a single anonymous
//! temporary file. Pages are returned when a buffer is cleared or closed and
//! reused lowest-index first.

use crate::error::{Error, Result};
use crate::io::memory_setting::MemoryUsageSetting;
use crate::io::scratch_buffer::ScratchBuffer;
use crate::io::lock;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

/// Size of a single scratch page in bytes.
pub const PAGE_SIZE: usize = 4096;

struct ScratchState {
    setting: MemoryUsageSetting,
    /// Pages with an index below this live in memory
    in_memory_max_pages: usize,
    /// Hard cap on pages of any kind
    max_pages: usize,
    /// Whether pages beyond the memory cap may go to disk
    use_temp_file: bool,
    /// Memory page slots; `None` until first written
    memory_pages: Vec<Option<Box<[u8]>>>,
    /// Number of page indices handed out so far
    page_count: usize,
    free_pages: BTreeSet<usize>,
    file: Option<File>,
    /// Number of pages the temp file has been sized for
    file_page_count: usize,
    closed: bool,
}

impl ScratchState {
    fn limit_bytes(&self) -> u64 {
        let limit = if self.setting.is_storage_restricted() {
            self.setting.max_storage_bytes()
        } else {
            self.setting.max_main_memory_bytes()
        };
        limit.max(0) as u64
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedResource(
                "scratch file has been closed; was its document closed?".to_string(),
            ));
        }
        Ok(())
    }

    fn file_offset(&self, page: usize) -> u64 {
        ((page - self.in_memory_max_pages) * PAGE_SIZE) as u64
    }

    fn ensure_file(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = match self.setting.temp_dir() {
                Some(dir) => tempfile::tempfile_in(dir)?,
                None => tempfile::tempfile()?,
            };
            log::debug!("Created scratch temp file for {}", self.setting);
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(Error::ClosedResource("scratch temp file unavailable".to_string())),
        }
    }
}

/// Shared, cloneable handle to a page store.
///
/// Every [`ScratchBuffer`] created from a scratch file keeps a handle to it.
/// Closing the scratch file invalidates all of them: later reads and writes
/// fail with [`Error::ClosedResource`].
#[derive(Clone)]
pub struct ScratchFile {
    state: Arc<Mutex<ScratchState>>,
}

impl std::fmt::Debug for ScratchFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ScratchFile")
            .field("setting", &state.setting.to_string())
            .field("page_count", &state.page_count)
            .field("free_pages", &state.free_pages.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl ScratchFile {
    /// Create a page store for the given policy.
    ///
    /// # Errors
    ///
    /// Fails if a temp directory is configured but does not exist.
    pub fn new(setting: MemoryUsageSetting) -> Result<Self> {
        if setting.use_temp_file() {
            if let Some(dir) = setting.temp_dir() {
                if !dir.is_dir() {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("scratch file directory does not exist: {}", dir.display()),
                    )));
                }
            }
        }

        let in_memory_max_pages = if !setting.use_main_memory() {
            0
        } else if setting.is_main_memory_restricted() {
            (setting.max_main_memory_bytes() as u64 / PAGE_SIZE as u64) as usize
        } else {
            usize::MAX
        };
        let max_pages = if setting.is_storage_restricted() {
            (setting.max_storage_bytes() as u64 / PAGE_SIZE as u64) as usize
        } else {
            usize::MAX
        };
        let use_temp_file = setting.use_temp_file() && in_memory_max_pages < max_pages;

        log::debug!("Scratch file set up: {}", setting);

        Ok(Self {
            state: Arc::new(Mutex::new(ScratchState {
                setting,
                in_memory_max_pages,
                max_pages,
                use_temp_file,
                memory_pages: Vec::new(),
                page_count: 0,
                free_pages: BTreeSet::new(),
                file: None,
                file_page_count: 0,
                closed: false,
            })),
        })
    }

    /// Unrestricted main-memory page store.
    pub fn main_memory_only() -> Self {
        let setting = MemoryUsageSetting::main_memory_only();
        Self {
            state: Arc::new(Mutex::new(ScratchState {
                setting,
                in_memory_max_pages: usize::MAX,
                max_pages: usize::MAX,
                use_temp_file: false,
                memory_pages: Vec::new(),
                page_count: 0,
                free_pages: BTreeSet::new(),
                file: None,
                file_page_count: 0,
                closed: false,
            })),
        }
    }

    /// Create a new, empty buffer backed by this page store.
    pub fn create_buffer(&self) -> Result<ScratchBuffer> {
        lock(&self.state).ensure_open()?;
        Ok(ScratchBuffer::new(self.clone()))
    }

    /// The policy this store was created with.
    pub fn setting(&self) -> MemoryUsageSetting {
        lock(&self.state).setting.clone()
    }

    /// Pages currently handed out to buffers.
    pub fn pages_in_use(&self) -> usize {
        let state = lock(&self.state);
        state.page_count - state.free_pages.len()
    }

    /// Whether this store shares its pages with `other`.
    pub fn same_store(&self, other: &ScratchFile) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Release every page and delete the temp file.
    ///
    /// Idempotent. Buffers still holding pages become unusable.
    pub fn close(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.memory_pages = Vec::new();
        state.free_pages.clear();
        state.page_count = 0;
        state.file_page_count = 0;
        // the temp file is anonymous; dropping it deletes it
        if let Some(file) = state.file.take() {
            file.set_len(0)?;
        }
        log::debug!("Scratch file closed");
        Ok(())
    }

    /// Hand out a fresh page index.
    pub(crate) fn allocate_page(&self) -> Result<usize> {
        let mut state = lock(&self.state);
        state.ensure_open()?;

        if let Some(page) = state.free_pages.pop_first() {
            return Ok(page);
        }

        let page = state.page_count;
        if page >= state.max_pages || (page >= state.in_memory_max_pages && !state.use_temp_file)
        {
            return Err(Error::CapacityExceeded {
                requested: ((page as u64) + 1) * PAGE_SIZE as u64,
                limit: state.limit_bytes(),
            });
        }

        if page < state.in_memory_max_pages {
            state.memory_pages.push(None);
        } else {
            let needed = page - state.in_memory_max_pages + 1;
            if needed > state.file_page_count {
                // grow in chunks to keep set_len calls rare
                let target = needed.max(state.file_page_count * 2).max(16);
                let file = state.ensure_file()?;
                file.set_len((target * PAGE_SIZE) as u64)?;
                state.file_page_count = target;
            }
        }
        state.page_count += 1;
        Ok(page)
    }

    /// Return pages to the free list.
    ///
    /// Silently ignores pages of a closed store; they are already gone.
    pub(crate) fn release_pages(&self, pages: &[usize]) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }
        for &page in pages {
            if page < state.page_count {
                if let Some(slot) = state.memory_pages.get_mut(page) {
                    *slot = None;
                }
                state.free_pages.insert(page);
            }
        }
    }

    /// Copy bytes of `page` starting at `offset` into `out`.
    pub(crate) fn read_page(&self, page: usize, offset: usize, out: &mut [u8]) -> Result<()> {
        debug_assert!(offset + out.len() <= PAGE_SIZE);
        let mut state = lock(&self.state);
        state.ensure_open()?;

        if page < state.in_memory_max_pages {
            match state.memory_pages.get(page) {
                Some(Some(data)) => out.copy_from_slice(&data[offset..offset + out.len()]),
                Some(None) => out.fill(0),
                None => {
                    return Err(Error::ClosedResource(format!("scratch page {} was released", page)))
                },
            }
            return Ok(());
        }

        let position = state.file_offset(page) + offset as u64;
        let file = state.ensure_file()?;
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(out)?;
        Ok(())
    }

    /// Copy `data` into `page` starting at `offset`.
    pub(crate) fn write_page(&self, page: usize, offset: usize, data: &[u8]) -> Result<()> {
        debug_assert!(offset + data.len() <= PAGE_SIZE);
        let mut state = lock(&self.state);
        state.ensure_open()?;

        if page < state.in_memory_max_pages {
            match state.memory_pages.get_mut(page) {
                Some(slot) => {
                    let buf = slot.get_or_insert_with(|| vec![0u8; PAGE_SIZE].into_boxed_slice());
                    buf[offset..offset + data.len()].copy_from_slice(data);
                },
                None => {
                    return Err(Error::ClosedResource(format!("scratch page {} was released", page)))
                },
            }
            return Ok(());
        }

        let position = state.file_offset(page) + offset as u64;
        let file = state.ensure_file()?;
        file.seek(SeekFrom::Start(position))?;
        file.write_all(data)?;
        Ok(())
    }
}
