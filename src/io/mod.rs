//! Buffer provider and random-access buffers.
//!
//! Stream bytes never touch a `Vec` directly; they go through a
//! [`ScratchBuffer`], whose pages come from a [`ScratchFile`] configured by a
//! [`MemoryUsageSetting`]. This keeps "where do the bytes live" out of every
//! consumer: the same code path serves RAM-only, temp-file-only and mixed
//! policies.

mod memory_setting;
mod reader;
mod scratch_buffer;
mod scratch_file;

pub use memory_setting::MemoryUsageSetting;
pub use reader::{BufferReader, SharedBuffer};
pub use scratch_buffer::ScratchBuffer;
pub use scratch_file::{ScratchFile, PAGE_SIZE};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
