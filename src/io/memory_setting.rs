//! Buffering policy for stream data.
//!
//! A [`MemoryUsageSetting`] decides whether scratch pages live in main
//! memory, in a temporary file, or in memory first and on disk after that,
//! and how many bytes each of those may hold.

use std::fmt;
use std::path::{Path, PathBuf};

/// Controls how main memory and temporary files are used for buffering.
///
/// Values of `-1` mean "unrestricted". The constructors reconcile the limits
/// so the resulting setting is always consistent:
///
/// - a storage cap of 0 or less is treated as unrestricted
/// - a memory cap below `-1` becomes `-1`
/// - a memory cap of `0` in memory-only mode inherits the storage cap
/// - in memory mode a storage cap smaller than the memory cap (or any cap
///   while memory is unrestricted) is raised to the memory cap
///
/// # Example
///
/// ```
/// use pdf_cos::io::MemoryUsageSetting;
///
/// let setting = MemoryUsageSetting::main_memory_only_with_limit(64 * 1024);
/// assert!(setting.is_main_memory_restricted());
/// assert_eq!(setting.max_storage_bytes(), 64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUsageSetting {
    use_main_memory: bool,
    use_temp_file: bool,
    /// Maximum main-memory bytes, `-1` for unrestricted
    max_main_memory_bytes: i64,
    /// Maximum bytes of memory and temp file together, `-1` for unrestricted
    max_storage_bytes: i64,
    temp_dir: Option<PathBuf>,
}

impl MemoryUsageSetting {
    fn new(
        use_main_memory: bool,
        use_temp_file: bool,
        max_main_memory_bytes: i64,
        max_storage_bytes: i64,
    ) -> Self {
        let mut use_memory = !use_temp_file || use_main_memory;
        let mut max_memory = if use_main_memory {
            max_main_memory_bytes
        } else {
            -1
        };
        let mut max_storage = if max_storage_bytes > 0 {
            max_storage_bytes
        } else {
            -1
        };

        if max_memory < -1 {
            max_memory = -1;
        }

        if use_memory && max_memory == 0 {
            if use_temp_file {
                use_memory = false;
            } else {
                max_memory = max_storage;
            }
        }

        if use_memory && max_storage > -1 && (max_memory == -1 || max_memory > max_storage) {
            max_storage = max_memory;
        }

        Self {
            use_main_memory: use_memory,
            use_temp_file,
            max_main_memory_bytes: max_memory,
            max_storage_bytes: max_storage,
            temp_dir: None,
        }
    }

    /// Main memory only, no size restriction.
    pub fn main_memory_only() -> Self {
        Self::main_memory_only_with_limit(-1)
    }

    /// Main memory only with the given maximum.
    ///
    /// `-1` and `0` both mean no restriction.
    pub fn main_memory_only_with_limit(max_main_memory_bytes: i64) -> Self {
        Self::new(true, false, max_main_memory_bytes, max_main_memory_bytes)
    }

    /// Temporary file only, no size restriction.
    pub fn temp_file_only() -> Self {
        Self::temp_file_only_with_limit(-1)
    }

    /// Temporary file only with the given maximum file size.
    pub fn temp_file_only_with_limit(max_storage_bytes: i64) -> Self {
        Self::new(false, true, 0, max_storage_bytes)
    }

    /// Main memory up to `max_main_memory_bytes`, then spill to a temporary file.
    pub fn mixed(max_main_memory_bytes: i64) -> Self {
        Self::mixed_with_limit(max_main_memory_bytes, -1)
    }

    /// Main memory first, temporary file after, both capped by `max_storage_bytes`.
    pub fn mixed_with_limit(max_main_memory_bytes: i64, max_storage_bytes: i64) -> Self {
        Self::new(true, true, max_main_memory_bytes, max_storage_bytes)
    }

    /// Set the directory used for temporary files.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Whether main memory is used for pages.
    pub fn use_main_memory(&self) -> bool {
        self.use_main_memory
    }

    /// Whether a temporary file is used for pages.
    pub fn use_temp_file(&self) -> bool {
        self.use_temp_file
    }

    /// Whether main memory is limited to a number of bytes.
    pub fn is_main_memory_restricted(&self) -> bool {
        self.max_main_memory_bytes >= 0
    }

    /// Whether memory and temp file together are limited to a number of bytes.
    pub fn is_storage_restricted(&self) -> bool {
        self.max_storage_bytes > 0
    }

    /// Maximum main-memory bytes, `-1` when unrestricted.
    pub fn max_main_memory_bytes(&self) -> i64 {
        self.max_main_memory_bytes
    }

    /// Maximum storage bytes, `-1` when unrestricted.
    pub fn max_storage_bytes(&self) -> i64 {
        self.max_storage_bytes
    }

    /// Directory for temporary files, if one was set.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}

impl Default for MemoryUsageSetting {
    fn default() -> Self {
        Self::main_memory_only()
    }
}

impl fmt::Display for MemoryUsageSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.use_main_memory {
            if self.use_temp_file {
                write!(
                    f,
                    "Mixed mode with max. of {} main memory bytes{}",
                    self.max_main_memory_bytes,
                    if self.is_storage_restricted() {
                        format!(" and max. of {} storage bytes", self.max_storage_bytes)
                    } else {
                        " and unrestricted scratch file size".to_string()
                    }
                )
            } else if self.is_main_memory_restricted() {
                write!(f, "Main memory only with max. of {} bytes", self.max_main_memory_bytes)
            } else {
                write!(f, "Main memory only with no size restriction")
            }
        } else if self.is_storage_restricted() {
            write!(f, "Scratch file only with max. of {} bytes", self.max_storage_bytes)
        } else {
            write!(f, "Scratch file only with no size restriction")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_memory_unrestricted() {
        let s = MemoryUsageSetting::main_memory_only();
        assert!(s.use_main_memory());
        assert!(!s.use_temp_file());
        assert!(!s.is_main_memory_restricted());
        assert!(!s.is_storage_restricted());
    }

    #[test]
    fn test_main_memory_zero_means_unrestricted() {
        let s = MemoryUsageSetting::main_memory_only_with_limit(0);
        assert_eq!(s.max_main_memory_bytes(), -1);
        assert_eq!(s.max_storage_bytes(), -1);
    }

    #[test]
    fn test_memory_cap_inherits_storage_cap() {
        // memory requested without explicit cap while a combined cap exists
        let s = MemoryUsageSetting::new(true, false, 0, 8192);
        assert_eq!(s.max_main_memory_bytes(), 8192);
        assert_eq!(s.max_storage_bytes(), 8192);
    }

    #[test]
    fn test_storage_cap_raised_to_memory_cap() {
        let s = MemoryUsageSetting::mixed_with_limit(16384, 4096);
        assert_eq!(s.max_main_memory_bytes(), 16384);
        assert_eq!(s.max_storage_bytes(), 16384);
    }

    #[test]
    fn test_storage_cap_follows_unrestricted_memory() {
        let s = MemoryUsageSetting::mixed_with_limit(-1, 4096);
        assert_eq!(s.max_storage_bytes(), -1);
    }

    #[test]
    fn test_negative_memory_cap_normalized() {
        let s = MemoryUsageSetting::main_memory_only_with_limit(-42);
        assert_eq!(s.max_main_memory_bytes(), -1);
    }

    #[test]
    fn test_mixed_zero_memory_turns_into_file_only() {
        let s = MemoryUsageSetting::mixed(0);
        assert!(!s.use_main_memory());
        assert!(s.use_temp_file());
    }

    #[test]
    fn test_temp_file_only() {
        let s = MemoryUsageSetting::temp_file_only_with_limit(1 << 20);
        assert!(!s.use_main_memory());
        assert!(s.use_temp_file());
        assert_eq!(s.max_main_memory_bytes(), -1);
        assert_eq!(s.max_storage_bytes(), 1 << 20);
    }

    #[test]
    fn test_display() {
        let s = MemoryUsageSetting::main_memory_only_with_limit(100);
        assert_eq!(s.to_string(), "Main memory only with max. of 100 bytes");
        let s = MemoryUsageSetting::temp_file_only();
        assert_eq!(s.to_string(), "Scratch file only with no size restriction");
    }

    #[test]
    fn test_temp_dir() {
        let s = MemoryUsageSetting::temp_file_only().with_temp_dir("/tmp/cos");
        assert_eq!(s.temp_dir(), Some(Path::new("/tmp/cos")));
    }
}
