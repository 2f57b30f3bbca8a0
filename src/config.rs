//! Filter configuration options.
//!
//! These control how codecs compress and how much output a decode may
//! produce. Buffer placement is configured separately through
//! [`MemoryUsageSetting`](crate::io::MemoryUsageSetting).
//!
//! # Example
//!
//! ```
//! use pdf_cos::config::FilterOptions;
//!
//! // Library defaults (honors PDF_COS_DEFLATE_LEVEL if set)
//! let defaults = FilterOptions::default();
//!
//! // Explicit configuration
//! let custom = FilterOptions {
//!     compression_level: 9,
//!     max_decompressed_size: 16 * 1024 * 1024,
//! };
//! assert_eq!(custom.clamped_compression_level(), 9);
//! ```

/// Environment variable read for the default deflate level.
pub const DEFLATE_LEVEL_ENV: &str = "PDF_COS_DEFLATE_LEVEL";

/// Library default compression level, zlib's own default.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = -1;

/// Strongest deflate level.
pub const BEST_COMPRESSION: i32 = 9;

/// Default cap on decoded stream size: 512 MB.
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: u64 = 512 * 1024 * 1024;

/// Options shared by every codec in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Deflate level used when encoding FlateDecode streams
    ///
    /// `-1` selects zlib's default, `0..=9` select an explicit level.
    /// Out-of-range values are clamped when used.
    pub compression_level: i32,

    /// Maximum number of bytes a single filter stage may produce
    ///
    /// Protects against decompression bombs. Set to 0 to disable the check.
    pub max_decompressed_size: u64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            compression_level: compression_level_from_env(),
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
        }
    }
}

impl FilterOptions {
    /// Options that never limit decoded output.
    pub fn unlimited() -> Self {
        Self {
            max_decompressed_size: 0,
            ..Self::default()
        }
    }

    /// Compression level clamped to the range deflate accepts.
    pub fn clamped_compression_level(&self) -> i32 {
        self.compression_level.clamp(-1, BEST_COMPRESSION)
    }

    /// `flate2` compression setting for the configured level.
    pub fn flate_compression(&self) -> flate2::Compression {
        match self.clamped_compression_level() {
            -1 => flate2::Compression::default(),
            level => flate2::Compression::new(level as u32),
        }
    }

    /// Whether `produced` bytes exceed the configured decode cap.
    pub(crate) fn exceeds_output_limit(&self, produced: u64) -> bool {
        self.max_decompressed_size > 0 && produced > self.max_decompressed_size
    }
}

/// Read the deflate level from [`DEFLATE_LEVEL_ENV`], falling back to the default.
fn compression_level_from_env() -> i32 {
    match std::env::var(DEFLATE_LEVEL_ENV) {
        Ok(raw) => match raw.trim().parse::<i32>() {
            Ok(level) => level.clamp(-1, BEST_COMPRESSION),
            Err(e) => {
                log::warn!("Ignoring {}={:?}: {}", DEFLATE_LEVEL_ENV, raw, e);
                DEFAULT_COMPRESSION_LEVEL
            },
        },
        Err(_) => DEFAULT_COMPRESSION_LEVEL,
    }
}
