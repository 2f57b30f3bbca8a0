//! Error types for the object store and its I/O layer.
//!
//! Structural mismatches inside the object graph never surface here: typed
//! dictionary accessors fall back to defaults instead. Everything that touches
//! a buffer, a page store or a codec reports through [`Error`].

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while buffering, decoding or tearing down.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer provider cannot honor its memory or storage cap
    #[error("Capacity exceeded: requested {requested} bytes, limit is {limit} bytes")]
    CapacityExceeded {
        /// Bytes the allocation would have brought the store to
        requested: u64,
        /// Configured cap in bytes
        limit: u64,
    },

    /// Read or write attempted after the backing store was released
    #[error("Resource closed: {0}")]
    ClosedResource(String),

    /// A second raw writer, or a reader while a writer is open
    #[error("Concurrent writer conflict: {0}")]
    ConcurrentWriterConflict(String),

    /// Unknown codec name or duplicate codec in a filter list
    #[error("Invalid filter chain: {0}")]
    InvalidFilterChain(String),

    /// Decode parameters a codec cannot proceed with
    #[error("Malformed filter parameters: {0}")]
    MalformedFilterParameters(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    /// Errors raised by this crate travel through `std::io` adapters wrapped in
    /// an `io::Error`; unwrap them so callers still see the original kind.
    fn from(err: std::io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(own) = inner.downcast::<Error>() {
                    return *own;
                }
            }
            return Error::Decode("unrecoverable wrapped error".to_string());
        }
        Error::Io(err)
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io) => io,
            other => std::io::Error::other(other),
        }
    }
}
