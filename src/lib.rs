#![allow(clippy::should_implement_trait)]
#![allow(clippy::new_without_default)]

//! # pdf_cos
//!
//! The object layer of a PDF library: the in-memory object graph, stream
//! buffering, stream filters and the document object store.
//!
//! ## Core Features
//!
//! - **Object model**: names, numbers, strings, arrays, insertion-ordered
//!   dictionaries, streams and shared indirect references
//! - **Scratch buffering**: stream bodies live in pages from a
//!   [`ScratchFile`] kept in memory, in a temp file or both, under a
//!   [`MemoryUsageSetting`]
//! - **Filters**: FlateDecode, LZWDecode, ASCIIHexDecode, ASCII85Decode and
//!   RunLengthDecode, with PNG and TIFF predictors
//! - **Document store**: object pool with forward-reference placeholders,
//!   cross-reference table, trailer and deterministic teardown
//! - **Writing**: full save with a classic cross-reference table
//!
//! ## Quick Start
//!
//! ```
//! use pdf_cos::{CosDocument, Object};
//!
//! # fn main() -> pdf_cos::Result<()> {
//! let mut doc = CosDocument::blank();
//!
//! let content = doc.create_stream();
//! content.set_data(b"BT /F1 12 Tf (Hello) Tj ET", Object::name("FlateDecode"))?;
//! assert_eq!(content.to_decoded_bytes()?, b"BT /F1 12 Tf (Hello) Tj ET");
//! doc.add_object(content);
//!
//! let mut pdf = Vec::new();
//! doc.save(&mut pdf)?;
//! doc.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

/// Filter and buffering configuration
pub mod config;

// Buffering
pub mod io;

// Object graph
pub mod object;

// Stream filters
pub mod decoders;

// Document store
pub mod document;
pub mod xref;

// Output
pub mod writer;

pub use config::FilterOptions;
pub use decoders::{DecodedStream, Filter, FilterRegistry};
pub use document::CosDocument;
pub use error::{Error, Result};
pub use io::{MemoryUsageSetting, ScratchBuffer, ScratchFile};
pub use object::{Array, Dictionary, IndirectRef, Integer, Name, Object, ObjectKey, Stream};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
