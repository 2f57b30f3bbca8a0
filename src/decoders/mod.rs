//! Stream filters.
//!
//! This module provides codecs for the standard PDF compression and encoding
//! filters:
//! - FlateDecode (zlib/deflate) - most common
//! - ASCIIHexDecode - hexadecimal encoding
//! - ASCII85Decode - base85 encoding
//! - LZWDecode - LZW compression
//! - RunLengthDecode - run-length encoding
//!
//! Filters are looked up by name in a [`FilterRegistry`] and chained by the
//! [`pipeline`]; each stage reads the previous stage's output.

use crate::config::FilterOptions;
use crate::error::Result;
use crate::object::{Dictionary, Object};
use std::io::{Read, Write};

mod ascii85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;
mod registry;
mod runlength;

pub mod pipeline;

pub use ascii85::Ascii85Filter;
pub use ascii_hex::AsciiHexFilter;
pub use flate::FlateFilter;
pub use lzw::LzwFilter;
pub use pipeline::DecodedStream;
pub use predictor::{decode_predictor, encode_predictor, PredictorParams};
pub use registry::FilterRegistry;
pub use runlength::RunLengthFilter;

/// Outcome of one decode stage.
///
/// Carries the decode parameters the stage actually used. Filters without
/// parameters report an empty dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeResult {
    parameters: Dictionary,
}

impl DecodeResult {
    /// A result reporting `parameters`.
    pub fn new(parameters: Dictionary) -> Self {
        Self { parameters }
    }

    /// The parameters used by the stage.
    pub fn parameters(&self) -> &Dictionary {
        &self.parameters
    }

    /// Consume the result, returning its parameters.
    pub fn into_parameters(self) -> Dictionary {
        self.parameters
    }
}

/// A stream filter: a named decode/encode pair.
///
/// `parameters` is the whole stream dictionary and `index` the filter's
/// position in the stream's filter list; use [`decode_params`] to pick out
/// the stage's own parameter dictionary.
pub trait Filter: Send + Sync {
    /// Canonical filter name (e.g., "FlateDecode").
    fn name(&self) -> &'static str;

    /// Decode everything from `encoded` into `decoded`.
    fn decode(
        &self,
        encoded: &mut dyn Read,
        decoded: &mut dyn Write,
        parameters: &Dictionary,
        index: usize,
        options: &FilterOptions,
    ) -> Result<DecodeResult>;

    /// Encode everything from `input` into `encoded`.
    fn encode(
        &self,
        input: &mut dyn Read,
        encoded: &mut dyn Write,
        parameters: &Dictionary,
        index: usize,
        options: &FilterOptions,
    ) -> Result<()>;
}

/// The parameter dictionary for the filter at `index` of a stream.
///
/// A single filter name pairs with a `/DecodeParms` dictionary; a filter
/// array pairs element-wise with a `/DecodeParms` array, where any
/// non-dictionary element (typically `null`) means no parameters. Every
/// other combination yields an empty dictionary.
pub fn decode_params(stream_dictionary: &Dictionary, index: usize) -> Dictionary {
    let filter = stream_dictionary.get_either("F", "Filter");
    let params = stream_dictionary.get_either("DP", "DecodeParms");

    match (filter, params) {
        (Some(Object::Name(_)), Some(Object::Dictionary(dict))) => dict,
        (Some(Object::Array(_)), Some(Object::Array(array))) => {
            array.get_dictionary(index).unwrap_or_default()
        },
        (filter, Some(other))
            if !matches!(filter, Some(Object::Array(_))) && !matches!(other, Object::Array(_)) =>
        {
            log::warn!(
                "Expected DecodeParms to be an Array or Dictionary, found {}",
                other.type_name()
            );
            Dictionary::new()
        },
        _ => Dictionary::new(),
    }
}

/// Read all remaining bytes of a stage's input.
pub(crate) fn read_input(input: &mut dyn Read) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    Ok(data)
}

/// Fail once a stage has produced more than the configured decode cap.
pub(crate) fn check_output_limit(
    filter: &str,
    produced: usize,
    options: &FilterOptions,
) -> Result<()> {
    if options.exceeds_output_limit(produced as u64) {
        return Err(crate::error::Error::Decode(format!(
            "Decompression bomb detected: {} output exceeds limit of {} bytes",
            filter, options.max_decompressed_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Array;

    fn predictor_dict(predictor: i64) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set_int("Predictor", predictor);
        dict
    }

    #[test]
    fn test_single_filter_with_dictionary() {
        let mut stream = Dictionary::new();
        stream.set_name("Filter", "FlateDecode");
        stream.set("DecodeParms", predictor_dict(12));
        assert_eq!(decode_params(&stream, 0).get_int("Predictor", -1), 12);
    }

    #[test]
    fn test_filter_array_picks_by_index() {
        let mut stream = Dictionary::new();
        stream.set(
            "Filter",
            Array::from(vec![Object::name("ASCIIHexDecode"), Object::name("FlateDecode")]),
        );
        stream.set(
            "DecodeParms",
            Array::from(vec![Object::Null, Object::from(predictor_dict(12))]),
        );
        assert!(decode_params(&stream, 0).is_empty());
        assert_eq!(decode_params(&stream, 1).get_int("Predictor", -1), 12);
        assert!(decode_params(&stream, 7).is_empty());
    }

    #[test]
    fn test_abbreviated_keys() {
        let mut stream = Dictionary::new();
        stream.set_name("F", "Fl");
        stream.set("DP", predictor_dict(2));
        assert_eq!(decode_params(&stream, 0).get_int("Predictor", -1), 2);
    }

    #[test]
    fn test_mismatched_shapes_yield_empty() {
        let mut stream = Dictionary::new();
        stream.set_name("Filter", "FlateDecode");
        stream.set("DecodeParms", Array::from(vec![Object::from(predictor_dict(12))]));
        assert!(decode_params(&stream, 0).is_empty());

        stream.set("DecodeParms", 5);
        assert!(decode_params(&stream, 0).is_empty());
    }
}
