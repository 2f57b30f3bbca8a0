//! Chaining filters over a stream body.
//!
//! A stream's `/Filter` entry lists filters in decode order. Decoding runs
//! every stage eagerly: each stage reads the previous stage's output and
//! writes into a fresh scratch buffer (or memory when no scratch file is
//! given), and the returned [`DecodedStream`] reads the last buffer.

use super::{DecodeResult, Filter, FilterRegistry};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::io::{BufferReader, ScratchFile};
use crate::object::{Dictionary, Object};
use std::collections::HashSet;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

/// Decoded view of a stream body.
pub struct DecodedStream {
    reader: Box<dyn Read + Send>,
    result: DecodeResult,
}

impl DecodedStream {
    /// Parameters reported by the last filter stage; empty when the stream
    /// has no filters.
    pub fn decode_result(&self) -> &DecodeResult {
        &self.result
    }

    /// Read the rest of the decoded bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl Read for DecodedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Resolve a `/Filter` value into filter implementations, in decode order.
///
/// A name is a one-element chain and array elements must all be names.
/// Any other value, or none, means no filters.
pub fn resolve_filters(
    registry: &FilterRegistry,
    filter_entry: Option<&Object>,
) -> Result<Vec<Arc<dyn Filter>>> {
    match filter_entry.map(Object::dereference) {
        None | Some(Object::Null) => Ok(Vec::new()),
        Some(Object::Name(name)) => Ok(vec![registry.get(name.as_str())?]),
        Some(Object::Array(array)) => array
            .iter()
            .map(|element| match element.dereference() {
                Object::Name(name) => registry.get(name.as_str()),
                other => Err(Error::InvalidFilterChain(format!(
                    "Forbidden type in filter array: {}",
                    other.type_name()
                ))),
            })
            .collect(),
        Some(other) => {
            log::warn!("Ignoring Filter entry of type {}", other.type_name());
            Ok(Vec::new())
        },
    }
}

fn check_duplicates(filters: &[Arc<dyn Filter>]) -> Result<()> {
    if filters.len() < 2 {
        return Ok(());
    }
    let mut seen = HashSet::with_capacity(filters.len());
    for filter in filters {
        if !seen.insert(filter.name()) {
            return Err(Error::InvalidFilterChain(format!(
                "Duplicate {} in filter chain",
                filter.name()
            )));
        }
    }
    Ok(())
}

/// Decode `input` through `filters`.
///
/// `parameters` is the stream dictionary; each filter picks its own
/// parameters from it by position. Intermediate and final outputs go to
/// buffers from `scratch` when given.
pub fn decode(
    filters: &[Arc<dyn Filter>],
    parameters: &Dictionary,
    input: Box<dyn Read + Send>,
    scratch: Option<&ScratchFile>,
    options: &FilterOptions,
) -> Result<DecodedStream> {
    if filters.is_empty() {
        return Ok(DecodedStream {
            reader: input,
            result: DecodeResult::default(),
        });
    }
    check_duplicates(filters)?;

    let mut input = input;
    let mut result = DecodeResult::default();
    for (index, filter) in filters.iter().enumerate() {
        log::debug!("Decoding stage {} with {}", index, filter.name());
        input = match scratch {
            Some(scratch) => {
                let mut buffer = scratch.create_buffer()?;
                result = filter.decode(&mut input, &mut buffer, parameters, index, options)?;
                Box::new(BufferReader::owned(buffer))
            },
            None => {
                let mut buffer = Vec::new();
                result = filter.decode(&mut input, &mut buffer, parameters, index, options)?;
                Box::new(Cursor::new(buffer))
            },
        };
    }

    Ok(DecodedStream {
        reader: input,
        result,
    })
}

/// Encode `data` through `filters`, applying them in reverse of decode
/// order so that [`decode`] with the same chain restores `data`.
pub fn encode(
    filters: &[Arc<dyn Filter>],
    parameters: &Dictionary,
    data: &[u8],
    options: &FilterOptions,
) -> Result<Vec<u8>> {
    check_duplicates(filters)?;
    let mut current = data.to_vec();
    for (index, filter) in filters.iter().enumerate().rev() {
        let mut encoded = Vec::new();
        filter.encode(&mut &current[..], &mut encoded, parameters, index, options)?;
        current = encoded;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Array;

    fn chain(names: &[&str]) -> Vec<Arc<dyn Filter>> {
        let array: Array = names.iter().map(|n| Object::name(n)).collect();
        resolve_filters(FilterRegistry::global(), Some(&Object::Array(array))).unwrap()
    }

    #[test]
    fn test_no_filters_passes_through() {
        let stream = decode(
            &[],
            &Dictionary::new(),
            Box::new(Cursor::new(b"plain".to_vec())),
            None,
            &FilterOptions::default(),
        )
        .unwrap();
        assert!(stream.decode_result().parameters().is_empty());
        assert_eq!(stream.into_bytes().unwrap(), b"plain");
    }

    #[test]
    fn test_duplicate_detected_through_aliases() {
        let filters = chain(&["Fl", "FlateDecode"]);
        let result = decode(
            &filters,
            &Dictionary::new(),
            Box::new(Cursor::new(Vec::new())),
            None,
            &FilterOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidFilterChain(_))));
    }

    #[test]
    fn test_non_name_in_array_rejected() {
        let array = Array::from(vec![Object::name("FlateDecode"), Object::from(3)]);
        let result = resolve_filters(FilterRegistry::global(), Some(&Object::Array(array)));
        assert!(matches!(result, Err(Error::InvalidFilterChain(_))));
    }

    #[test]
    fn test_other_filter_value_means_no_filters() {
        let filters = resolve_filters(FilterRegistry::global(), Some(&Object::from(5))).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_chain_round_trip_through_scratch() {
        let filters = chain(&["ASCII85Decode", "RunLengthDecode"]);
        let data = b"aaaaaaaaaabbbbbbbbbbcdefg".repeat(20);
        let encoded =
            encode(&filters, &Dictionary::new(), &data, &FilterOptions::default()).unwrap();

        let scratch = ScratchFile::main_memory_only();
        let decoded = decode(
            &filters,
            &Dictionary::new(),
            Box::new(Cursor::new(encoded)),
            Some(&scratch),
            &FilterOptions::default(),
        )
        .unwrap();
        assert_eq!(decoded.into_bytes().unwrap(), data);
        assert_eq!(scratch.pages_in_use(), 0);
    }
}
