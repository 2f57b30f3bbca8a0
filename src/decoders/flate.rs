//! FlateDecode (zlib/deflate) implementation.
//!
//! This is the most common PDF compression filter. Decoding goes through
//! flate2 and falls back through a few recovery strategies for the damaged
//! zlib headers found in real files. A predictor from `/DecodeParms` is
//! undone after inflating.

use super::predictor::{decode_predictor, encode_predictor, PredictorParams};
use super::{check_output_limit, decode_params, read_input, DecodeResult, Filter};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::object::Dictionary;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// FlateDecode filter implementation.
pub struct FlateFilter;

impl Filter for FlateFilter {
    fn name(&self) -> &'static str {
        "FlateDecode"
    }

    fn decode(
        &self,
        encoded: &mut dyn Read,
        decoded: &mut dyn Write,
        parameters: &Dictionary,
        index: usize,
        options: &FilterOptions,
    ) -> Result<DecodeResult> {
        let params = decode_params(parameters, index);
        let predictor = PredictorParams::from_dictionary(&params)?;

        let input = read_input(encoded)?;
        let inflated = inflate(&input, options)?;
        let output = if predictor.is_active() {
            decode_predictor(&inflated, &predictor)?
        } else {
            inflated
        };

        decoded.write_all(&output)?;
        Ok(DecodeResult::new(params))
    }

    fn encode(
        &self,
        input: &mut dyn Read,
        encoded: &mut dyn Write,
        parameters: &Dictionary,
        index: usize,
        options: &FilterOptions,
    ) -> Result<()> {
        let params = decode_params(parameters, index);
        let predictor = PredictorParams::from_dictionary(&params)?;

        let mut data = read_input(input)?;
        if predictor.is_active() {
            data = encode_predictor(&data, &predictor)?;
        }

        let mut encoder = ZlibEncoder::new(encoded, options.flate_compression());
        encoder.write_all(&data)?;
        encoder.finish()?;
        Ok(())
    }
}

/// Read a decoder to the end, stopping one byte past the output cap.
fn read_limited(decoder: impl Read, output: &mut Vec<u8>, options: &FilterOptions) -> Result<()> {
    let result = if options.max_decompressed_size > 0 {
        decoder
            .take(options.max_decompressed_size.saturating_add(1))
            .read_to_end(output)
    } else {
        let mut decoder = decoder;
        decoder.read_to_end(output)
    };
    check_output_limit("FlateDecode", output.len(), options)?;
    result.map(|_| ()).map_err(Error::from)
}

/// Inflate `input`, trying progressively more lenient strategies.
fn inflate(input: &[u8], options: &FilterOptions) -> Result<Vec<u8>> {
    let mut output = Vec::new();

    // Strategy 1: standard zlib
    let zlib_err = match read_limited(ZlibDecoder::new(input), &mut output, options) {
        Ok(()) => return Ok(output),
        Err(e @ Error::Decode(_)) => return Err(e),
        Err(e) => e,
    };
    if !output.is_empty() {
        log::warn!(
            "FlateDecode partial recovery: extracted {} bytes before corruption: {}",
            output.len(),
            zlib_err
        );
        return Ok(output);
    }

    // Strategy 2: raw deflate (no zlib wrapper)
    log::info!("Zlib decode failed, trying raw deflate");
    output.clear();
    let deflate_err = match read_limited(DeflateDecoder::new(input), &mut output, options) {
        Ok(()) => {
            log::info!("Raw deflate recovery succeeded: {} bytes", output.len());
            return Ok(output);
        },
        Err(e @ Error::Decode(_)) => return Err(e),
        Err(e) => e,
    };
    if !output.is_empty() {
        log::warn!("Raw deflate partial recovery: extracted {} bytes before error", output.len());
        return Ok(output);
    }

    // Strategy 3: skip a corrupt two-byte zlib header
    if input.len() > 2 {
        log::info!("Trying deflate after skipping potential corrupt zlib header");
        output.clear();
        match read_limited(DeflateDecoder::new(&input[2..]), &mut output, options) {
            Ok(()) if !output.is_empty() => return Ok(output),
            Err(e @ Error::Decode(_)) => return Err(e),
            Err(_) if !output.is_empty() => {
                log::warn!("Deflate with header skip partial recovery: {} bytes", output.len());
                return Ok(output);
            },
            _ => {},
        }
    }

    // Strategy 4: repair the compression method bits of the header
    if input.len() >= 2 && input[0] & 0x0F != 8 {
        let mut corrected = input.to_vec();
        corrected[0] = (input[0] & 0xF0) | 0x08;
        log::info!(
            "Invalid compression method in header byte 0x{:02x}, retrying with 0x{:02x}",
            input[0],
            corrected[0]
        );
        output.clear();
        match read_limited(ZlibDecoder::new(&corrected[..]), &mut output, options) {
            Ok(()) if !output.is_empty() => return Ok(output),
            Err(e @ Error::Decode(_)) => return Err(e),
            Err(_) if !output.is_empty() => return Ok(output),
            _ => {},
        }
    }

    log::error!(
        "All FlateDecode recovery strategies failed. Zlib: {}, Deflate: {}",
        zlib_err,
        deflate_err
    );
    Err(Error::Decode(format!(
        "FlateDecode decompression failed: zlib error: {}, deflate error: {}, compressed size: {} bytes",
        zlib_err,
        deflate_err,
        input.len()
    )))
}
