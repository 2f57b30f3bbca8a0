//! LZWDecode implementation for PDF.
//!
//! PDF's LZW uses MSB-first bit order, 9 to 12 bit codes, a clear code of
//! 256 and an end-of-data code of 257. With `/EarlyChange 1` (the default)
//! the code width grows one code earlier than plain LZW, which is the TIFF
//! variant weezl calls the "size switch".

use super::predictor::{decode_predictor, encode_predictor, PredictorParams};
use super::{check_output_limit, decode_params, read_input, DecodeResult, Filter};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::object::Dictionary;
use std::io::{Read, Write};
use weezl::{decode::Decoder as WeezlDecoder, encode::Encoder as WeezlEncoder, BitOrder};

/// LZWDecode filter implementation.
pub struct LzwFilter;

impl Filter for LzwFilter {
    fn name(&self) -> &'static str {
        "LZWDecode"
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
        let early_change = early_change(&params)?;

        let input = read_input(encoded)?;
        let expanded = decode_lzw(&input, early_change)?;
        check_output_limit("LZWDecode", expanded.len(), options)?;

        let output = if predictor.is_active() {
            decode_predictor(&expanded, &predictor)?
        } else {
            expanded
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
        _options: &FilterOptions,
    ) -> Result<()> {
        let params = decode_params(parameters, index);
        let predictor = PredictorParams::from_dictionary(&params)?;
        let early_change = early_change(&params)?;

        let mut data = read_input(input)?;
        if predictor.is_active() {
            data = encode_predictor(&data, &predictor)?;
        }

        let mut encoder = if early_change {
            WeezlEncoder::with_tiff_size_switch(BitOrder::Msb, 8)
        } else {
            WeezlEncoder::new(BitOrder::Msb, 8)
        };
        let output = encoder
            .encode(&data)
            .map_err(|e| Error::Decode(format!("LZW encoding failed: {:?}", e)))?;
        encoded.write_all(&output)?;
        Ok(())
    }
}

fn early_change(params: &Dictionary) -> Result<bool> {
    match params.get_int("EarlyChange", 1) {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::MalformedFilterParameters(format!(
            "EarlyChange must be 0 or 1, got {}",
            other
        ))),
    }
}

fn decode_lzw(input: &[u8], early_change: bool) -> Result<Vec<u8>> {
    let mut decoder = if early_change {
        WeezlDecoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        WeezlDecoder::new(BitOrder::Msb, 8)
    };

    let mut output = Vec::new();
    let result = decoder.into_vec(&mut output).decode_all(input);
    match result.status {
        Ok(_) => Ok(output),
        // data cut off before the end-of-data code is common; keep what decoded
        Err(e) if !output.is_empty() => {
            log::warn!(
                "LZWDecode stopped after {} bytes ({:?}), keeping partial output",
                output.len(),
                e
            );
            Ok(output)
        },
        Err(e) => Err(Error::Decode(format!("LZWDecode error: {:?}", e))),
    }
}
