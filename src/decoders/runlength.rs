//! RunLengthDecode implementation.
//!
//! Decodes run-length encoded data according to PDF specification:
//! - Length byte 0-127: Copy next N+1 bytes literally
//! - Length byte 128: EOD marker
//! - Length byte 129-255: Repeat next byte 257-N times

use super::{check_output_limit, read_input, DecodeResult, Filter};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::object::Dictionary;
use std::io::{Read, Write};

const EOD: u8 = 128;

/// Longest literal or repeat run.
const MAX_RUN: usize = 128;

/// RunLengthDecode filter implementation.
pub struct RunLengthFilter;

impl Filter for RunLengthFilter {
    fn name(&self) -> &'static str {
        "RunLengthDecode"
    }

    fn decode(
        &self,
        encoded: &mut dyn Read,
        decoded: &mut dyn Write,
        _parameters: &Dictionary,
        _index: usize,
        options: &FilterOptions,
    ) -> Result<DecodeResult> {
        let input = read_input(encoded)?;
        let output = decode_runs(&input, options)?;
        decoded.write_all(&output)?;
        Ok(DecodeResult::default())
    }

    fn encode(
        &self,
        input: &mut dyn Read,
        encoded: &mut dyn Write,
        _parameters: &Dictionary,
        _index: usize,
        _options: &FilterOptions,
    ) -> Result<()> {
        let data = read_input(input)?;
        encoded.write_all(&encode_runs(&data))?;
        Ok(())
    }
}

fn decode_runs(input: &[u8], options: &FilterOptions) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 2);
    let mut i = 0;

    while i < input.len() {
        let length = input[i];
        i += 1;

        match length {
            0..=127 => {
                let count = length as usize + 1;
                if i + count > input.len() {
                    return Err(Error::Decode(format!(
                        "RunLengthDecode: not enough data for literal run (need {}, have {})",
                        count,
                        input.len() - i
                    )));
                }
                output.extend_from_slice(&input[i..i + count]);
                i += count;
            },
            EOD => break,
            129..=255 => {
                let count = 257 - length as usize;
                let byte = *input.get(i).ok_or_else(|| {
                    Error::Decode("RunLengthDecode: missing byte for run".to_string())
                })?;
                i += 1;
                output.resize(output.len() + count, byte);
            },
        }
        check_output_limit("RunLengthDecode", output.len(), options)?;
    }

    Ok(output)
}

fn encode_runs(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
    let mut literal_start = 0;
    let mut i = 0;

    let flush_literal = |output: &mut Vec<u8>, literal: &[u8]| {
        for chunk in literal.chunks(MAX_RUN) {
            output.push((chunk.len() - 1) as u8);
            output.extend_from_slice(chunk);
        }
    };

    while i < data.len() {
        let byte = data[i];
        let mut run = 1;
        while i + run < data.len() && data[i + run] == byte && run < MAX_RUN {
            run += 1;
        }

        if run >= 2 {
            flush_literal(&mut output, &data[literal_start..i]);
            output.push((257 - run) as u8);
            output.push(byte);
            i += run;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    flush_literal(&mut output, &data[literal_start..]);
    output.push(EOD);
    output
}
