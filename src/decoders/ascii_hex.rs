//! ASCIIHexDecode implementation.
//!
//! Decodes hexadecimal-encoded data (e.g., "48656C6C6F" -> "Hello").
//! Whitespace is ignored, `>` ends the data, and a dangling final digit is
//! padded with an implicit '0'.

use super::{read_input, DecodeResult, Filter};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::object::Dictionary;
use std::io::{Read, Write};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encoded bytes per output line.
const LINE_LENGTH: usize = 64;

/// ASCIIHexDecode filter implementation.
pub struct AsciiHexFilter;

impl Filter for AsciiHexFilter {
    fn name(&self) -> &'static str {
        "ASCIIHexDecode"
    }

    fn decode(
        &self,
        encoded: &mut dyn Read,
        decoded: &mut dyn Write,
        _parameters: &Dictionary,
        _index: usize,
        _options: &FilterOptions,
    ) -> Result<DecodeResult> {
        let input = read_input(encoded)?;
        decoded.write_all(&decode_hex(&input)?)?;
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
        let mut output = Vec::with_capacity(data.len() * 2 + data.len() / LINE_LENGTH + 1);
        for (i, byte) in data.iter().enumerate() {
            if i > 0 && i % LINE_LENGTH == 0 {
                output.push(b'\n');
            }
            output.push(HEX_DIGITS[(byte >> 4) as usize]);
            output.push(HEX_DIGITS[(byte & 0x0F) as usize]);
        }
        output.push(b'>');
        encoded.write_all(&output)?;
        Ok(())
    }
}

fn decode_hex(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() / 2);
    let mut high: Option<u8> = None;

    for &c in input {
        if c == b'>' {
            break;
        }
        if is_pdf_whitespace(c) {
            continue;
        }
        let nibble = hex_digit_to_value(c).ok_or_else(|| {
            Error::Decode(format!("ASCIIHexDecode: invalid hex digit '{}'", c as char))
        })?;
        match high.take() {
            Some(h) => output.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    if let Some(h) = high {
        output.push(h << 4);
    }
    Ok(output)
}

fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Convert a hexadecimal ASCII character to its numeric value.
fn hex_digit_to_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}
