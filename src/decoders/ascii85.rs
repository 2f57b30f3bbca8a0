//! ASCII85Decode (Base85) implementation.
//!
//! Decodes ASCII85/Base85 encoded data. This encoding represents 4 bytes
//! as 5 ASCII characters in the range '!' to 'u'.
//! Special case: 'z' represents 4 zero bytes (00000000).

use super::{read_input, DecodeResult, Filter};
use crate::config::FilterOptions;
use crate::error::{Error, Result};
use crate::object::Dictionary;
use std::io::{Read, Write};

/// Encoded characters per output line.
const LINE_LENGTH: usize = 72;

/// ASCII85Decode filter implementation.
pub struct Ascii85Filter;

impl Filter for Ascii85Filter {
    fn name(&self) -> &'static str {
        "ASCII85Decode"
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
        decoded.write_all(&decode_ascii85(&input)?)?;
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
        encoded.write_all(&encode_ascii85(&data))?;
        Ok(())
    }
}

fn decode_ascii85(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 4 / 5);
    let mut acc: u32 = 0;
    let mut count = 0;

    for &byte in input {
        match byte {
            b'~' => break, // End marker '~>'
            b'z' => {
                if count != 0 {
                    return Err(Error::Decode(
                        "ASCII85Decode: 'z' must not appear in the middle of a group".to_string(),
                    ));
                }
                output.extend_from_slice(&[0, 0, 0, 0]);
            },
            b'!'..=b'u' => {
                acc = acc
                    .checked_mul(85)
                    .and_then(|v| v.checked_add((byte - b'!') as u32))
                    .ok_or_else(|| Error::Decode("ASCII85Decode: overflow in decoding".to_string()))?;
                count += 1;

                if count == 5 {
                    output.extend_from_slice(&acc.to_be_bytes());
                    acc = 0;
                    count = 0;
                }
            },
            _ if byte.is_ascii_whitespace() || byte == 0 => {},
            _ => {
                return Err(Error::Decode(format!(
                    "ASCII85Decode: invalid character '{}'",
                    byte as char
                )));
            },
        }
    }

    // Trailing partial group: pad with 'u' and keep count-1 bytes
    if count > 0 {
        if count == 1 {
            return Err(Error::Decode(
                "ASCII85Decode: incomplete group (need at least 2 characters)".to_string(),
            ));
        }
        for _ in count..5 {
            acc = acc
                .checked_mul(85)
                .and_then(|v| v.checked_add(84))
                .ok_or_else(|| Error::Decode("ASCII85Decode: overflow in padding".to_string()))?;
        }
        output.extend_from_slice(&acc.to_be_bytes()[..count - 1]);
    }

    Ok(output)
}

fn encode_ascii85(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() * 5 / 4 + data.len() / LINE_LENGTH + 4);
    let mut line = 0;
    let mut push = |output: &mut Vec<u8>, chars: &[u8]| {
        for &c in chars {
            if line == LINE_LENGTH {
                output.push(b'\n');
                line = 0;
            }
            output.push(c);
            line += 1;
        }
    };

    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);

        if chunk.len() == 4 && value == 0 {
            push(&mut output, b"z");
            continue;
        }

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        push(&mut output, &digits[..chunk.len() + 1]);
    }

    output.extend_from_slice(b"~>");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii85_decode_simple() {
        // "Test" encoded in ASCII85 (4 bytes = 1 complete group)
        assert_eq!(decode_ascii85(b"<+U,m").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_decode_z_special_case() {
        assert_eq!(decode_ascii85(b"zz").unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn test_ascii85_z_inside_group_fails() {
        assert!(decode_ascii85(b"<+z").is_err());
    }

    #[test]
    fn test_ascii85_stops_at_end_marker() {
        assert_eq!(decode_ascii85(b"<+U,m~>garbage").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_invalid_character() {
        assert!(matches!(decode_ascii85(b"<+U,{"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_encode_matches_known_output() {
        assert_eq!(encode_ascii85(b"Test"), b"<+U,m~>");
        assert_eq!(encode_ascii85(&[0, 0, 0, 0]), b"z~>");
    }

    #[test]
    fn test_encode_partial_group() {
        let encoded = encode_ascii85(b"Hello");
        assert_eq!(decode_ascii85(&encoded).unwrap(), b"Hello");
    }

    #[test]
    fn test_encode_wraps_long_lines() {
        let data = vec![0x55u8; 200];
        let encoded = encode_ascii85(&data);
        assert!(encoded.split(|&c| c == b'\n').all(|l| l.len() <= LINE_LENGTH + 2));
        assert_eq!(decode_ascii85(&encoded).unwrap(), data);
    }
}
