//! TIFF and PNG predictors for FlateDecode and LZWDecode.
//!
//! Predictors encode each sample as a difference from its neighbours, which
//! compresses much better for image rows. `/Predictor 2` is the TIFF
//! horizontal differencing predictor; 10-15 are the PNG row filters, where
//! every row starts with a tag byte naming the filter used for that row.

use crate::error::{Error, Result};
use crate::object::Dictionary;

/// Predictor parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Color components per sample
    pub colors: usize,
    /// Bits per component (1, 2, 4, 8 or 16)
    pub bits_per_component: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl PredictorParams {
    /// Read and validate predictor parameters. Missing keys take their
    /// defaults and an unknown predictor means none. Sample layouts the
    /// predictors cannot handle fail with [`Error::MalformedFilterParameters`].
    pub fn from_dictionary(params: &Dictionary) -> Result<Self> {
        let mut predictor = params.get_int("Predictor", 1);
        let colors = params.get_int("Colors", 1);
        let bits_per_component = params.get_int("BitsPerComponent", 8);
        let columns = params.get_int("Columns", 1);

        if !(predictor <= 2 || (10..=15).contains(&predictor)) {
            log::warn!("Unknown predictor {}, passing data through", predictor);
            predictor = 1;
        }
        if !(1..=32).contains(&colors) {
            return Err(Error::MalformedFilterParameters(format!(
                "Colors must be between 1 and 32, got {}",
                colors
            )));
        }
        if ![1, 2, 4, 8, 16].contains(&bits_per_component) {
            return Err(Error::MalformedFilterParameters(format!(
                "BitsPerComponent must be 1, 2, 4, 8 or 16, got {}",
                bits_per_component
            )));
        }
        if columns < 1 {
            return Err(Error::MalformedFilterParameters(format!(
                "Columns must be positive, got {}",
                columns
            )));
        }

        let row_bits = columns
            .checked_mul(colors)
            .and_then(|samples| samples.checked_mul(bits_per_component))
            .and_then(|bits| usize::try_from(bits).ok());
        if row_bits.is_none() {
            return Err(Error::MalformedFilterParameters(format!(
                "Row of {} columns is too large",
                columns
            )));
        }

        Ok(Self {
            predictor: predictor.max(1),
            columns: columns as usize,
            colors: colors as usize,
            bits_per_component: bits_per_component as usize,
        })
    }

    /// Whether any prediction is applied.
    pub fn is_active(&self) -> bool {
        self.predictor > 1
    }

    /// Bytes of sample data per row (without the PNG tag byte).
    pub fn row_bytes(&self) -> usize {
        self.columns
            .saturating_mul(self.colors)
            .saturating_mul(self.bits_per_component)
            .div_ceil(8)
    }

    /// Bytes per whole pixel, at least one.
    fn pixel_bytes(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Undo the predictor described by `params`.
pub fn decode_predictor(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        i64::MIN..=1 => Ok(data.to_vec()),
        2 => Ok(tiff(data, params, Direction::Decode)),
        10..=15 => decode_png(data, params),
        p => Err(unsupported(p)),
    }
}

/// Apply the predictor described by `params`.
///
/// For `/Predictor 15` every row is tagged with the Paeth filter.
pub fn encode_predictor(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        i64::MIN..=1 => Ok(data.to_vec()),
        2 => Ok(tiff(data, params, Direction::Encode)),
        15 => Ok(encode_png(data, params, 4)),
        p @ 10..=14 => Ok(encode_png(data, params, (p - 10) as u8)),
        p => Err(unsupported(p)),
    }
}

fn unsupported(predictor: i64) -> Error {
    Error::MalformedFilterParameters(format!("unsupported predictor {}", predictor))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Decode,
    Encode,
}

fn tiff(data: &[u8], params: &PredictorParams, direction: Direction) -> Vec<u8> {
    let bpc = params.bits_per_component;
    let colors = params.colors;
    let mask: u32 = (1u32 << bpc) - 1;
    let row_bytes = params.row_bytes();
    let mut output = data.to_vec();

    for row in output.chunks_mut(row_bytes) {
        let samples = params.columns.saturating_mul(colors).min(row.len() * 8 / bpc);
        match direction {
            // left to right: the neighbour is already decoded
            Direction::Decode => {
                for s in colors..samples {
                    let value = get_sample(row, s, bpc) + get_sample(row, s - colors, bpc);
                    set_sample(row, s, bpc, value & mask);
                }
            },
            // right to left: the neighbour is still the original
            Direction::Encode => {
                for s in (colors..samples).rev() {
                    let value = get_sample(row, s, bpc)
                        .wrapping_sub(get_sample(row, s - colors, bpc));
                    set_sample(row, s, bpc, value & mask);
                }
            },
        }
    }
    output
}

fn get_sample(row: &[u8], index: usize, bpc: usize) -> u32 {
    match bpc {
        8 => row[index] as u32,
        16 => u16::from_be_bytes([row[2 * index], row[2 * index + 1]]) as u32,
        _ => {
            let bit = index * bpc;
            let shift = 8 - bpc - (bit % 8);
            ((row[bit / 8] >> shift) as u32) & ((1 << bpc) - 1)
        },
    }
}

fn set_sample(row: &mut [u8], index: usize, bpc: usize, value: u32) {
    match bpc {
        8 => row[index] = value as u8,
        16 => row[2 * index..2 * index + 2].copy_from_slice(&(value as u16).to_be_bytes()),
        _ => {
            let bit = index * bpc;
            let shift = 8 - bpc - (bit % 8);
            let mask = (((1u32 << bpc) - 1) as u8) << shift;
            row[bit / 8] = (row[bit / 8] & !mask) | (((value as u8) << shift) & mask);
        },
    }
}

/// The PNG filter prediction for one byte.
fn png_predict(tag: u8, left: u8, up: u8, up_left: u8) -> u8 {
    match tag {
        1 => left,
        2 => up,
        3 => ((left as u16 + up as u16) / 2) as u8,
        4 => paeth_predictor(left as i16, up as i16, up_left as i16) as u8,
        _ => 0,
    }
}

/// Paeth predictor function from PNG specification.
fn paeth_predictor(a: i16, b: i16, c: i16) -> i16 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn decode_png(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_bytes = params.row_bytes();
    let bpp = params.pixel_bytes();
    let mut output = Vec::with_capacity(data.len());
    // no row is longer than the input
    let mut previous = vec![0u8; row_bytes.min(data.len())];

    for encoded in data.chunks(row_bytes + 1) {
        let tag = encoded[0];
        if tag > 4 {
            return Err(Error::Decode(format!("Invalid PNG predictor tag: {}", tag)));
        }
        let pixels = &encoded[1..];
        let mut current = vec![0u8; pixels.len()];
        for i in 0..pixels.len() {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            current[i] = pixels[i].wrapping_add(png_predict(tag, left, previous[i], up_left));
        }
        output.extend_from_slice(&current);
        previous[..current.len()].copy_from_slice(&current);
    }

    Ok(output)
}

fn encode_png(data: &[u8], params: &PredictorParams, tag: u8) -> Vec<u8> {
    let row_bytes = params.row_bytes();
    let bpp = params.pixel_bytes();
    let mut output = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1) + 1);
    let zero_row = vec![0u8; row_bytes.min(data.len())];
    let mut previous: &[u8] = &zero_row;

    for current in data.chunks(row_bytes) {
        output.push(tag);
        for i in 0..current.len() {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            output.push(current[i].wrapping_sub(png_predict(tag, left, previous[i], up_left)));
        }
        previous = current;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(predictor: i64, columns: usize, colors: usize, bpc: usize) -> PredictorParams {
        PredictorParams {
            predictor,
            columns,
            colors,
            bits_per_component: bpc,
        }
    }

    #[test]
    fn test_no_predictor() {
        let data = b"Hello, World!";
        let result = decode_predictor(data, &PredictorParams::default()).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_png_up_predictor() {
        let encoded = vec![
            2, 10, 20, 30, 40, 50, // Row 0: tag + [10, 20, 30, 40, 50]
            2, 5, 5, 5, 5, 5, // Row 1: tag + [5, 5, 5, 5, 5] = [15, 25, 35, 45, 55] decoded
        ];
        let result = decode_predictor(&encoded, &params(12, 5, 1, 8)).unwrap();
        assert_eq!(result, vec![10, 20, 30, 40, 50, 15, 25, 35, 45, 55]);
    }

    #[test]
    fn test_row_tag_wins_over_declared_predictor() {
        // declared Up, but the row says Sub
        let encoded = vec![1, 1, 1, 1];
        let result = decode_predictor(&encoded, &params(12, 3, 1, 8)).unwrap();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn test_invalid_tag_fails() {
        let result = decode_predictor(&[9, 0, 0], &params(15, 2, 1, 8));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_png_round_trips_each_filter() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3 * 40).collect();
        for predictor in 10..=15 {
            let p = params(predictor, 20, 2, 8);
            let encoded = encode_predictor(&data, &p).unwrap();
            assert_eq!(decode_predictor(&encoded, &p).unwrap(), data, "predictor {}", predictor);
        }
    }

    #[test]
    fn test_tiff_round_trip_sub_byte_samples() {
        let data = vec![0b1011_0010, 0b0111_1000, 0b0001_1110];
        let p = params(2, 6, 1, 4);
        let encoded = encode_predictor(&data, &p).unwrap();
        assert_ne!(encoded, data);
        assert_eq!(decode_predictor(&encoded, &p).unwrap(), data);
    }

    #[test]
    fn test_tiff_sixteen_bit() {
        let data = vec![0x01, 0x00, 0x01, 0x05];
        let p = params(2, 2, 1, 16);
        let encoded = encode_predictor(&data, &p).unwrap();
        assert_eq!(encoded, vec![0x01, 0x00, 0x00, 0x05]);
        assert_eq!(decode_predictor(&encoded, &p).unwrap(), data);
    }

    #[test]
    fn test_partial_last_row_is_kept() {
        let encoded = vec![0, 1, 2, 3, 0, 4];
        let result = decode_predictor(&encoded, &params(10, 3, 1, 8)).unwrap();
        assert_eq!(result, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_from_dictionary_validates() {
        let mut dict = Dictionary::new();
        assert_eq!(PredictorParams::from_dictionary(&dict).unwrap(), PredictorParams::default());

        dict.set_int("Predictor", 12);
        dict.set_int("Columns", 0);
        assert!(matches!(
            PredictorParams::from_dictionary(&dict),
            Err(Error::MalformedFilterParameters(_))
        ));

        dict.set_int("Columns", 4);
        dict.set_int("BitsPerComponent", 3);
        assert!(matches!(
            PredictorParams::from_dictionary(&dict),
            Err(Error::MalformedFilterParameters(_))
        ));

        dict.set_int("BitsPerComponent", 8);
        dict.set_int("Columns", 1 << 62);
        assert!(matches!(
            PredictorParams::from_dictionary(&dict),
            Err(Error::MalformedFilterParameters(_))
        ));
    }

    #[test]
    fn test_unknown_predictor_passes_through() {
        let mut dict = Dictionary::new();
        dict.set_int("Predictor", 7);
        dict.set_int("Columns", 4);
        let p = PredictorParams::from_dictionary(&dict).unwrap();
        assert!(!p.is_active());
        assert_eq!(decode_predictor(b"abcd", &p).unwrap(), b"abcd");
    }

    #[test]
    fn test_huge_row_does_not_allocate_full_row() {
        let mut dict = Dictionary::new();
        dict.set_int("Predictor", 12);
        dict.set_int("Columns", 1_000_000_000_000);
        let p = PredictorParams::from_dictionary(&dict).unwrap();
        // one partial row: tag byte plus three samples
        assert_eq!(decode_predictor(&[0, 7, 8, 9], &p).unwrap(), vec![7, 8, 9]);
        let encoded = encode_predictor(&[7, 8, 9], &p).unwrap();
        assert_eq!(decode_predictor(&encoded, &p).unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_row_bytes_calculation() {
        assert_eq!(params(12, 5, 1, 8).row_bytes(), 5);
        assert_eq!(params(12, 5, 3, 16).row_bytes(), 30);
        assert_eq!(params(12, 3, 1, 1).row_bytes(), 1);
    }
}
