//! Integer objects.

use std::fmt;

/// A PDF integer.
///
/// Integers that overflowed while being parsed are kept as saturated values
/// flagged invalid, so a damaged `/Length 99999999999999999999` can still be
/// inspected instead of failing the whole parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Integer {
    value: i64,
    valid: bool,
}

impl Integer {
    /// Zero.
    pub const ZERO: Integer = Integer::new(0);
    /// One.
    pub const ONE: Integer = Integer::new(1);

    /// A valid integer.
    pub const fn new(value: i64) -> Self {
        Self { value, valid: true }
    }

    /// A saturated integer for a value that did not fit in 64 bits.
    pub const fn invalid(positive: bool) -> Self {
        Self {
            value: if positive { i64::MAX } else { i64::MIN },
            valid: false,
        }
    }

    /// Parse a decimal integer token as it appears in a PDF file.
    ///
    /// Accepts an optional sign. Overflowing values saturate to an invalid
    /// integer; anything that is not a decimal integer returns `None`.
    pub fn from_parsed(token: &str) -> Option<Self> {
        let (negative, digits) = match token.as_bytes().first()? {
            b'-' => (true, &token[1..]),
            b'+' => (false, &token[1..]),
            _ => (false, token),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match token.parse::<i64>() {
            Ok(value) => Some(Self::new(value)),
            Err(_) => {
                log::warn!("Integer '{}' overflows 64 bits, saturating", token);
                Some(Self::invalid(!negative))
            },
        }
    }

    /// The value as a 64-bit integer.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The value clamped to the 32-bit range.
    pub fn as_i32(&self) -> i32 {
        self.value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// The value as a float.
    pub fn as_f64(&self) -> f64 {
        self.value as f64
    }

    /// False if the value was saturated while parsing.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::new(value)
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Integer::new(value as i64)
    }
}

impl From<usize> for Integer {
    fn from(value: usize) -> Self {
        Integer::new(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
