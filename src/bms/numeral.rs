//! Two-digit numerals of the channel encoding.
//!
//! Channel data and definition ids are written as consecutive digit pairs. The classic
//! encoding is base 36 and case-insensitive, so `1z` and `1Z` are the same value. The extended
//! encoding is base 62 and distinguishes cases.

use thiserror::Error;

/// Failure to read a digit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumeralError {
    /// The input was not exactly two characters long.
    #[error("expected two digits")]
    WrongLength,
    /// A character is outside the digit set.
    #[error("{0:?} is not a digit")]
    InvalidDigit(char),
}

const fn base36_digit(ch: u8) -> Option<u16> {
    match ch {
        b'0'..=b'9' => Some((ch - b'0') as u16),
        b'A'..=b'Z' => Some((ch - b'A') as u16 + 10),
        b'a'..=b'z' => Some((ch - b'a') as u16 + 10),
        _ => None,
    }
}

const fn base62_digit(ch: u8) -> Option<u16> {
    match ch {
        b'0'..=b'9' => Some((ch - b'0') as u16),
        b'A'..=b'Z' => Some((ch - b'A') as u16 + 10),
        b'a'..=b'z' => Some((ch - b'a') as u16 + 36),
        _ => None,
    }
}

fn parse_pair(pair: &str, digit: fn(u8) -> Option<u16>, radix: u16) -> Result<u16, NumeralError> {
    let mut chars = pair.chars();
    let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(NumeralError::WrongLength);
    };
    let value = |ch: char| {
        u8::try_from(ch)
            .ok()
            .and_then(digit)
            .ok_or(NumeralError::InvalidDigit(ch))
    };
    Ok(value(first)? * radix + value(second)?)
}

/// Parses a case-insensitive base-36 digit pair into `0..=1295`.
///
/// # Errors
///
/// Returns [`NumeralError`] if `pair` is not two ASCII alphanumerics.
///
/// ```rust
/// use bms_chart::bms::numeral::parse_base36;
///
/// assert_eq!(parse_base36("1Z"), Ok(71));
/// assert_eq!(parse_base36("1z"), Ok(71));
/// assert!(parse_base36("1-").is_err());
/// ```
pub fn parse_base36(pair: &str) -> Result<u16, NumeralError> {
    parse_pair(pair, base36_digit, 36)
}

/// Parses a case-sensitive base-62 digit pair into `0..=3843`.
///
/// # Errors
///
/// Returns [`NumeralError`] if `pair` is not two ASCII alphanumerics.
pub fn parse_base62(pair: &str) -> Result<u16, NumeralError> {
    parse_pair(pair, base62_digit, 62)
}

/// A two-character object id, kept as written.
///
/// Ids select entries of the `#WAVxx`, `#BMPxx`, `#BPMxx`, `#STOPxx` and `#SCROLLxx` tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjId([u8; 2]);

impl std::fmt::Debug for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjId").field(&self.to_string()).finish()
    }
}

impl std::fmt::Display for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

impl<'a> TryFrom<&'a str> for ObjId {
    type Error = NumeralError;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        parse_base62(value)?;
        let bytes = value.as_bytes();
        match bytes {
            [first, second] => Ok(Self([*first, *second])),
            _ => Err(NumeralError::WrongLength),
        }
    }
}

impl ObjId {
    /// The id `00`, which means "no object" in channel data.
    #[must_use]
    pub const fn null() -> Self {
        Self([b'0', b'0'])
    }

    /// Builds the id that encodes `value` in base 36, the form the decoder reports.
    #[must_use]
    pub const fn from_base36(value: u16) -> Self {
        const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let value = value % (36 * 36);
        Self([DIGITS[(value / 36) as usize], DIGITS[(value % 36) as usize]])
    }

    /// Value of the id read in base 36.
    #[must_use]
    pub fn as_base36(self) -> u16 {
        self.0
            .iter()
            .map(|&ch| base36_digit(ch).unwrap_or(0))
            .fold(0, |acc, digit| acc * 36 + digit)
    }

    /// Value of the id read in base 62.
    #[must_use]
    pub fn as_base62(self) -> u16 {
        self.0
            .iter()
            .map(|&ch| base62_digit(ch).unwrap_or(0))
            .fold(0, |acc, digit| acc * 62 + digit)
    }
}
