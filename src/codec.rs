//! Byte / digit-string codec
//!
//! Each byte becomes eight `0`/`1` characters, most significant bit first,
//! with no separators between groups.

use thiserror::Error;

/// Characters per encoded byte
pub const DIGITS_PER_BYTE: usize = 8;

/// Reasons a digit string cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Length is not a whole number of 8-digit groups
    #[error("digit string length {len} is not a multiple of 8")]
    InvalidLength { len: usize },

    /// A character other than `0` or `1`
    #[error("invalid digit {found:?} at offset {offset}")]
    InvalidDigit { offset: usize, found: char },
}

/// Encode bytes as a digit string.
///
/// ```
/// assert_eq!(digitar::codec::encode(b"Hi"), "0100100001101001");
/// assert_eq!(digitar::codec::encode(b""), "");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * DIGITS_PER_BYTE);
    encode_into(bytes, &mut out);
    out
}

/// Append the digit string for `bytes` to `out`.
pub fn encode_into(bytes: &[u8], out: &mut String) {
    out.reserve(bytes.len() * DIGITS_PER_BYTE);
    for &byte in bytes {
        for bit in (0..DIGITS_PER_BYTE).rev() {
            out.push(if (byte >> bit) & 1 == 1 { '1' } else { '0' });
        }
    }
}

/// Decode a digit string back into bytes.
///
/// Fails on a trailing partial group or on any character outside `{0,1}`.
pub fn decode(digits: &str) -> Result<Vec<u8>, DecodeError> {
    decode_bytes(digits.as_bytes())
}

/// Decode digit characters given as raw bytes.
pub fn decode_bytes(digits: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if digits.len() % DIGITS_PER_BYTE != 0 {
        return Err(DecodeError::InvalidLength { len: digits.len() });
    }

    let mut out = Vec::with_capacity(digits.len() / DIGITS_PER_BYTE);
    for (group_index, group) in digits.chunks_exact(DIGITS_PER_BYTE).enumerate() {
        let mut byte = 0u8;
        for (i, &digit) in group.iter().enumerate() {
            let bit = match digit {
                b'0' => 0,
                b'1' => 1,
                other => {
                    return Err(DecodeError::InvalidDigit {
                        offset: group_index * DIGITS_PER_BYTE + i,
                        found: char::from(other),
                    })
                }
            };
            byte = (byte << 1) | bit;
        }
        out.push(byte);
    }

    Ok(out)
}
