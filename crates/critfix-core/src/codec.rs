//! Hex/text conversions used by the patcher.
//!
//! The backup stores its payload as one long hex string. IMEIs are written
//! into it as ASCII-hex (one hex-encoded ASCII byte per decimal digit, not
//! packed BCD) and the CRC-32 trailer as 8 little-endian hex digits.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::Result;

/// Decode a hex string into bytes.
///
/// Odd-length input or a non-hex digit fails with [`Error::InvalidHex`].
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    hex::decode(hex).map_err(|_| Error::InvalidHex)
}

/// Encode bytes as a lowercase hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Render a `u32` as 8 hex digits in little-endian byte order.
///
/// `0x12345678` becomes `"78563412"`.
pub fn u32_to_le_hex(value: u32) -> String {
    hex::encode(value.to_le_bytes())
}

/// Encode an IMEI as the hex character codes of its ASCII digits.
///
/// 15 decimal digits become exactly 30 hex characters.
pub fn imei_hex(imei: &Imei) -> String {
    hex::encode(imei.as_str().as_bytes())
}

/// A validated 15-decimal-digit IMEI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Imei(String);

/// Rejection of an IMEI candidate.
///
/// Input validation happens before a repair is attempted, so this is not
/// part of the repair taxonomy in [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImeiError;

impl fmt::Display for ImeiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an IMEI must be exactly 15 decimal digits")
    }
}

impl std::error::Error for ImeiError {}

impl Imei {
    /// Validate an IMEI candidate.
    pub fn new(candidate: &str) -> std::result::Result<Self, ImeiError> {
        if candidate.len() == 15 && candidate.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Imei(candidate.to_owned()))
        } else {
            Err(ImeiError)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Imei {
    type Err = ImeiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Imei::new(s)
    }
}

impl fmt::Display for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
