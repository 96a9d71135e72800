//! Base64URL encoding/decoding per RFC 4648
//!
//! Encoding never pads. Decoding accepts padded and unpadded input: padding
//! is restored before the segment is handed to the `base64` crate, which
//! then rejects bad alphabet characters and misplaced `=`.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Encode bytes to an unpadded Base64URL segment
pub fn encode_bytes(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Encode string to Base64URL
pub fn encode(input: &str) -> String {
    encode_bytes(input.as_bytes())
}

/// Decode a Base64URL segment (padded or not) to bytes
pub fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    let padded = restore_padding(input)?;
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| Error::InvalidBase64(format!("Base64URL decode failed: {e}")))
}

/// Decode Base64URL string to UTF-8 string
pub fn decode(input: &str) -> Result<String> {
    let bytes = decode_bytes(input)?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidBase64(format!("Invalid UTF-8: {e}")))
}

fn restore_padding(input: &str) -> Result<String> {
    let trimmed = input.trim_end_matches('=');
    let pad = match trimmed.len() % 4 {
        0 => 0,
        2 => 2,
        3 => 1,
        _ => {
            return Err(Error::InvalidBase64(format!(
                "Invalid segment length: {}",
                trimmed.len()
            )))
        }
    };

    // Caller-supplied padding must match what the length implies.
    let supplied = input.len() - trimmed.len();
    if supplied != 0 && supplied != pad {
        return Err(Error::InvalidBase64("Corrupt padding".to_string()));
    }

    let mut padded = String::with_capacity(trimmed.len() + pad);
    padded.push_str(trimmed);
    padded.extend(std::iter::repeat('=').take(pad));
    Ok(padded)
}
