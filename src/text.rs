// src/text.rs

//! Turning the text argument into codepoints.

use crate::error::GlyphStripError;
use std::ffi::OsStr;

/// Decode UTF-8 bytes into codepoints.
///
/// Fails at the first invalid sequence, reporting its byte offset.
pub fn decode_utf8(bytes: &[u8]) -> Result<Vec<char>, GlyphStripError> {
    std::str::from_utf8(bytes)
        .map(|text| text.chars().collect())
        .map_err(|e| GlyphStripError::InvalidText {
            offset: e.valid_up_to(),
        })
}

/// Decode a command-line argument as UTF-8 without any lossy conversion.
pub fn decode_arg(arg: &OsStr) -> Result<Vec<char>, GlyphStripError> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        decode_utf8(arg.as_bytes())
    }
    #[cfg(not(unix))]
    {
        arg.to_str()
            .map(|text| text.chars().collect())
            .ok_or(GlyphStripError::InvalidText { offset: 0 })
    }
}

/// Parse hex codepoints separated by whitespace or commas.
///
/// Each token may carry a `U+` or `0x` prefix: `"1F600 U+263A,0x41"`.
pub fn parse_hex_codepoints(text: &str) -> Result<Vec<char>, GlyphStripError> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token
                .strip_prefix("U+")
                .or_else(|| token.strip_prefix("u+"))
                .or_else(|| token.strip_prefix("0x"))
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u32::from_str_radix(digits, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| GlyphStripError::InvalidCodepoint(token.to_string()))
        })
        .collect()
}
