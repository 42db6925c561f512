//! # Hex Encoding/Decoding Utilities
//!
//! This module provides hex encoding and decoding functions that are used
//! throughout the EMS implementation for debug output, the raw command
//! response rendering and test frame construction.
//!
//! ## Features
//!
//! - Efficient hex encoding/decoding using the `hex` crate
//! - Compact and `0x`-prefixed rendering for log sinks
//! - Error handling for invalid hex strings
//!
//! ## Usage
//!
//! ```rust
//! use ems_rs::util::hex::{encode_hex, decode_hex, format_hex_prefixed};
//!
//! let data = [0x88, 0x0B, 0x02, 0x00];
//! assert_eq!(encode_hex(&data), "880b0200");
//! assert_eq!(decode_hex("880b0200").unwrap(), data);
//! assert_eq!(format_hex_prefixed(&data), "0x88 0x0b 0x02 0x00");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
///
/// This is the primary encoding function used throughout the codebase
/// for consistent hex representation.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is automatically stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    if hex_str.is_empty() {
        return Err(HexError::EmptyString);
    }

    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "88 0b 02 00" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format hex data with 0x prefixes, the shape the raw command response
/// and the message debug sink use.
///
/// Formats data as "0x88 0x0b 0x02 0x00".
pub fn format_hex_prefixed(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("0x{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Helper for creating test data from hex strings
///
/// This is commonly used in tests throughout the codebase.
/// Panics on invalid hex (intended for test code only).
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    decode_hex(hex).expect("Invalid hex in test data")
}
