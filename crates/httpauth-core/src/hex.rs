// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lowercase hexadecimal encoding for digest output.
//!
//! RFC 2617 transmits every digest as lowercase hex, so both directions are
//! strict: encoding always emits lowercase, decoding rejects odd-length input
//! and non-hex digits.

use smol_str::SmolStr;

/// Encodes a byte sequence as lowercase hexadecimal text.
pub fn to_hex(bytes: &[u8]) -> SmolStr {
    SmolStr::new(hex::encode(bytes))
}

/// Decodes hexadecimal text back into bytes.
///
/// Returns `None` for odd-length input or any non-hex digit. Uppercase digits
/// are accepted on input since clients are not required to preserve case.
pub fn from_hex(text: &str) -> Option<Vec<u8>> {
    hex::decode(text).ok()
}
