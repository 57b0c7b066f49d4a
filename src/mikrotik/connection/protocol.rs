// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS wire protocol length encoding
//!
//! Every word on the wire is preceded by a variable-width length prefix:
//!
//! | Length                    | Prefix bytes | Leading byte     |
//! |---------------------------|--------------|------------------|
//! | `0x00..=0x7F`             | 1            | `0xxxxxxx`       |
//! | `0x80..=0x3FFF`           | 2            | `10xxxxxx`       |
//! | `0x4000..=0x1F_FFFF`      | 3            | `110xxxxx`       |
//! | `0x20_0000..=0x0FFF_FFFF` | 4            | `1110xxxx`       |
//! | `0x1000_0000..`           | 5            | exactly `0xF0`   |

use crate::error::{Error, Result};

/// Largest length representable by the five byte form
pub const MAX_ENCODABLE_LEN: usize = u32::MAX as usize;

/// Longest possible length prefix
pub const MAX_PREFIX_LEN: usize = 5;

/// Number of prefix bytes the canonical encoding of `len` uses
#[must_use]
pub fn encoded_len(len: usize) -> usize {
    if len < 0x80 {
        1
    } else if len < 0x4000 {
        2
    } else if len < 0x0020_0000 {
        3
    } else if len < 0x1000_0000 {
        4
    } else {
        5
    }
}

/// Encodes `len` in its shortest prefix form
///
/// # Errors
///
/// Returns [`Error::WordTooLarge`] if `len` does not fit in 32 bits.
pub fn encode_length(len: usize) -> Result<Vec<u8>> {
    let value = u32::try_from(len).map_err(|_| Error::WordTooLarge {
        len,
        max: MAX_ENCODABLE_LEN,
    })?;
    let b = value.to_be_bytes();
    let prefix = match encoded_len(len) {
        1 => vec![b[3]],
        2 => vec![b[2] | 0x80, b[3]],
        3 => vec![b[1] | 0xC0, b[2], b[3]],
        4 => vec![b[0] | 0xE0, b[1], b[2], b[3]],
        _ => vec![0xF0, b[0], b[1], b[2], b[3]],
    };
    Ok(prefix)
}

/// Total prefix width announced by the leading byte
///
/// # Errors
///
/// Returns [`Error::InvalidLengthPrefix`] for `0xF1..=0xFF`.
pub fn prefix_width(first: u8) -> Result<usize> {
    match first {
        0xF0 => Ok(5),
        b if b & 0xF0 == 0xF0 => Err(Error::InvalidLengthPrefix(b)),
        b if b & 0xF0 == 0xE0 => Ok(4),
        b if b & 0xE0 == 0xC0 => Ok(3),
        b if b & 0xC0 == 0x80 => Ok(2),
        _ => Ok(1),
    }
}

/// Decodes a length prefix from the start of `bytes`
///
/// Returns the decoded length and the number of prefix bytes consumed.
///
/// # Errors
///
/// Fails on an invalid leading byte or when `bytes` ends inside the prefix.
pub fn decode_length(bytes: &[u8]) -> Result<(usize, usize)> {
    let Some(&first) = bytes.first() else {
        return Err(Error::Protocol("empty length prefix".to_string()));
    };
    let width = prefix_width(first)?;
    if bytes.len() < width {
        return Err(Error::Protocol(format!(
            "truncated length prefix: need {width} bytes, have {}",
            bytes.len()
        )));
    }
    let b = &bytes[..width];
    let value = match width {
        1 => u32::from(first),
        2 => u32::from_be_bytes([0, 0, first & 0x3F, b[1]]),
        3 => u32::from_be_bytes([0, first & 0x1F, b[1], b[2]]),
        4 => u32::from_be_bytes([first & 0x0F, b[1], b[2], b[3]]),
        _ => u32::from_be_bytes([b[1], b[2], b[3], b[4]]),
    };
    Ok((value as usize, width))
}
