//! ZigZag transform between signed and unsigned 32-bit integers.
//!
//! ZigZag interleaves negative and positive values so that numbers of small
//! magnitude map to small codes regardless of sign:
//!
//! ```text
//!  0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
//! ```
//!
//! The mapping is a bijection over the whole `i32` domain, including
//! `i32::MIN` (which maps to `u32::MAX`).

/// Encode a signed value as its ZigZag code.
#[inline]
pub const fn encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Decode a ZigZag code back to the signed value.
#[inline]
pub const fn decode(code: u32) -> i32 {
    ((code >> 1) as i32) ^ -((code & 1) as i32)
}

/// Encode every value of a slice.
pub fn encode_all(values: &[i32]) -> Vec<u32> {
    values.iter().map(|&v| encode(v)).collect()
}

/// Decode every code of a slice.
pub fn decode_all(codes: &[u32]) -> Vec<i32> {
    codes.iter().map(|&c| decode(c)).collect()
}
