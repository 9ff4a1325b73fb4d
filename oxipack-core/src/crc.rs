//! CRC-32 checksum for packed containers.
//!
//! The trailer of a [`PackedBlock`](crate::block::PackedBlock) is the IEEE
//! CRC-32 (reflected polynomial `0xEDB88320`, the one ZIP and GZIP use) of
//! every byte before it. One byte is folded in per table lookup; the checksum
//! runs once per save or load, never on the `get` path.

/// Reflected IEEE polynomial.
const POLY: u32 = 0xEDB8_8320;

/// Remainder of one byte, shifted through eight rounds of the polynomial.
const fn byte_remainder(byte: u8) -> u32 {
    let mut rem = byte as u32;
    let mut round = 0;
    while round < 8 {
        rem = (rem >> 1) ^ (POLY & (rem & 1).wrapping_neg());
        round += 1;
    }
    rem
}

const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut byte = 0;
    while byte < 256 {
        table[byte] = byte_remainder(byte as u8);
        byte += 1;
    }
    table
};

/// Running IEEE CRC-32.
///
/// ```
/// use oxipack_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"12345");
/// crc.update(b"6789");
/// assert_eq!(crc.finalize(), Crc32::compute(b"123456789"));
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    /// Start a new checksum.
    pub fn new() -> Self {
        Self { state: u32::MAX }
    }

    /// Fold `data` into the checksum.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.state = data.iter().fold(self.state, |state, &byte| {
            TABLE[usize::from(state as u8 ^ byte)] ^ (state >> 8)
        });
    }

    /// Final checksum value.
    #[inline]
    pub fn finalize(self) -> u32 {
        !self.state
    }

    /// Checksum of `data` in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
