//! Word-oriented bit I/O for packed integer buffers.
//!
//! This module provides `BitWriter` and `BitReader`, which append and extract
//! arbitrary bit fields (0-32 bits) to and from a growing buffer of `u32`
//! words. Fields may straddle a word boundary; the writer splits them and the
//! reader joins them back.
//!
//! # Bit Ordering
//!
//! Fields are packed LSB-first: bit `k` of the stream is bit `k % 32` of word
//! `k / 32`. A field written at offset `o` therefore starts at bit `o % 32` of
//! word `o / 32` and continues into the low bits of the following word.
//!
//! Unlike a byte stream reader, `BitReader` is random access: any field can be
//! read directly from its bit offset without decoding what precedes it.
//!
//! # Example
//!
//! ```
//! use oxipack_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0xABCD_EF01, 32).unwrap(); // crosses into the next word
//! let words = writer.into_words();
//! assert_eq!(words.len(), 2);
//!
//! let reader = BitReader::new(&words);
//! assert_eq!(reader.read_bits_at(0, 3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits_at(3, 32).unwrap(), 0xABCD_EF01);
//! ```

use crate::error::{PackError, Result};
use crate::width::low_mask;

/// Number of bits in one storage word.
pub const WORD_BITS: u8 = 32;

/// Number of bytes in one storage word.
pub const WORD_BYTES: usize = 4;

/// Number of words needed to hold `bits` bits.
#[inline]
pub fn words_for_bits(bits: u64) -> usize {
    bits.div_ceil(u64::from(WORD_BITS)) as usize
}

#[inline]
fn check_width(count: u8) -> Result<()> {
    if count > WORD_BITS {
        return Err(PackError::InvalidBitWidth(count));
    }
    Ok(())
}

/// Appends bit fields to a growing word buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    /// Packed words; the last one may be partially filled.
    words: Vec<u32>,
    /// Bit cursor (total bits written).
    bit_len: u64,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `bits` bits before reallocating.
    pub fn with_capacity_bits(bits: u64) -> Self {
        Self {
            words: Vec::with_capacity(words_for_bits(bits)),
            bit_len: 0,
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.bit_len
    }

    /// Get the words written so far.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Consume the writer and return the packed words.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    /// Append the low `count` bits of `value`.
    ///
    /// # Arguments
    ///
    /// * `value` - The bits to write (higher bits are ignored)
    /// * `count` - Number of bits to write (0-32)
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) -> Result<()> {
        check_width(count)?;

        if count == 0 {
            return Ok(());
        }

        let value = value & low_mask(count);
        let shift = (self.bit_len % u64::from(WORD_BITS)) as u32;
        if shift == 0 {
            self.words.push(0);
        }

        let spread = u64::from(value) << shift;
        let last = self.words.len() - 1;
        self.words[last] |= spread as u32;
        if shift + u32::from(count) > u32::from(WORD_BITS) {
            self.words.push((spread >> WORD_BITS) as u32);
        }

        self.bit_len += u64::from(count);
        Ok(())
    }

    /// Pad with zeros up to the next word boundary.
    pub fn align_to_word(&mut self) {
        self.bit_len = self.words.len() as u64 * u64::from(WORD_BITS);
    }
}

/// Extracts bit fields from a packed word buffer.
///
/// Random access goes through [`read_bits_at`](Self::read_bits_at); the
/// sequential [`read_bits`](Self::read_bits) keeps its own cursor and is what
/// full decompression uses.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    words: &'a [u32],
    /// Cursor for sequential reads.
    position: u64,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at bit 0.
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, position: 0 }
    }

    /// Total number of bits in the buffer.
    pub fn bit_capacity(&self) -> u64 {
        self.words.len() as u64 * u64::from(WORD_BITS)
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the cursor to `offset`.
    pub fn seek(&mut self, offset: u64) {
        self.position = offset;
    }

    /// Read `count` bits starting at bit `offset`.
    ///
    /// # Arguments
    ///
    /// * `offset` - Bit offset of the field
    /// * `count` - Number of bits to read (0-32)
    ///
    /// # Returns
    ///
    /// The field as a u32, with the first bit in the LSB position.
    #[inline]
    pub fn read_bits_at(&self, offset: u64, count: u8) -> Result<u32> {
        check_width(count)?;

        if count == 0 {
            return Ok(0);
        }

        if offset + u64::from(count) > self.bit_capacity() {
            return Err(PackError::unexpected_eof(offset));
        }

        let index = (offset / u64::from(WORD_BITS)) as usize;
        let shift = (offset % u64::from(WORD_BITS)) as u32;

        let mut window = u64::from(self.words[index]);
        if shift + u32::from(count) > u32::from(WORD_BITS) {
            window |= u64::from(self.words[index + 1]) << WORD_BITS;
        }

        Ok((window >> shift) as u32 & low_mask(count))
    }

    /// Read `count` bits at the cursor and advance it.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        let value = self.read_bits_at(self.position, count)?;
        self.position += u64::from(count);
        Ok(value)
    }
}
