//! Self-describing container for packed sequences.
//!
//! Packed words alone cannot be decoded: the reader also needs the bit width,
//! the element count, the frame base, the encoding and, for the overflow area
//! strategy, the outlier table. [`PackedBlock`] carries all of it and
//! serializes to a small little-endian binary layout:
//!
//! ```text
//! +--------+---------+-----+-------+-----------+------------+----------+
//! | "OXBP" | version | tag | flags | bit_width | slot_width | reserved |
//! |   4    |    1    |  1  |   1   |     1     |     1      |    3     |
//! +--------+---------+-----+-------+-----------+------------+----------+
//! | count (u32) | base_offset (i64) | word count (u32) | overflow count (u32) |
//! +-------------+-------------------+------------------+----------------------+
//! | words (u32 * n) | overflow entries (u32 index, i32 value) * m | CRC-32 |
//! +-----------------+---------------------------------------------+--------+
//! ```

use crate::bitstream::WORD_BITS;
use crate::crc::Crc32;
use crate::error::{PackError, Result};
use crate::frame::Metadata;
use crate::traits::StrategyKind;

/// Container magic bytes.
pub const BLOCK_MAGIC: [u8; 4] = *b"OXBP";

/// Current container format version.
pub const BLOCK_VERSION: u8 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Size of the CRC trailer in bytes.
pub const TRAILER_SIZE: usize = 4;

/// Header flags.
pub mod flags {
    /// Values were ZigZag encoded.
    pub const ZIGZAG: u8 = 0x01;
}

/// An outlier stored outside the dense buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowEntry {
    /// Position in the original sequence.
    pub index: usize,
    /// Raw value.
    pub value: i32,
}

/// Compressed state of a strategy instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBlock {
    /// Strategy that produced the words.
    pub kind: StrategyKind,
    /// Frame metadata.
    pub metadata: Metadata,
    /// Bits each element occupies in `words`.
    pub slot_width: u8,
    /// Packed words.
    pub words: Vec<u32>,
    /// Outliers, sorted by index (overflow area only).
    pub overflow: Vec<OverflowEntry>,
}

impl PackedBlock {
    /// Check the fields for internal consistency.
    ///
    /// Strategy specific layout checks happen when a strategy is restored
    /// from the block.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.bit_width > WORD_BITS {
            return Err(PackError::InvalidBitWidth(self.metadata.bit_width));
        }
        if self.slot_width > WORD_BITS {
            return Err(PackError::InvalidBitWidth(self.slot_width));
        }
        if u32::try_from(self.metadata.count).is_err() {
            return Err(PackError::malformed("element count does not fit in u32"));
        }
        self.metadata.check_base()?;

        let mut previous: Option<usize> = None;
        for entry in &self.overflow {
            if entry.index >= self.metadata.count {
                return Err(PackError::corrupted(
                    0,
                    format!(
                        "overflow index {} beyond element count {}",
                        entry.index, self.metadata.count
                    ),
                ));
            }
            if previous.is_some_and(|p| p >= entry.index) {
                return Err(PackError::corrupted(
                    0,
                    "overflow entries are not strictly ordered by index",
                ));
            }
            previous = Some(entry.index);
        }
        Ok(())
    }

    /// Serialize to the binary container layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut out = Vec::with_capacity(
            HEADER_SIZE + self.words.len() * 4 + self.overflow.len() * 8 + TRAILER_SIZE,
        );

        out.extend_from_slice(&BLOCK_MAGIC);
        out.push(BLOCK_VERSION);
        out.push(self.kind.tag());
        out.push(if self.metadata.uses_zigzag {
            flags::ZIGZAG
        } else {
            0
        });
        out.push(self.metadata.bit_width);
        out.push(self.slot_width);
        out.extend_from_slice(&[0; 3]);
        out.extend_from_slice(&len_u32(self.metadata.count)?.to_le_bytes());
        out.extend_from_slice(&self.metadata.base_offset.to_le_bytes());
        out.extend_from_slice(&len_u32(self.words.len())?.to_le_bytes());
        out.extend_from_slice(&len_u32(self.overflow.len())?.to_le_bytes());

        for word in &self.words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for entry in &self.overflow {
            out.extend_from_slice(&len_u32(entry.index)?.to_le_bytes());
            out.extend_from_slice(&entry.value.to_le_bytes());
        }

        let crc = Crc32::compute(&out);
        out.extend_from_slice(&crc.to_le_bytes());
        Ok(out)
    }

    /// Parse and validate a binary container.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + TRAILER_SIZE {
            return Err(PackError::corrupted(
                data.len() as u64,
                format!(
                    "container too short: {} bytes, need at least {}",
                    data.len(),
                    HEADER_SIZE + TRAILER_SIZE
                ),
            ));
        }

        if data[0..4] != BLOCK_MAGIC {
            return Err(PackError::invalid_magic(BLOCK_MAGIC, &data[0..4]));
        }

        let body_len = data.len() - TRAILER_SIZE;
        let expected = u32::from_le_bytes(fixed(data, body_len)?);
        let computed = Crc32::compute(&data[..body_len]);
        if expected != computed {
            return Err(PackError::crc_mismatch(expected, computed));
        }

        let version = data[4];
        if version != BLOCK_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }

        let kind = StrategyKind::from_tag(data[5]).ok_or_else(|| {
            PackError::corrupted(5, format!("unknown strategy tag {}", data[5]))
        })?;
        let flag_bits = data[6];
        if flag_bits & !flags::ZIGZAG != 0 {
            return Err(PackError::corrupted(6, format!("unknown flags {flag_bits:#04x}")));
        }

        let count = u32::from_le_bytes(fixed(data, 12)?) as usize;
        let base_offset = i64::from_le_bytes(fixed(data, 16)?);
        let word_count = u32::from_le_bytes(fixed(data, 24)?) as usize;
        let overflow_count = u32::from_le_bytes(fixed(data, 28)?) as usize;

        let payload = word_count as u64 * 4 + overflow_count as u64 * 8;
        if HEADER_SIZE as u64 + payload != body_len as u64 {
            return Err(PackError::corrupted(
                HEADER_SIZE as u64,
                format!(
                    "payload length mismatch: header describes {payload} bytes, found {}",
                    body_len - HEADER_SIZE
                ),
            ));
        }

        let words_end = HEADER_SIZE + word_count * 4;
        let words = data[HEADER_SIZE..words_end]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let overflow = data[words_end..body_len]
            .chunks_exact(8)
            .map(|c| OverflowEntry {
                index: u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as usize,
                value: i32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            })
            .collect();

        let block = Self {
            kind,
            metadata: Metadata {
                bit_width: data[7],
                count,
                base_offset,
                uses_zigzag: flag_bits & flags::ZIGZAG != 0,
            },
            slot_width: data[8],
            words,
            overflow,
        };
        block.validate()?;
        Ok(block)
    }
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| PackError::malformed(format!("length {len} does not fit in u32")))
}

fn fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| PackError::corrupted(offset as u64, "truncated field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Encoding;

    fn sample_block() -> PackedBlock {
        PackedBlock {
            kind: StrategyKind::OverflowArea,
            metadata: Metadata {
                bit_width: 5,
                count: 4,
                base_offset: 17,
                uses_zigzag: true,
            },
            slot_width: 6,
            words: vec![0xDEAD_BEEF, 0x0000_0042],
            overflow: vec![OverflowEntry {
                index: 2,
                value: -1_000_000,
            }],
        }
    }

    #[test]
    fn test_block_roundtrip() {
        let block = sample_block();
        let bytes = block.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 8 + 8 + TRAILER_SIZE);
        assert_eq!(&bytes[0..4], b"OXBP");
        assert_eq!(PackedBlock::from_bytes(&bytes).unwrap(), block);
    }

    #[test]
    fn test_empty_block_roundtrip() {
        let block = PackedBlock {
            kind: StrategyKind::WithOverflow,
            metadata: Metadata::analyze(&[], Encoding::Offset),
            slot_width: 0,
            words: Vec::new(),
            overflow: Vec::new(),
        };
        let bytes = block.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + TRAILER_SIZE);
        assert_eq!(PackedBlock::from_bytes(&bytes).unwrap(), block);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_block().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            PackedBlock::from_bytes(&bytes),
            Err(PackError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_crc_detects_flipped_bit() {
        let mut bytes = sample_block().to_bytes().unwrap();
        bytes[HEADER_SIZE + 1] ^= 0x10;
        assert!(matches!(
            PackedBlock::from_bytes(&bytes),
            Err(PackError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = sample_block().to_bytes().unwrap();
        assert!(matches!(
            PackedBlock::from_bytes(&bytes[..20]),
            Err(PackError::CorruptedData { .. })
        ));
        // Dropping a whole word breaks the CRC before the length check.
        assert!(PackedBlock::from_bytes(&bytes[..bytes.len() - 4]).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = sample_block().to_bytes().unwrap();
        bytes[4] = 9;
        let body = bytes.len() - TRAILER_SIZE;
        let crc = Crc32::compute(&bytes[..body]);
        bytes[body..].copy_from_slice(&crc.to_le_bytes());
        assert!(matches!(
            PackedBlock::from_bytes(&bytes),
            Err(PackError::UnsupportedVersion(9))
        ));
    }

    /// Overwrite the base offset field and fix up the CRC.
    fn with_base_offset(block: &PackedBlock, base_offset: i64) -> Vec<u8> {
        let mut template = block.clone();
        template.metadata.base_offset = 0;
        let mut bytes = template.to_bytes().unwrap();
        bytes[16..24].copy_from_slice(&base_offset.to_le_bytes());
        let body = bytes.len() - TRAILER_SIZE;
        let crc = Crc32::compute(&bytes[..body]);
        bytes[body..].copy_from_slice(&crc.to_le_bytes());
        bytes
    }

    #[test]
    fn test_base_offset_outside_domain() {
        let cases = [
            (false, i64::from(i32::MIN) - 1),
            (false, i64::from(i32::MAX) + 1),
            (false, i64::MAX),
            (false, i64::MIN),
            (true, -1),
            (true, i64::from(u32::MAX) + 1),
            (true, i64::MAX),
        ];
        for (uses_zigzag, base_offset) in cases {
            let mut block = sample_block();
            block.metadata.uses_zigzag = uses_zigzag;
            let bytes = with_base_offset(&block, base_offset);
            assert!(
                matches!(
                    PackedBlock::from_bytes(&bytes),
                    Err(PackError::CorruptedData { offset: 16, .. })
                ),
                "zigzag {uses_zigzag} base {base_offset}"
            );

            block.metadata.base_offset = base_offset;
            assert!(block.validate().is_err());
            assert!(block.to_bytes().is_err());
        }
    }

    #[test]
    fn test_base_offset_domain_edges_accepted() {
        let cases = [
            (false, i64::from(i32::MIN)),
            (false, i64::from(i32::MAX)),
            (true, 0),
            (true, i64::from(u32::MAX)),
        ];
        for (uses_zigzag, base_offset) in cases {
            let mut block = sample_block();
            block.metadata.uses_zigzag = uses_zigzag;
            let bytes = with_base_offset(&block, base_offset);
            let parsed = PackedBlock::from_bytes(&bytes).unwrap();
            assert_eq!(parsed.metadata.base_offset, base_offset);
        }
    }

    #[test]
    fn test_validate_rejects_unordered_overflow() {
        let mut block = sample_block();
        block.overflow = vec![
            OverflowEntry { index: 3, value: 1 },
            OverflowEntry { index: 1, value: 2 },
        ];
        assert!(block.validate().is_err());

        let mut block = sample_block();
        block.overflow[0].index = 4;
        assert!(block.validate().is_err());

        let mut block = sample_block();
        block.slot_width = 33;
        assert!(matches!(block.validate(), Err(PackError::InvalidBitWidth(33))));
    }
}
