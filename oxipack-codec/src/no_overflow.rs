//! Lane-aligned packing where no value crosses a word boundary.
//!
//! The analyzed bit width is rounded up to a lane of 8, 16 or 32 bits. Lanes
//! divide the 32-bit word evenly, so every value sits inside exactly one word
//! and a lookup is a single shift-and-mask:
//!
//! ```text
//! bit_width 5 -> lane 8, 4 values per word
//! word 0: [ v0: 0-7 ][ v1: 8-15 ][ v2: 16-23 ][ v3: 24-31 ]
//! word 1: [ v4: 0-7 ][ ... ]
//! ```
//!
//! The price is the padding between `bit_width` and the lane; apart from the
//! frame base, the ratio is never worse than `32 / lane`.

use oxipack_core::bitstream::{BitWriter, WORD_BITS};
use oxipack_core::block::PackedBlock;
use oxipack_core::error::{PackError, Result};
use oxipack_core::frame::Metadata;
use oxipack_core::traits::{
    BitPacker, CompressionInfo, StrategyKind, check_index, check_input_len,
};
use oxipack_core::width::low_mask;
use tracing::debug;

use crate::config::CodecConfig;
use crate::dense;

/// Smallest lane (0, 8, 16 or 32 bits) that holds `bit_width` bits.
pub fn lane_width(bit_width: u8) -> u8 {
    match bit_width {
        0 => 0,
        1..=8 => 8,
        9..=16 => 16,
        _ => 32,
    }
}

#[derive(Debug, Clone)]
struct Packed {
    metadata: Metadata,
    lane: u8,
    words: Vec<u32>,
}

impl Packed {
    fn values_per_word(&self) -> usize {
        if self.lane == 0 {
            0
        } else {
            usize::from(WORD_BITS / self.lane)
        }
    }

    #[inline]
    fn code(&self, index: usize) -> Result<u32> {
        if self.lane == 0 {
            return Ok(0);
        }
        let per_word = self.values_per_word();
        let shift = (index % per_word) as u32 * u32::from(self.lane);
        let word = self.words.get(index / per_word).ok_or_else(|| {
            PackError::unexpected_eof(index as u64 * u64::from(self.lane))
        })?;
        Ok((word >> shift) & low_mask(self.lane))
    }
}

/// Bit-packing strategy with word-aligned lanes.
#[derive(Debug, Clone, Default)]
pub struct NoOverflow {
    config: CodecConfig,
    state: Option<Packed>,
}

impl NoOverflow {
    /// Create an empty instance with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty instance with a validated configuration.
    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Rebuild a compressed instance from a container block.
    pub fn from_block(block: PackedBlock) -> Result<Self> {
        block.validate()?;
        if block.kind != StrategyKind::NoOverflow {
            return Err(PackError::corrupted(
                0,
                format!("expected a no_overflow block, found {}", block.kind),
            ));
        }
        let lane = lane_width(block.metadata.bit_width);
        if block.slot_width != lane || !block.overflow.is_empty() {
            return Err(PackError::corrupted(0, "no_overflow block has a foreign layout"));
        }
        dense::check_layout(&block.words, block.metadata.count, lane)?;
        dense::check_codes(&block.words, block.metadata.count, lane, &block.metadata)?;

        Ok(Self {
            config: CodecConfig::new(block.metadata.encoding()),
            state: Some(Packed {
                metadata: block.metadata,
                lane,
                words: block.words,
            }),
        })
    }

    /// Configuration used by `compress`.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn packed(&self) -> Result<&Packed> {
        self.state
            .as_ref()
            .ok_or_else(|| PackError::uncompressed(StrategyKind::NoOverflow.name()))
    }
}

impl BitPacker for NoOverflow {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NoOverflow
    }

    fn compress(&mut self, values: &[i32]) -> Result<&[u32]> {
        check_input_len(values)?;

        let metadata = Metadata::analyze(values, self.config.encoding);
        let lane = lane_width(metadata.bit_width);

        // Lanes divide the word, so sequential writes never straddle.
        let mut writer = BitWriter::with_capacity_bits(values.len() as u64 * u64::from(lane));
        for &v in values {
            writer.write_bits(metadata.encode(v), lane)?;
        }
        let words = writer.into_words();

        debug!(
            strategy = "no_overflow",
            count = metadata.count,
            bit_width = metadata.bit_width,
            lane,
            words = words.len(),
            "compressed"
        );

        let packed = self.state.insert(Packed {
            metadata,
            lane,
            words,
        });
        Ok(packed.words.as_slice())
    }

    fn decompress(&self) -> Result<Vec<i32>> {
        let packed = self.packed()?;
        (0..packed.metadata.count)
            .map(|i| packed.code(i).and_then(|c| packed.metadata.decode(c)))
            .collect()
    }

    fn get(&self, index: usize) -> Result<i32> {
        let packed = self.packed()?;
        check_index(index, packed.metadata.count)?;
        packed.metadata.decode(packed.code(index)?)
    }

    fn info(&self) -> Result<CompressionInfo> {
        let packed = self.packed()?;
        let per_word = packed.values_per_word() as u32;
        let padding = u32::from(packed.lane - packed.metadata.bit_width);
        Ok(CompressionInfo {
            values_per_word: Some(per_word),
            wasted_bits_per_word: Some(per_word * padding),
            ..CompressionInfo::new(
                self.kind(),
                &packed.metadata,
                packed.lane,
                packed.words.len(),
                0,
            )
        })
    }

    fn metadata(&self) -> Option<&Metadata> {
        self.state.as_ref().map(|p| &p.metadata)
    }

    fn to_block(&self) -> Result<PackedBlock> {
        let packed = self.packed()?;
        Ok(PackedBlock {
            kind: self.kind(),
            metadata: packed.metadata,
            slot_width: packed.lane,
            words: packed.words.clone(),
            overflow: Vec::new(),
        })
    }

    fn reset(&mut self) {
        self.state = None;
    }
}
