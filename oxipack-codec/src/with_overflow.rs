//! Dense packing where values may straddle word boundaries.
//!
//! Every value is turned into a frame code and written back to back at the
//! analyzed bit width, so the packed size is exactly `count * bit_width` bits
//! rounded up to a whole word. With 12-bit codes:
//!
//! ```text
//! word 0: [ v0: 0-11 ][ v1: 12-23 ][ v2 low: 24-31 ]
//! word 1: [ v2 high: 0-3 ][ v3: 4-15 ][ ... ]
//! ```
//!
//! Element `i` lives at bit `i * bit_width`; a lookup reads at most two words.

use oxipack_core::block::PackedBlock;
use oxipack_core::error::{PackError, Result};
use oxipack_core::frame::Metadata;
use oxipack_core::traits::{
    BitPacker, CompressionInfo, StrategyKind, check_index, check_input_len,
};
use tracing::debug;

use crate::config::CodecConfig;
use crate::dense;

#[derive(Debug, Clone)]
struct Packed {
    metadata: Metadata,
    words: Vec<u32>,
}

/// Bit-packing strategy with cross-word ("overflowing") values.
#[derive(Debug, Clone, Default)]
pub struct WithOverflow {
    config: CodecConfig,
    state: Option<Packed>,
}

impl WithOverflow {
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
        if block.kind != StrategyKind::WithOverflow {
            return Err(PackError::corrupted(
                0,
                format!("expected a with_overflow block, found {}", block.kind),
            ));
        }
        if block.slot_width != block.metadata.bit_width || !block.overflow.is_empty() {
            return Err(PackError::corrupted(0, "with_overflow block has a foreign layout"));
        }
        dense::check_layout(&block.words, block.metadata.count, block.metadata.bit_width)?;
        dense::check_codes(
            &block.words,
            block.metadata.count,
            block.metadata.bit_width,
            &block.metadata,
        )?;

        Ok(Self {
            config: CodecConfig::new(block.metadata.encoding()),
            state: Some(Packed {
                metadata: block.metadata,
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
            .ok_or_else(|| PackError::uncompressed(StrategyKind::WithOverflow.name()))
    }
}

impl BitPacker for WithOverflow {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WithOverflow
    }

    fn compress(&mut self, values: &[i32]) -> Result<&[u32]> {
        check_input_len(values)?;

        let metadata = Metadata::analyze(values, self.config.encoding);
        let words = dense::pack(
            values.iter().map(|&v| metadata.encode(v)),
            values.len(),
            metadata.bit_width,
        )?;

        debug!(
            strategy = "with_overflow",
            count = metadata.count,
            bit_width = metadata.bit_width,
            words = words.len(),
            "compressed"
        );

        let packed = self.state.insert(Packed { metadata, words });
        Ok(packed.words.as_slice())
    }

    fn decompress(&self) -> Result<Vec<i32>> {
        let packed = self.packed()?;
        let meta = &packed.metadata;
        let codes = dense::read_all(&packed.words, meta.count, meta.bit_width)?;
        codes.into_iter().map(|c| meta.decode(c)).collect()
    }

    fn get(&self, index: usize) -> Result<i32> {
        let packed = self.packed()?;
        let meta = &packed.metadata;
        check_index(index, meta.count)?;
        let code = dense::read(&packed.words, index, meta.bit_width)?;
        meta.decode(code)
    }

    fn info(&self) -> Result<CompressionInfo> {
        let packed = self.packed()?;
        Ok(CompressionInfo::new(
            self.kind(),
            &packed.metadata,
            packed.metadata.bit_width,
            packed.words.len(),
            0,
        ))
    }

    fn metadata(&self) -> Option<&Metadata> {
        self.state.as_ref().map(|p| &p.metadata)
    }

    fn to_block(&self) -> Result<PackedBlock> {
        let packed = self.packed()?;
        Ok(PackedBlock {
            kind: self.kind(),
            metadata: packed.metadata,
            slot_width: packed.metadata.bit_width,
            words: packed.words.clone(),
            overflow: Vec::new(),
        })
    }

    fn reset(&mut self) {
        self.state = None;
    }
}
