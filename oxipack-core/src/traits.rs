//! Core traits for bit-packing strategies.
//!
//! Every packing strategy implements [`BitPacker`]. A strategy instance starts
//! empty, becomes compressed after [`BitPacker::compress`], and only then
//! answers `get`, `decompress` and `info`. Compressing again replaces the
//! previous contents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bitstream::WORD_BYTES;
use crate::block::PackedBlock;
use crate::error::{PackError, Result};
use crate::frame::Metadata;

/// Bytes of one uncompressed value (`i32`).
pub const VALUE_BYTES: usize = 4;

/// Bytes needed to store the frame base alongside the packed words.
pub const BASE_OFFSET_BYTES: usize = 8;

/// Bytes of one overflow table entry (`u32` index + `i32` value).
pub const OVERFLOW_ENTRY_BYTES: usize = 8;

/// The closed set of packing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Dense packing; values may straddle word boundaries.
    WithOverflow,
    /// Values padded to 8/16/32-bit lanes that never straddle a word.
    NoOverflow,
    /// Dense packing of the common range plus a side table for outliers.
    OverflowArea,
}

impl StrategyKind {
    /// All strategies, in a stable order.
    pub const ALL: [Self; 3] = [Self::WithOverflow, Self::NoOverflow, Self::OverflowArea];

    /// Canonical name accepted by the factory.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WithOverflow => "with_overflow",
            Self::NoOverflow => "no_overflow",
            Self::OverflowArea => "overflow_area",
        }
    }

    /// One-line human description.
    pub const fn description(self) -> &'static str {
        match self {
            Self::WithOverflow => {
                "Packs values back to back so they may span consecutive words, for maximum compression"
            }
            Self::NoOverflow => {
                "Keeps every value inside a single word lane for fast aligned random access"
            }
            Self::OverflowArea => {
                "Stores outliers in a separate table so the common range packs tightly"
            }
        }
    }

    /// Tag used in the container header.
    pub const fn tag(self) -> u8 {
        match self {
            Self::WithOverflow => 0,
            Self::NoOverflow => 1,
            Self::OverflowArea => 2,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::WithOverflow),
            1 => Some(Self::NoOverflow),
            2 => Some(Self::OverflowArea),
            _ => None,
        }
    }

    /// Canonical names of all strategies, in the order of [`ALL`](Self::ALL).
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().map(Self::name)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = PackError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| {
                let available: Vec<&str> = Self::names().collect();
                PackError::unknown_strategy(name, &available)
            })
    }
}

/// Size and layout report of a compressed instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionInfo {
    /// Name of the strategy.
    pub strategy_name: &'static str,
    /// Number of values.
    pub count: usize,
    /// Bits needed per value (for overflow area: of the trimmed range).
    pub bit_width: u8,
    /// Bits each element actually occupies in the packed words.
    pub slot_width: u8,
    /// Whether values were ZigZag encoded.
    pub uses_zigzag: bool,
    /// Frame base.
    pub base_offset: i64,
    /// Number of packed words.
    pub words: usize,
    /// Number of overflow table entries.
    pub overflow_entries: usize,
    /// `count * 4`.
    pub original_size_bytes: usize,
    /// Packed words, frame base and overflow table, in bytes.
    pub compressed_size_bytes: usize,
    /// `original_size_bytes / compressed_size_bytes` (1.0 when nothing is stored).
    pub compression_ratio: f64,
    /// Values per word (no-overflow only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values_per_word: Option<u32>,
    /// Padding bits per word (no-overflow only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasted_bits_per_word: Option<u32>,
    /// Whether an overflow table is in use (overflow area only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_overflow_area: Option<bool>,
    /// Width the full range would need (overflow area only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untrimmed_bit_width: Option<u8>,
}

impl CompressionInfo {
    /// Build the common part of the report.
    pub fn new(
        kind: StrategyKind,
        metadata: &Metadata,
        slot_width: u8,
        words: usize,
        overflow_entries: usize,
    ) -> Self {
        let original_size_bytes = metadata.count * VALUE_BYTES;
        let base_bytes = if metadata.count > 0 {
            BASE_OFFSET_BYTES
        } else {
            0
        };
        let compressed_size_bytes =
            words * WORD_BYTES + base_bytes + overflow_entries * OVERFLOW_ENTRY_BYTES;
        let compression_ratio = if compressed_size_bytes == 0 {
            1.0
        } else {
            original_size_bytes as f64 / compressed_size_bytes as f64
        };

        Self {
            strategy_name: kind.name(),
            count: metadata.count,
            bit_width: metadata.bit_width,
            slot_width,
            uses_zigzag: metadata.uses_zigzag,
            base_offset: metadata.base_offset,
            words,
            overflow_entries,
            original_size_bytes,
            compressed_size_bytes,
            compression_ratio,
            values_per_word: None,
            wasted_bits_per_word: None,
            has_overflow_area: None,
            untrimmed_bit_width: None,
        }
    }
}

/// A bit-packing strategy.
///
/// Implementations own their packed buffer; callers only see it through
/// these operations (and through [`PackedBlock`] for persistence).
pub trait BitPacker: fmt::Debug {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Pack `values`, replacing any previous contents.
    ///
    /// On error the instance keeps its previous state.
    ///
    /// # Returns
    ///
    /// The packed words.
    fn compress(&mut self, values: &[i32]) -> Result<&[u32]>;

    /// Restore the full original sequence.
    fn decompress(&self) -> Result<Vec<i32>>;

    /// Decode the single element at `index`.
    fn get(&self, index: usize) -> Result<i32>;

    /// Report sizes and layout.
    fn info(&self) -> Result<CompressionInfo>;

    /// Frame metadata, if compressed.
    fn metadata(&self) -> Option<&Metadata>;

    /// Export the compressed state as a self-describing block.
    fn to_block(&self) -> Result<PackedBlock>;

    /// Drop the packed contents and return to the empty state.
    fn reset(&mut self);

    /// Canonical strategy name.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether `compress` has succeeded since creation or the last reset.
    fn is_compressed(&self) -> bool {
        self.metadata().is_some()
    }

    /// Number of packed values (0 when not compressed).
    fn len(&self) -> usize {
        self.metadata().map_or(0, |m| m.count)
    }

    /// Whether no values are packed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fail with `IndexOutOfRange` unless `index < len`.
#[inline]
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(PackError::index_out_of_range(index, len));
    }
    Ok(())
}

/// Fail with `MalformedInput` if `values` cannot be described by a container.
pub fn check_input_len(values: &[i32]) -> Result<()> {
    if u32::try_from(values.len()).is_err() {
        return Err(PackError::malformed(format!(
            "{} values exceed the maximum of {} per packed block",
            values.len(),
            u32::MAX
        )));
    }
    Ok(())
}
