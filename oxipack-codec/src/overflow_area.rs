//! Dense packing of the common range with a side table for outliers.
//!
//! A handful of large values forces a wide bit width on every element of a
//! dense buffer. This strategy sizes the frame from the bulk of the
//! distribution instead and moves the values that do not fit into an
//! overflow table:
//!
//! 1. The threshold is the `percentile`-th value of the sorted magnitudes
//!    `|v|` (rank `floor(n * p / 100)`, clamped to `n - 1`).
//! 2. Values with magnitude at or below the threshold define the dense frame
//!    (base offset and bit width).
//! 3. Values whose code does not fit that frame become outliers. The effective
//!    boundary is therefore rounded up to the frame width: values above the
//!    threshold that still fit stay dense.
//!
//! When outliers exist, every element occupies a slot of
//! `1 + max(bit_width, index_bits)` bits. The top bit is a flag; a clear flag
//! means the payload is the dense code, a set flag means it is the position of
//! the element in the overflow table:
//!
//! ```text
//! values: [1, 2, 3, 1024, 4, 5, 2048]
//! slots:  [0|001, 0|010, 0|011, 1|000, 0|100, 0|101, 1|001]
//! table:  [(3, 1024), (6, 2048)]
//! ```
//!
//! Slot positions stay `index * slot_width`, so lookups remain O(1). The table
//! is only used when it is actually smaller than packing the full range;
//! otherwise the strategy degrades to plain dense packing.

use oxipack_core::bitstream::WORD_BITS;
use oxipack_core::block::{OverflowEntry, PackedBlock};
use oxipack_core::error::{PackError, Result};
use oxipack_core::frame::Metadata;
use oxipack_core::traits::{
    BitPacker, CompressionInfo, OVERFLOW_ENTRY_BYTES, StrategyKind, check_index,
    check_input_len,
};
use oxipack_core::width::{bit_length, low_mask};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::dense;

/// Bits of the slot holding either a dense code or an overflow position.
pub fn slot_width(dense_width: u8, overflow_entries: usize) -> u8 {
    let index_bits = bit_length(overflow_entries.saturating_sub(1) as u32);
    1 + dense_width.max(index_bits)
}

/// Magnitude at the given percentile rank.
fn magnitude_threshold(values: &[i32], percentile: f64) -> u32 {
    let mut magnitudes: Vec<u32> = values.iter().map(|v| v.unsigned_abs()).collect();
    let rank = ((magnitudes.len() as f64 * percentile / 100.0) as usize).min(magnitudes.len() - 1);
    *magnitudes.select_nth_unstable(rank).1
}

/// Routing of one input between the dense buffer and the overflow table.
#[derive(Debug)]
struct Plan {
    metadata: Metadata,
    untrimmed_width: u8,
    overflow: Vec<OverflowEntry>,
}

impl Plan {
    fn build(values: &[i32], config: &CodecConfig) -> Self {
        let full = Metadata::analyze(values, config.encoding);
        let plain = |full: Metadata| Self {
            metadata: full,
            untrimmed_width: full.bit_width,
            overflow: Vec::new(),
        };
        if values.is_empty() {
            return plain(full);
        }

        let threshold = magnitude_threshold(values, config.percentile);
        let dense = Metadata::analyze_iter(
            values.iter().copied().filter(|v| v.unsigned_abs() <= threshold),
            values.len(),
            config.encoding,
        );
        let overflow: Vec<OverflowEntry> = values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| !dense.contains(v))
            .map(|(index, &value)| OverflowEntry { index, value })
            .collect();

        if overflow.is_empty() {
            return plain(full);
        }

        let slot = slot_width(dense.bit_width, overflow.len());
        let n = values.len() as u64;
        let cost_with = n * u64::from(slot) + (overflow.len() * OVERFLOW_ENTRY_BYTES * 8) as u64;
        let cost_without = n * u64::from(full.bit_width);

        debug!(
            threshold,
            outliers = overflow.len(),
            dense_width = dense.bit_width,
            full_width = full.bit_width,
            cost_with,
            cost_without,
            "overflow area plan"
        );

        if slot <= WORD_BITS && cost_with < cost_without {
            Self {
                metadata: dense,
                untrimmed_width: full.bit_width,
                overflow,
            }
        } else {
            plain(full)
        }
    }
}

#[derive(Debug, Clone)]
struct Packed {
    metadata: Metadata,
    slot_width: u8,
    untrimmed_width: u8,
    words: Vec<u32>,
    overflow: Vec<OverflowEntry>,
}

impl Packed {
    /// Turn a slot into a value for element `index`.
    #[inline]
    fn resolve(&self, index: usize, slot: u32) -> Result<i32> {
        if self.overflow.is_empty() {
            return self.metadata.decode(slot);
        }

        let payload_bits = self.slot_width - 1;
        if (slot >> payload_bits) & 1 == 0 {
            return self.metadata.decode(slot);
        }

        let position = (slot & low_mask(payload_bits)) as usize;
        match self.overflow.get(position) {
            Some(entry) if entry.index == index => Ok(entry.value),
            _ => Err(PackError::corrupted(
                0,
                format!("slot {index} points to invalid overflow entry {position}"),
            )),
        }
    }

    fn decode_all(&self) -> Result<Vec<i32>> {
        dense::read_all(&self.words, self.metadata.count, self.slot_width)?
            .into_iter()
            .enumerate()
            .map(|(i, slot)| self.resolve(i, slot))
            .collect()
    }
}

/// Bit-packing strategy with an overflow table for outliers.
#[derive(Debug, Clone, Default)]
pub struct OverflowArea {
    config: CodecConfig,
    state: Option<Packed>,
}

impl OverflowArea {
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
    ///
    /// The percentile is not stored in blocks; the restored instance uses the
    /// default one for any later `compress`.
    pub fn from_block(block: PackedBlock) -> Result<Self> {
        block.validate()?;
        if block.kind != StrategyKind::OverflowArea {
            return Err(PackError::corrupted(
                0,
                format!("expected an overflow_area block, found {}", block.kind),
            ));
        }

        let meta = block.metadata;
        let expected_slot = if block.overflow.is_empty() {
            meta.bit_width
        } else {
            slot_width(meta.bit_width, block.overflow.len())
        };
        if block.slot_width != expected_slot || expected_slot > WORD_BITS {
            return Err(PackError::corrupted(
                0,
                format!(
                    "slot width {} does not match bit width {} with {} outliers",
                    block.slot_width,
                    meta.bit_width,
                    block.overflow.len()
                ),
            ));
        }
        dense::check_layout(&block.words, meta.count, block.slot_width)?;

        let mut packed = Packed {
            metadata: meta,
            slot_width: block.slot_width,
            untrimmed_width: meta.bit_width,
            words: block.words,
            overflow: block.overflow,
        };

        // Every table entry must be referenced by exactly its own slot.
        if !packed.overflow.is_empty() {
            let flag = 1u32 << (packed.slot_width - 1);
            let flagged = dense::read_all(&packed.words, meta.count, packed.slot_width)?
                .into_iter()
                .filter(|slot| slot & flag != 0)
                .count();
            if flagged != packed.overflow.len() {
                return Err(PackError::corrupted(
                    0,
                    format!(
                        "{flagged} flagged slots for {} overflow entries",
                        packed.overflow.len()
                    ),
                ));
            }
        }
        let values = packed.decode_all()?;
        packed.untrimmed_width = Metadata::analyze(&values, meta.encoding()).bit_width;

        trace!(
            count = meta.count,
            outliers = packed.overflow.len(),
            "restored overflow_area block"
        );

        Ok(Self {
            config: CodecConfig::new(meta.encoding()),
            state: Some(packed),
        })
    }

    /// Configuration used by `compress`.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Outliers stored outside the dense buffer, sorted by index.
    ///
    /// Empty when not compressed or when no overflow area is in use.
    pub fn overflow_table(&self) -> &[OverflowEntry] {
        self.state
            .as_ref()
            .map(|p| p.overflow.as_slice())
            .unwrap_or_default()
    }

    /// Whether element `index` is stored in the overflow table.
    pub fn is_outlier(&self, index: usize) -> bool {
        self.overflow_table()
            .binary_search_by_key(&index, |e| e.index)
            .is_ok()
    }

    fn packed(&self) -> Result<&Packed> {
        self.state
            .as_ref()
            .ok_or_else(|| PackError::uncompressed(StrategyKind::OverflowArea.name()))
    }
}

impl BitPacker for OverflowArea {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OverflowArea
    }

    fn compress(&mut self, values: &[i32]) -> Result<&[u32]> {
        check_input_len(values)?;

        let plan = Plan::build(values, &self.config);
        let meta = plan.metadata;

        let (slot, words) = if plan.overflow.is_empty() {
            let words = dense::pack(
                values.iter().map(|&v| meta.encode(v)),
                values.len(),
                meta.bit_width,
            )?;
            (meta.bit_width, words)
        } else {
            let slot = slot_width(meta.bit_width, plan.overflow.len());
            let flag = 1u32 << (slot - 1);
            let mut next = 0usize;
            let slots = values.iter().enumerate().map(|(i, &v)| {
                match plan.overflow.get(next) {
                    Some(entry) if entry.index == i => {
                        next += 1;
                        flag | (next - 1) as u32
                    }
                    _ => meta.encode(v),
                }
            });
            (slot, dense::pack(slots, values.len(), slot)?)
        };

        debug!(
            strategy = "overflow_area",
            count = meta.count,
            bit_width = meta.bit_width,
            slot_width = slot,
            outliers = plan.overflow.len(),
            words = words.len(),
            "compressed"
        );

        let packed = self.state.insert(Packed {
            metadata: meta,
            slot_width: slot,
            untrimmed_width: plan.untrimmed_width,
            words,
            overflow: plan.overflow,
        });
        Ok(packed.words.as_slice())
    }

    fn decompress(&self) -> Result<Vec<i32>> {
        self.packed()?.decode_all()
    }

    fn get(&self, index: usize) -> Result<i32> {
        let packed = self.packed()?;
        check_index(index, packed.metadata.count)?;
        let slot = dense::read(&packed.words, index, packed.slot_width)?;
        packed.resolve(index, slot)
    }

    fn info(&self) -> Result<CompressionInfo> {
        let packed = self.packed()?;
        Ok(CompressionInfo {
            has_overflow_area: Some(!packed.overflow.is_empty()),
            untrimmed_bit_width: Some(packed.untrimmed_width),
            ..CompressionInfo::new(
                self.kind(),
                &packed.metadata,
                packed.slot_width,
                packed.words.len(),
                packed.overflow.len(),
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
            slot_width: packed.slot_width,
            words: packed.words.clone(),
            overflow: packed.overflow.clone(),
        })
    }

    fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_width() {
        assert_eq!(slot_width(3, 1), 4);
        assert_eq!(slot_width(3, 2), 4);
        assert_eq!(slot_width(2, 9), 5); // 8 needs 4 index bits
        assert_eq!(slot_width(0, 1), 1);
    }

    #[test]
    fn test_threshold_rank() {
        let values: Vec<i32> = (0..100).collect();
        assert_eq!(magnitude_threshold(&values, 95.0), 95);
        assert_eq!(magnitude_threshold(&values, 50.0), 50);
        assert_eq!(magnitude_threshold(&[-8], 95.0), 8);
        assert_eq!(magnitude_threshold(&[3, -9, 1], 99.9), 9);
    }

    #[test]
    fn test_outlier_routed_to_table() {
        let mut values: Vec<i32> = (0..100).collect();
        values.push(1_000_000);

        let mut packer = OverflowArea::new();
        packer.compress(&values).unwrap();

        // Threshold is 95; values 96..=99 still fit the 7-bit frame.
        assert_eq!(
            packer.overflow_table(),
            &[OverflowEntry {
                index: 100,
                value: 1_000_000
            }]
        );
        let info = packer.info().unwrap();
        assert_eq!(info.bit_width, 7);
        assert_eq!(info.slot_width, 8);
        assert_eq!(info.untrimmed_bit_width, Some(20));
        assert_eq!(info.has_overflow_area, Some(true));
        assert_eq!(info.overflow_entries, 1);

        assert!(packer.is_outlier(100));
        assert!(!packer.is_outlier(99));
        assert_eq!(packer.get(100).unwrap(), 1_000_000);
        assert_eq!(packer.get(42).unwrap(), 42);
        assert_eq!(packer.decompress().unwrap(), values);
    }

    #[test]
    fn test_negative_outliers() {
        let mut values: Vec<i32> = (0..200).map(|i| i % 50).collect();
        values[10] = -5_000_000;
        values[150] = i32::MIN;

        for config in [CodecConfig::DEFAULT, CodecConfig::ZIGZAG] {
            let mut packer = OverflowArea::with_config(config).unwrap();
            packer.compress(&values).unwrap();

            let indices: Vec<usize> = packer.overflow_table().iter().map(|e| e.index).collect();
            assert_eq!(indices, vec![10, 150]);
            assert_eq!(packer.get(10).unwrap(), -5_000_000);
            assert_eq!(packer.get(150).unwrap(), i32::MIN);
            assert_eq!(packer.decompress().unwrap(), values);

            let info = packer.info().unwrap();
            assert!(info.bit_width < info.untrimmed_bit_width.unwrap());
        }
    }

    #[test]
    fn test_falls_back_when_table_does_not_pay() {
        // Half the values are "outliers" at the 40th percentile.
        let values: Vec<i32> = (0..100).map(|i| if i % 2 == 0 { 1 } else { 1000 }).collect();
        let mut packer = OverflowArea::with_config(CodecConfig::DEFAULT.with_percentile(40.0)).unwrap();
        packer.compress(&values).unwrap();

        let info = packer.info().unwrap();
        assert_eq!(info.has_overflow_area, Some(false));
        assert_eq!(info.overflow_entries, 0);
        assert_eq!(info.bit_width, 10);
        assert_eq!(info.slot_width, 10);
        assert!(packer.overflow_table().is_empty());
        assert_eq!(packer.decompress().unwrap(), values);
    }

    #[test]
    fn test_uniform_data_has_no_table() {
        let values: Vec<i32> = (0..500).map(|i| (i * 31) % 256).collect();
        let mut packer = OverflowArea::new();
        packer.compress(&values).unwrap();
        let info = packer.info().unwrap();
        assert_eq!(info.has_overflow_area, Some(false));
        assert_eq!(info.bit_width, 8);
        assert_eq!(info.untrimmed_bit_width, Some(8));
    }

    #[test]
    fn test_block_restore() {
        let mut values: Vec<i32> = (0..64).map(|i| i * 3).collect();
        values[7] = 90_000;
        values[33] = -90_000;

        let mut packer = OverflowArea::new();
        packer.compress(&values).unwrap();
        assert_eq!(packer.overflow_table().len(), 2);

        let restored = OverflowArea::from_block(packer.to_block().unwrap()).unwrap();
        assert_eq!(restored.decompress().unwrap(), values);
        assert_eq!(restored.info().unwrap(), packer.info().unwrap());
    }

    #[test]
    fn test_block_restore_detects_tampering() {
        let mut values: Vec<i32> = (0..64).collect();
        values[5] = 1 << 24;
        let mut packer = OverflowArea::new();
        packer.compress(&values).unwrap();

        let mut block = packer.to_block().unwrap();
        block.overflow[0].index = 6;
        assert!(OverflowArea::from_block(block).is_err());

        let mut block = packer.to_block().unwrap();
        block.overflow.clear();
        assert!(OverflowArea::from_block(block).is_err());
    }

    #[test]
    fn test_reset_and_recompress() {
        let mut packer = OverflowArea::new();
        packer.compress(&[1, 2, 3]).unwrap();
        let before = packer.to_block().unwrap();

        packer.reset();
        assert!(packer.get(0).is_err());
        assert!(packer.overflow_table().is_empty());

        packer.compress(&[1, 2, 3]).unwrap();
        assert_eq!(packer.to_block().unwrap(), before);
    }

    #[test]
    fn test_rejects_invalid_percentile() {
        assert!(OverflowArea::with_config(CodecConfig::DEFAULT.with_percentile(100.0)).is_err());
    }
}
