//! # OxiPack-Codec: Fixed-Width Integer Packing
//!
//! This crate packs sequences of `i32` into 32-bit words using the smallest
//! bit width the data allows, while keeping O(1) random access to every
//! element.
//!
//! ## Strategies
//!
//! | Name | Layout | Trade-off |
//! |------|--------|-----------|
//! | `with_overflow` | back to back, values may span two words | smallest output |
//! | `no_overflow` | 8/16/32-bit lanes, never spans a word | single-word reads |
//! | `overflow_area` | dense common range + outlier table | robust to outliers |
//!
//! All strategies implement [`BitPacker`] and are created by name through
//! [`factory::create`].
//!
//! ## Example
//!
//! ```rust
//! use oxipack_codec::factory;
//!
//! let values = [1, 2, 3, 4, 5];
//! let mut packer = factory::create("with_overflow").unwrap();
//! packer.compress(&values).unwrap();
//!
//! assert_eq!(packer.get(4).unwrap(), 5);
//! assert_eq!(packer.decompress().unwrap(), values);
//!
//! let info = packer.info().unwrap();
//! assert_eq!(info.bit_width, 3);
//! ```
//!
//! ## Persistence
//!
//! Packed words are not self-describing. [`BitPacker::to_block`] exports the
//! words together with the frame metadata (and outlier table), and
//! [`factory::restore`] rebuilds an instance from it:
//!
//! ```rust
//! use oxipack_codec::{compress, factory, StrategyKind};
//!
//! let values = [0, 7, -3, 1_000_000, 2];
//! let bytes = compress(&values, StrategyKind::OverflowArea)
//!     .unwrap()
//!     .to_bytes()
//!     .unwrap();
//!
//! let restored = factory::from_bytes(&bytes).unwrap();
//! assert_eq!(restored.decompress().unwrap(), values);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod config;
mod dense;
pub mod factory;
pub mod no_overflow;
pub mod overflow_area;
pub mod with_overflow;

pub use config::{CodecConfig, DEFAULT_PERCENTILE};
pub use no_overflow::NoOverflow;
pub use overflow_area::OverflowArea;
pub use with_overflow::WithOverflow;
pub use oxipack_core::{
    BitPacker, CompressionInfo, Encoding, Metadata, OverflowEntry, PackError, PackedBlock,
    Result, StrategyKind,
};

/// Pack `values` with the given strategy and default configuration.
///
/// # Returns
///
/// The self-describing packed block.
///
/// # Example
///
/// ```rust
/// use oxipack_codec::{compress, StrategyKind};
///
/// let block = compress(&[100, 101, 102, 103], StrategyKind::NoOverflow).unwrap();
/// assert_eq!(block.metadata.bit_width, 2);
/// assert_eq!(block.slot_width, 8);
/// ```
pub fn compress(values: &[i32], kind: StrategyKind) -> Result<PackedBlock> {
    compress_with(values, kind, CodecConfig::DEFAULT)
}

/// Pack `values` with the given strategy and configuration.
pub fn compress_with(values: &[i32], kind: StrategyKind, config: CodecConfig) -> Result<PackedBlock> {
    let mut packer = factory::create_kind(kind, config)?;
    packer.compress(values)?;
    packer.to_block()
}

/// Restore the values of a packed block.
///
/// # Example
///
/// ```rust
/// use oxipack_codec::{compress, decompress, StrategyKind};
///
/// let values = [-5, 0, 5];
/// let block = compress(&values, StrategyKind::WithOverflow).unwrap();
/// assert_eq!(decompress(&block).unwrap(), values);
/// ```
pub fn decompress(block: &PackedBlock) -> Result<Vec<i32>> {
    factory::restore(block.clone())?.decompress()
}
