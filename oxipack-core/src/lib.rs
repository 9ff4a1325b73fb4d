//! # OxiPack Core
//!
//! Core components for the OxiPack integer bit-packing library.
//!
//! This crate provides the building blocks shared by every packing strategy:
//!
//! - [`zigzag`]: Bijective signed/unsigned mapping
//! - [`width`]: Exact minimum bit width computation
//! - [`bitstream`]: Word-oriented bit writer and random-access bit reader
//! - [`frame`]: Frame-of-reference metadata (base offset, width, encoding)
//! - [`traits`]: The [`BitPacker`] trait, strategy kinds and size reports
//! - [`block`]: Self-describing container for packed sequences
//! - [`crc`]: CRC-32 for container integrity
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Strategies (oxipack-codec)                          │
//! │     with_overflow, no_overflow, overflow_area, factory  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Frame (this crate)                                  │
//! │     ZigZag, base offset, bit width analysis             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitWriter/BitReader over u32 words, CRC-32          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::bitstream::{BitReader, BitWriter};
//! use oxipack_core::frame::{Encoding, Metadata};
//!
//! let values = [-3, 0, 4];
//! let meta = Metadata::analyze(&values, Encoding::Offset);
//! assert_eq!(meta.bit_width, 3);
//!
//! let mut writer = BitWriter::new();
//! for &v in &values {
//!     writer.write_bits(meta.encode(v), meta.bit_width).unwrap();
//! }
//! let words = writer.into_words();
//!
//! let reader = BitReader::new(&words);
//! let code = reader.read_bits_at(2 * u64::from(meta.bit_width), meta.bit_width).unwrap();
//! assert_eq!(meta.decode(code).unwrap(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod block;
pub mod crc;
pub mod error;
pub mod frame;
pub mod traits;
pub mod width;
pub mod zigzag;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter, WORD_BITS, WORD_BYTES};
pub use block::{OverflowEntry, PackedBlock};
pub use crc::Crc32;
pub use error::{PackError, Result};
pub use frame::{Encoding, Metadata};
pub use traits::{BitPacker, CompressionInfo, StrategyKind};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::block::{OverflowEntry, PackedBlock};
    pub use crate::error::{PackError, Result};
    pub use crate::frame::{Encoding, Metadata};
    pub use crate::traits::{BitPacker, CompressionInfo, StrategyKind};
}
