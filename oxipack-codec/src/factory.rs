//! Strategy lookup by name.
//!
//! The factory is stateless: every call allocates a fresh instance, so it can
//! be used from any thread. Only the three canonical names are accepted.

use oxipack_core::block::PackedBlock;
use oxipack_core::error::Result;
use oxipack_core::traits::{BitPacker, StrategyKind};
use tracing::trace;

use crate::config::CodecConfig;
use crate::no_overflow::NoOverflow;
use crate::overflow_area::OverflowArea;
use crate::with_overflow::WithOverflow;

/// Create an empty strategy instance with the default configuration.
///
/// # Errors
///
/// `UnknownStrategy` unless `name` is one of [`list_available`].
///
/// # Example
///
/// ```
/// use oxipack_codec::factory;
///
/// let mut packer = factory::create("no_overflow").unwrap();
/// packer.compress(&[10, 20, 30]).unwrap();
/// assert_eq!(packer.get(1).unwrap(), 20);
///
/// assert!(factory::create("overflow").is_err());
/// ```
pub fn create(name: &str) -> Result<Box<dyn BitPacker>> {
    create_with(name, CodecConfig::DEFAULT)
}

/// Create an empty strategy instance with the given configuration.
pub fn create_with(name: &str, config: CodecConfig) -> Result<Box<dyn BitPacker>> {
    create_kind(name.parse()?, config)
}

/// Create an empty instance of `kind`.
pub fn create_kind(kind: StrategyKind, config: CodecConfig) -> Result<Box<dyn BitPacker>> {
    Ok(match kind {
        StrategyKind::WithOverflow => Box::new(WithOverflow::with_config(config)?),
        StrategyKind::NoOverflow => Box::new(NoOverflow::with_config(config)?),
        StrategyKind::OverflowArea => Box::new(OverflowArea::with_config(config)?),
    })
}

/// Names accepted by [`create`], in a stable order.
pub fn list_available() -> impl Iterator<Item = &'static str> {
    StrategyKind::names()
}

/// One-line description of the named strategy.
pub fn describe(name: &str) -> Result<&'static str> {
    Ok(name.parse::<StrategyKind>()?.description())
}

/// Rebuild a compressed instance of the block's strategy.
pub fn restore(block: PackedBlock) -> Result<Box<dyn BitPacker>> {
    trace!(strategy = block.kind.name(), count = block.metadata.count, "restoring block");
    Ok(match block.kind {
        StrategyKind::WithOverflow => Box::new(WithOverflow::from_block(block)?),
        StrategyKind::NoOverflow => Box::new(NoOverflow::from_block(block)?),
        StrategyKind::OverflowArea => Box::new(OverflowArea::from_block(block)?),
    })
}

/// Parse a serialized container and rebuild its strategy.
pub fn from_bytes(data: &[u8]) -> Result<Box<dyn BitPacker>> {
    restore(PackedBlock::from_bytes(data)?)
}
