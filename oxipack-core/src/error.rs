//! Error types for OxiPack operations.
//!
//! A single error enum covers every recoverable condition of the codec:
//! access errors (bad index, uncompressed instance), construction errors
//! (unknown strategy, invalid configuration) and container decoding errors.

use thiserror::Error;

/// The main error type for OxiPack operations.
#[derive(Debug, Error)]
pub enum PackError {
    /// Element index outside `[0, len)`.
    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of packed elements.
        len: usize,
    },

    /// Strategy name not recognized by the factory.
    #[error("Unknown strategy: '{name}' (available: {available})")]
    UnknownStrategy {
        /// The name that was requested.
        name: String,
        /// Comma separated list of accepted names.
        available: String,
    },

    /// Operation requires a compressed instance.
    #[error("Strategy '{strategy}' holds no compressed data; call compress first")]
    Uncompressed {
        /// Name of the strategy.
        strategy: &'static str,
    },

    /// Input values cannot be packed.
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Description of the problem.
        message: String,
    },

    /// Configuration value out of its valid domain.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Bit width larger than the 32-bit storage word.
    #[error("Invalid bit width: {0} (must be 0-32)")]
    InvalidBitWidth(u8),

    /// Read past the end of the packed buffer.
    #[error("Unexpected end of packed data at bit position {bit_position}")]
    UnexpectedEof {
        /// Bit position of the failed read.
        bit_position: u64,
    },

    /// Invalid magic number in a container header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Container written by an unknown format version.
    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u8),

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#x}, computed {computed:#x}")]
    CrcMismatch {
        /// CRC stored in the container.
        expected: u32,
        /// CRC computed from the data.
        computed: u32,
    },

    /// Structurally invalid container contents.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },
}

/// Result type alias for OxiPack operations.
pub type Result<T> = std::result::Result<T, PackError>;

impl PackError {
    /// Create an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an unknown strategy error.
    pub fn unknown_strategy(name: impl Into<String>, available: &[&str]) -> Self {
        Self::UnknownStrategy {
            name: name.into(),
            available: available.join(", "),
        }
    }

    /// Create an uncompressed state error.
    pub fn uncompressed(strategy: &'static str) -> Self {
        Self::Uncompressed { strategy }
    }

    /// Create a malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(bit_position: u64) -> Self {
        Self::UnexpectedEof { bit_position }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PackError::index_out_of_range(10, 5);
        assert!(err.to_string().contains("Index 10"));
        assert!(err.to_string().contains("length 5"));

        let err = PackError::unknown_strategy("zstd", &["with_overflow", "no_overflow"]);
        assert!(err.to_string().contains("'zstd'"));
        assert!(err.to_string().contains("with_overflow, no_overflow"));

        let err = PackError::crc_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("CRC mismatch"));

        let err = PackError::uncompressed("no_overflow");
        assert!(err.to_string().contains("compress first"));
    }

    #[test]
    fn test_invalid_magic_display() {
        let err = PackError::invalid_magic(*b"OXBP", vec![0x1F, 0x8B, 0, 0]);
        assert!(err.to_string().contains("Invalid magic"));
    }
}
