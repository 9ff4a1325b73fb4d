//! Codec configuration shared by all strategies.

use oxipack_core::error::{PackError, Result};
use oxipack_core::frame::Encoding;
use serde::{Deserialize, Serialize};

/// Default outlier percentile for the overflow area strategy.
pub const DEFAULT_PERCENTILE: f64 = 95.0;

/// Codec configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// How signed values are mapped before packing.
    pub encoding: Encoding,
    /// Percentile of `|v|` above which values may be treated as outliers.
    /// Only used by the overflow area strategy.
    pub percentile: f64,
}

impl CodecConfig {
    /// Offset encoding, 95th percentile outlier threshold.
    pub const DEFAULT: Self = Self {
        encoding: Encoding::Offset,
        percentile: DEFAULT_PERCENTILE,
    };

    /// ZigZag encoding, 95th percentile outlier threshold.
    pub const ZIGZAG: Self = Self {
        encoding: Encoding::ZigZag,
        percentile: DEFAULT_PERCENTILE,
    };

    /// Create a configuration with the given encoding and default percentile.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Self::DEFAULT
        }
    }

    /// Replace the encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replace the outlier percentile.
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    /// Check that every field is inside its domain.
    pub fn validate(&self) -> Result<()> {
        if !self.percentile.is_finite() || self.percentile <= 0.0 || self.percentile >= 100.0 {
            return Err(PackError::invalid_config(format!(
                "percentile must be in (0, 100), got {}",
                self.percentile
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PackError::invalid_config(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert_eq!(config.encoding, Encoding::Offset);
        assert_eq!(config.percentile, 95.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zigzag_config() {
        let config = CodecConfig::ZIGZAG;
        assert_eq!(config.encoding, Encoding::ZigZag);
        assert_eq!(config, CodecConfig::new(Encoding::ZigZag));
    }

    #[test]
    fn test_percentile_domain() {
        for bad in [0.0, 100.0, -5.0, 150.0, f64::NAN, f64::INFINITY] {
            let config = CodecConfig::DEFAULT.with_percentile(bad);
            assert!(
                matches!(config.validate(), Err(PackError::InvalidConfig { .. })),
                "{bad}"
            );
        }
        assert!(CodecConfig::DEFAULT.with_percentile(0.5).validate().is_ok());
        assert!(CodecConfig::DEFAULT.with_percentile(99.9).validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = CodecConfig::from_json(r#"{"percentile": 90.0}"#).unwrap();
        assert_eq!(config.percentile, 90.0);
        assert_eq!(config.encoding, Encoding::Offset);

        let config = CodecConfig::from_json(r#"{"encoding": "zigzag"}"#).unwrap();
        assert_eq!(config, CodecConfig::ZIGZAG);

        assert!(CodecConfig::from_json(r#"{"percentile": 120}"#).is_err());
        assert!(CodecConfig::from_json("not json").is_err());
    }
}
