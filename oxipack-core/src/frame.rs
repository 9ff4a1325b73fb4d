//! Frame-of-reference metadata shared by every packing strategy.
//!
//! Values are turned into non-negative codes in two steps: an optional ZigZag
//! transform, then subtraction of the frame base (the minimum transformed
//! value). The code of every value then satisfies
//! `0 <= transform(v) - base_offset < 2^bit_width`.

use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};
use crate::width::bit_length;
use crate::zigzag;

/// How signed values are mapped before the base offset is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Identity transform; the base is the minimum value.
    #[default]
    Offset,
    /// ZigZag transform; the base is the minimum ZigZag code.
    #[serde(rename = "zigzag")]
    ZigZag,
}

impl Encoding {
    /// Map a value into the transformed domain.
    #[inline]
    pub fn transform(self, value: i32) -> i64 {
        match self {
            Self::Offset => i64::from(value),
            Self::ZigZag => i64::from(zigzag::encode(value)),
        }
    }

    /// Inverse of [`transform`](Self::transform).
    ///
    /// Fails with `CorruptedData` when `value` is outside the transformed
    /// domain (`i32` for offset, `u32` for ZigZag).
    #[inline]
    pub fn untransform(self, value: i64) -> Result<i32> {
        let decoded = match self {
            Self::Offset => i32::try_from(value).ok(),
            Self::ZigZag => u32::try_from(value).ok().map(zigzag::decode),
        };
        decoded.ok_or_else(|| {
            PackError::corrupted(0, format!("{value} is outside the {self:?} value domain"))
        })
    }

    /// Whether `value` is a possible result of [`transform`](Self::transform).
    pub fn in_domain(self, value: i64) -> bool {
        match self {
            Self::Offset => i32::try_from(value).is_ok(),
            Self::ZigZag => u32::try_from(value).is_ok(),
        }
    }
}

/// Description of how a packed sequence was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Bits per packed code (0-32).
    pub bit_width: u8,
    /// Number of values.
    pub count: usize,
    /// Frame base subtracted from every transformed value.
    pub base_offset: i64,
    /// Whether values went through ZigZag first.
    pub uses_zigzag: bool,
}

impl Metadata {
    /// Analyze `values` and build the tightest frame that covers all of them.
    pub fn analyze(values: &[i32], encoding: Encoding) -> Self {
        Self::analyze_iter(values.iter().copied(), values.len(), encoding)
    }

    /// Same as [`analyze`](Self::analyze) over a subset of the values.
    ///
    /// `count` is the length of the full sequence, not of the subset.
    pub fn analyze_iter(
        values: impl IntoIterator<Item = i32>,
        count: usize,
        encoding: Encoding,
    ) -> Self {
        let bounds = values
            .into_iter()
            .map(|v| encoding.transform(v))
            .fold(None, |acc: Option<(i64, i64)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            });

        let (base_offset, bit_width) = match bounds {
            // Spread of two transformed i32 values always fits in u32.
            Some((lo, hi)) => (lo, bit_length((hi - lo) as u32)),
            None => (0, 0),
        };

        Self {
            bit_width,
            count,
            base_offset,
            uses_zigzag: encoding == Encoding::ZigZag,
        }
    }

    /// Encoding recorded in this frame.
    pub fn encoding(&self) -> Encoding {
        if self.uses_zigzag {
            Encoding::ZigZag
        } else {
            Encoding::Offset
        }
    }

    /// Fail with `CorruptedData` unless the frame base is a transformed value.
    ///
    /// Frames built by [`analyze`](Self::analyze) always pass.
    pub fn check_base(&self) -> Result<()> {
        let encoding = self.encoding();
        if !encoding.in_domain(self.base_offset) {
            return Err(PackError::corrupted(
                16,
                format!(
                    "base offset {} is outside the {encoding:?} value domain",
                    self.base_offset
                ),
            ));
        }
        Ok(())
    }

    /// Whether `value` can be coded inside this frame.
    pub fn contains(&self, value: i32) -> bool {
        match self.encoding().transform(value).checked_sub(self.base_offset) {
            Some(delta) if delta >= 0 => (delta as u64)
                .checked_shr(u32::from(self.bit_width))
                .is_none_or(|rest| rest == 0),
            _ => false,
        }
    }

    /// Code of `value` relative to the frame base.
    ///
    /// Only meaningful for values accepted by [`contains`](Self::contains).
    #[inline]
    pub fn encode(&self, value: i32) -> u32 {
        self.encoding().transform(value).wrapping_sub(self.base_offset) as u32
    }

    /// Value of a code produced by [`encode`](Self::encode).
    ///
    /// Fails with `CorruptedData` if the code lands outside the value domain,
    /// which only happens for frames that did not come from `analyze`.
    #[inline]
    pub fn decode(&self, code: u32) -> Result<i32> {
        let encoding = self.encoding();
        i64::from(code)
            .checked_add(self.base_offset)
            .ok_or_else(|| {
                PackError::corrupted(0, format!("code {code} overflows base {}", self.base_offset))
            })
            .and_then(|value| encoding.untransform(value))
    }
}
