//! Minimum bit width analysis.
//!
//! Widths are computed from the exact bit length of the largest value, never
//! through floating point logarithms, so powers of two land on the right side
//! of the boundary.

/// Number of bits needed to hold `value` (0 for 0).
#[inline]
pub const fn bit_length(value: u32) -> u8 {
    (u32::BITS - value.leading_zeros()) as u8
}

/// Minimum width `w` such that every value is `< 2^w`.
///
/// Returns 0 for an empty sequence or a sequence of zeros.
pub fn required_width(values: impl IntoIterator<Item = u32>) -> u8 {
    values.into_iter().max().map_or(0, bit_length)
}

/// Mask selecting the low `width` bits (`width` in `0..=32`).
#[inline]
pub const fn low_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_length_boundaries() {
        assert_eq!(bit_length(0), 0);
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(2), 2);
        assert_eq!(bit_length(3), 2);
        assert_eq!(bit_length(4), 3);
        assert_eq!(bit_length(255), 8);
        assert_eq!(bit_length(256), 9);
        assert_eq!(bit_length(u32::MAX), 32);
        for shift in 0..32 {
            assert_eq!(bit_length(1 << shift), shift + 1);
            assert_eq!(bit_length((1u32 << shift) - 1), shift);
        }
    }

    #[test]
    fn test_required_width() {
        assert_eq!(required_width([]), 0);
        assert_eq!(required_width([0, 0, 0]), 0);
        assert_eq!(required_width([0, 1, 2, 3, 4]), 3);
        assert_eq!(required_width([999, 5]), 10);
        assert_eq!(required_width([1 << 31]), 32);
    }

    #[test]
    fn test_low_mask() {
        assert_eq!(low_mask(0), 0);
        assert_eq!(low_mask(3), 0b111);
        assert_eq!(low_mask(31), 0x7FFF_FFFF);
        assert_eq!(low_mask(32), u32::MAX);
    }
}
