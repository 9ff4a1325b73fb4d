//! Back-to-back fixed-width code packing shared by the dense strategies.

use oxipack_core::bitstream::{BitReader, BitWriter, words_for_bits};
use oxipack_core::error::{PackError, Result};
use oxipack_core::frame::Metadata;

/// Pack `count` codes of `width` bits each with no padding between them.
pub(crate) fn pack(
    codes: impl IntoIterator<Item = u32>,
    count: usize,
    width: u8,
) -> Result<Vec<u32>> {
    let mut writer = BitWriter::with_capacity_bits(count as u64 * u64::from(width));
    for code in codes {
        writer.write_bits(code, width)?;
    }
    Ok(writer.into_words())
}

/// Read the code of element `index`.
#[inline]
pub(crate) fn read(words: &[u32], index: usize, width: u8) -> Result<u32> {
    BitReader::new(words).read_bits_at(index as u64 * u64::from(width), width)
}

/// Read all `count` codes in order.
pub(crate) fn read_all(words: &[u32], count: usize, width: u8) -> Result<Vec<u32>> {
    let mut reader = BitReader::new(words);
    (0..count).map(|_| reader.read_bits(width)).collect()
}

/// Fail unless `words` holds exactly `count` slots of `width` bits.
pub(crate) fn check_layout(words: &[u32], count: usize, width: u8) -> Result<()> {
    let expected = words_for_bits(count as u64 * u64::from(width));
    if words.len() != expected {
        return Err(PackError::corrupted(
            0,
            format!(
                "{} words cannot hold {count} slots of {width} bits (expected {expected})",
                words.len()
            ),
        ));
    }
    Ok(())
}

/// Fail unless every code decodes inside the value domain of `metadata`.
///
/// Decoding is monotonic in the code, so checking the largest one suffices.
pub(crate) fn check_codes(
    words: &[u32],
    count: usize,
    width: u8,
    metadata: &Metadata,
) -> Result<()> {
    let mut reader = BitReader::new(words);
    let largest = (0..count).try_fold(None, |max: Option<u32>, _| {
        reader.read_bits(width).map(|code| max.max(Some(code)))
    })?;
    if let Some(code) = largest {
        metadata.decode(code)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_and_read() {
        let codes: Vec<u32> = (0..50).map(|i| (i * 37) % 2048).collect();
        let words = pack(codes.iter().copied(), codes.len(), 11).unwrap();
        assert_eq!(words.len(), words_for_bits(50 * 11));
        assert!(check_layout(&words, 50, 11).is_ok());
        assert!(check_layout(&words, 60, 11).is_err());

        for (i, &code) in codes.iter().enumerate() {
            assert_eq!(read(&words, i, 11).unwrap(), code);
        }
        assert_eq!(read_all(&words, codes.len(), 11).unwrap(), codes);
    }

    #[test]
    fn test_zero_width_needs_no_words() {
        let words = pack([0; 1000], 1000, 0).unwrap();
        assert!(words.is_empty());
        assert_eq!(read(&words, 999, 0).unwrap(), 0);
        assert_eq!(read_all(&words, 3, 0).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_check_codes_against_frame() {
        let meta = Metadata {
            bit_width: 2,
            count: 3,
            base_offset: i64::from(i32::MAX) - 2,
            uses_zigzag: false,
        };
        let fits = pack([0, 2, 1], 3, 2).unwrap();
        assert!(check_codes(&fits, 3, 2, &meta).is_ok());

        let wraps = pack([0, 3, 1], 3, 2).unwrap();
        assert!(matches!(
            check_codes(&wraps, 3, 2, &meta),
            Err(PackError::CorruptedData { .. })
        ));
        assert!(check_codes(&[], 0, 2, &meta).is_ok());
    }
}
