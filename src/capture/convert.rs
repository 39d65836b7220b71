//! UTF-16 code units to a big-endian byte stream.
//!
//! Consumers of the captured text read it as pairs of bytes, high byte
//! first. Every code unit is copied on its own: surrogate halves are not
//! paired up or validated.

use crate::error::{CaptureError, CaptureResult};

/// Number of code units before the first `0x0000`.
///
/// A buffer with no terminator is read to its end.
#[inline]
pub fn terminated_len(units: &[u16]) -> usize {
    units.iter().position(|&unit| unit == 0).unwrap_or(units.len())
}

/// Encode the terminated prefix of `units` as big-endian bytes.
pub fn encode_be(units: &[u16]) -> Vec<u8> {
    let len = terminated_len(units);
    units[..len].iter().flat_map(|unit| unit.to_be_bytes()).collect()
}

/// Write the terminated prefix of `units` into `dest`, high byte first.
///
/// Returns the number of code units consumed; `2 ×` that many bytes were
/// written. Nothing is written when `dest` is too small.
pub fn write_be(units: &[u16], dest: &mut [u8]) -> CaptureResult<usize> {
    let len = terminated_len(units);
    let required = len * 2;
    if dest.len() < required {
        return Err(CaptureError::BufferTooSmall {
            required,
            available: dest.len(),
        });
    }

    for (unit, pair) in units[..len].iter().zip(dest.chunks_exact_mut(2)) {
        pair.copy_from_slice(&unit.to_be_bytes());
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_pair() {
        let units = [0x0041, 0x0042, 0x0000];
        let mut dest = [0u8; 4];
        assert_eq!(write_be(&units, &mut dest), Ok(2));
        assert_eq!(dest, [0x00, 0x41, 0x00, 0x42]);
        assert_eq!(encode_be(&units), vec![0x00, 0x41, 0x00, 0x42]);
    }

    #[test]
    fn test_empty_string() {
        let units = [0x0000];
        let mut dest = [0xFFu8; 2];
        assert_eq!(write_be(&units, &mut dest), Ok(0));
        assert_eq!(dest, [0xFF, 0xFF]);
        assert!(encode_be(&units).is_empty());
        assert_eq!(write_be(&units, &mut []), Ok(0));
    }

    #[test]
    fn test_non_ascii_unit() {
        let units = [0x3042, 0x0000];
        let mut dest = [0u8; 2];
        assert_eq!(write_be(&units, &mut dest), Ok(1));
        assert_eq!(dest, [0x30, 0x42]);
    }

    #[test]
    fn test_stops_at_first_terminator() {
        let units = [0x0061, 0x0000, 0x0062, 0x0000];
        assert_eq!(terminated_len(&units), 1);
        assert_eq!(encode_be(&units), vec![0x00, 0x61]);
    }

    #[test]
    fn test_unterminated_buffer_reads_to_end() {
        let units = [0x0061, 0x0062];
        assert_eq!(terminated_len(&units), 2);
        assert_eq!(encode_be(&units), vec![0x00, 0x61, 0x00, 0x62]);
    }

    #[test]
    fn test_surrogates_copied_unit_by_unit() {
        // U+1F600 as a surrogate pair, plus a lone low surrogate.
        let units = [0xD83D, 0xDE00, 0xDC00, 0x0000];
        assert_eq!(encode_be(&units), vec![0xD8, 0x3D, 0xDE, 0x00, 0xDC, 0x00]);
    }

    #[test]
    fn test_destination_too_small_writes_nothing() {
        let units = [0x0041, 0x0042, 0x0000];
        let mut dest = [0xEEu8; 3];
        assert_eq!(
            write_be(&units, &mut dest),
            Err(CaptureError::BufferTooSmall { required: 4, available: 3 })
        );
        assert_eq!(dest, [0xEE; 3]);
    }

    #[test]
    fn test_larger_destination_keeps_tail() {
        let units = [0x0041, 0x0000];
        let mut dest = [0xEEu8; 4];
        assert_eq!(write_be(&units, &mut dest), Ok(1));
        assert_eq!(dest, [0x00, 0x41, 0xEE, 0xEE]);
    }
}
