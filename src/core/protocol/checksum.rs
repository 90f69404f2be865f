//! Checksum used by Prosense sensor frames
//!
//! Both frame types carry a single two's-complement additive checksum byte:
//! the 8-bit sum of every byte before it, negated. A frame is intact when the
//! covered bytes plus the checksum byte sum to zero modulo 256.

/// Simple 8-bit sum with wraparound
pub fn sum8_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Two's-complement additive checksum (LRC) over `data`
pub fn lrc_checksum(data: &[u8]) -> u8 {
    (!sum8_checksum(data)).wrapping_add(1)
}

/// Verify a byte range whose last byte is its LRC checksum
///
/// Returns `false` for an empty slice.
pub fn verify(data_with_checksum: &[u8]) -> bool {
    !data_with_checksum.is_empty() && sum8_checksum(data_with_checksum) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_sums_to_zero() {
        let samples: [&[u8]; 5] = [
            &[],
            &[0x00],
            &[0xFF, 0x19, 0x02, 0x02, 0x04, 0xD2],
            &[0xFF; 40],
            b"123456789",
        ];

        for data in samples {
            let cs = lrc_checksum(data);
            assert_eq!(sum8_checksum(data).wrapping_add(cs), 0, "data: {:02X?}", data);
        }
    }

    #[test]
    fn test_lrc_known_value() {
        // 0xFF + 0x19 + 0x02 + 0x02 + 0x04 + 0xD2 = 0x1F2 -> 0xF2, negated 0x0E
        assert_eq!(lrc_checksum(&[0xFF, 0x19, 0x02, 0x02, 0x04, 0xD2]), 0x0E);
        assert_eq!(lrc_checksum(&[]), 0x00);
        assert_eq!(lrc_checksum(&[0x01]), 0xFF);
    }

    #[test]
    fn test_verify() {
        let mut frame = vec![0xFF, 0x05, 0x00, 0x10];
        frame.push(lrc_checksum(&frame));
        assert!(verify(&frame));

        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        assert!(!verify(&frame));
        assert!(!verify(&[]));
    }
}
