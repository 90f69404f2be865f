//! Positional framing rules
//!
//! Each frame type is described as a table with one rule per byte position.
//! The validator looks up the rule for the byte just received and decides
//! whether to keep accumulating, drop the partial frame, or hand the frame
//! to the decoder.

use super::checksum::lrc_checksum;
use super::{
    FrameFault, ProtocolVariant, CO100_GAS_CO, CO100_START_BYTE, CO100_UNIT_PPM,
    DSRF_RESERVED_BYTE, DSRF_START_BYTE,
};

/// Rule for a single byte position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRule {
    /// Byte must equal the given value
    Expect(u8),
    /// Any value accepted
    Any,
    /// Byte must equal the LRC of every byte before it
    Checksum,
    /// Last byte of the frame, no constraint
    Terminal,
}

/// CO-100: start, gas type, unit, decimals, value (2), checksum, trailer
pub const CO100_RULES: [ByteRule; 8] = [
    ByteRule::Expect(CO100_START_BYTE),
    ByteRule::Expect(CO100_GAS_CO),
    ByteRule::Expect(CO100_UNIT_PPM),
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Checksum,
    ByteRule::Terminal,
];

/// DS-RF: start, reserved, ten payload bytes, checksum, trailer
pub const DSRF_RULES: [ByteRule; 14] = [
    ByteRule::Expect(DSRF_START_BYTE),
    ByteRule::Expect(DSRF_RESERVED_BYTE),
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Any,
    ByteRule::Checksum,
    ByteRule::Terminal,
];

/// Result of examining one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Byte accepted, keep accumulating
    Continue,
    /// Byte rejected, restart at position 0
    Reject(FrameFault),
    /// Frame fully received; the checksum has already been verified
    FrameComplete,
}

impl ValidationOutcome {
    /// Is this the final byte of a good frame?
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::FrameComplete)
    }
}

/// Validate the byte at `position` of `buffer` for `variant`
///
/// Only `buffer[..=position]` is inspected. A position with no rule
/// (or outside the buffer) is accepted without ever completing a frame.
pub fn validate(buffer: &[u8], position: usize, variant: ProtocolVariant) -> ValidationOutcome {
    let (Some(rule), Some(&byte)) = (variant.rules().get(position), buffer.get(position)) else {
        return ValidationOutcome::Continue;
    };

    match *rule {
        ByteRule::Expect(expected) if byte == expected => ValidationOutcome::Continue,
        ByteRule::Expect(expected) => ValidationOutcome::Reject(FrameFault::UnexpectedByte {
            position,
            expected,
            actual: byte,
        }),
        ByteRule::Any => ValidationOutcome::Continue,
        ByteRule::Checksum => {
            let expected = lrc_checksum(&buffer[..position]);
            if byte == expected {
                ValidationOutcome::Continue
            } else {
                ValidationOutcome::Reject(FrameFault::ChecksumMismatch {
                    expected,
                    actual: byte,
                })
            }
        }
        ByteRule::Terminal => ValidationOutcome::FrameComplete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(frame: &[u8], variant: ProtocolVariant) -> Vec<ValidationOutcome> {
        (0..frame.len()).map(|i| validate(frame, i, variant)).collect()
    }

    fn co_frame() -> Vec<u8> {
        let mut frame = vec![0xFF, 0x19, 0x02, 0x02, 0x04, 0xD2];
        frame.push(lrc_checksum(&frame));
        frame.push(0x00);
        frame
    }

    #[test]
    fn test_co_frame_completes_on_last_byte() {
        let outcomes = run(&co_frame(), ProtocolVariant::CoGasFrame);
        assert!(outcomes[..7].iter().all(|o| *o == ValidationOutcome::Continue));
        assert_eq!(outcomes[7], ValidationOutcome::FrameComplete);
    }

    #[test]
    fn test_co_header_bytes_rejected() {
        let frame = [0xFE, 0x18, 0x03];
        for (pos, expected) in [(0, 0xFF), (1, 0x19), (2, 0x02)] {
            let mut buf = co_frame();
            buf[pos] = frame[pos];
            assert_eq!(
                validate(&buf, pos, ProtocolVariant::CoGasFrame),
                ValidationOutcome::Reject(FrameFault::UnexpectedByte {
                    position: pos,
                    expected,
                    actual: frame[pos],
                })
            );
        }
    }

    #[test]
    fn test_co_checksum_mismatch() {
        let mut frame = co_frame();
        frame[6] = frame[6].wrapping_add(1);
        assert_eq!(
            validate(&frame, 6, ProtocolVariant::CoGasFrame),
            ValidationOutcome::Reject(FrameFault::ChecksumMismatch {
                expected: 0x0E,
                actual: 0x0F,
            })
        );
    }

    #[test]
    fn test_dsrf_rules() {
        let mut frame = vec![0xFF, 0x05, 0, 10, 0, 20, 0, 30, 0x00, 25, 50, 40, 0, 0];
        frame[12] = lrc_checksum(&frame[..12]);
        let outcomes = run(&frame, ProtocolVariant::MultiGasFrame);
        assert!(outcomes[..13].iter().all(|o| *o == ValidationOutcome::Continue));
        assert!(outcomes[13].is_complete());

        frame[1] = 0x06;
        assert!(matches!(
            validate(&frame, 1, ProtocolVariant::MultiGasFrame),
            ValidationOutcome::Reject(FrameFault::UnexpectedByte { position: 1, .. })
        ));
    }

    #[test]
    fn test_position_without_rule_continues() {
        let buf = [0u8; 20];
        assert_eq!(validate(&buf, 15, ProtocolVariant::MultiGasFrame), ValidationOutcome::Continue);
        assert_eq!(validate(&buf, 30, ProtocolVariant::CoGasFrame), ValidationOutcome::Continue);
    }
}
