//! Prosense wire protocol
//!
//! Provides the pieces needed to turn a raw UART byte stream into readings:
//! - Checksum (two's-complement additive, LRC)
//! - Positional framing rules and the per-byte validator
//! - Fixed-capacity frame buffer
//! - Field decoding for CO-100 and DS-RF frames

pub mod checksum;
pub mod decode;
pub mod frame_buffer;
pub mod framing;

pub use checksum::{lrc_checksum, sum8_checksum, verify as verify_checksum};
pub use decode::{decode, CoReading, DecodeError, DecodedReading, MultiGasReading};
pub use frame_buffer::{FrameBuffer, FRAME_BUFFER_CAPACITY};
pub use framing::{validate, ByteRule, ValidationOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============ CO-100 Constants ============
/// CO-100 start marker
pub const CO100_START_BYTE: u8 = 0xFF;
/// CO-100 gas type code for carbon monoxide
pub const CO100_GAS_CO: u8 = 0x19;
/// CO-100 unit code for ppm
pub const CO100_UNIT_PPM: u8 = 0x02;
/// CO-100 frame length including checksum and trailer
pub const CO100_PACKET_LENGTH: usize = 8;

// ============ DS-RF Constants ============
/// DS-RF start marker
pub const DSRF_START_BYTE: u8 = 0xFF;
/// DS-RF reserved marker at position 1
pub const DSRF_RESERVED_BYTE: u8 = 0x05;
/// DS-RF temperature sign byte meaning "positive"
pub const DSRF_TEMP_POSITIVE: u8 = 0x00;
/// DS-RF frame length including checksum and trailer
pub const DSRF_PACKET_LENGTH: usize = 14;

/// Silence (in milliseconds) after which a partial frame is abandoned
pub const RESYNC_TIMEOUT_MS: u32 = 500;

/// Sensor protocol variant, fixed for the lifetime of a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// CO-100 carbon monoxide sensor, 8-byte frame
    #[serde(rename = "CO-100")]
    CoGasFrame,
    /// DS-RF formaldehyde/TVOC/temperature/humidity sensor, 14-byte frame
    #[serde(rename = "DS-RF")]
    MultiGasFrame,
}

impl ProtocolVariant {
    /// Get all supported variants
    pub fn all() -> &'static [ProtocolVariant] {
        &[ProtocolVariant::CoGasFrame, ProtocolVariant::MultiGasFrame]
    }

    /// Sensor type name as printed on the device
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolVariant::CoGasFrame => "CO-100",
            ProtocolVariant::MultiGasFrame => "DS-RF",
        }
    }

    /// Exact frame length in bytes
    pub fn frame_len(&self) -> usize {
        match self {
            ProtocolVariant::CoGasFrame => CO100_PACKET_LENGTH,
            ProtocolVariant::MultiGasFrame => DSRF_PACKET_LENGTH,
        }
    }

    /// Positional rule table for this variant
    pub fn rules(&self) -> &'static [ByteRule] {
        match self {
            ProtocolVariant::CoGasFrame => &framing::CO100_RULES,
            ProtocolVariant::MultiGasFrame => &framing::DSRF_RULES,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown sensor type name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sensor type: {0} (expected CO-100 or DS-RF)")]
pub struct UnknownVariant(pub String);

impl FromStr for ProtocolVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('_', "-").as_str() {
            "CO-100" | "CO100" => Ok(Self::CoGasFrame),
            "DS-RF" | "DSRF" => Ok(Self::MultiGasFrame),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Faults detected while receiving frames
///
/// None of these stop the decoder; each one costs at most the frame in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameFault {
    /// Byte failed a positional rule
    #[error("Unexpected byte 0x{actual:02X} at position {position} (expected 0x{expected:02X})")]
    UnexpectedByte {
        /// Position in the frame
        position: usize,
        /// Required value
        expected: u8,
        /// Received value
        actual: u8,
    },

    /// Checksum byte did not match the covered bytes
    #[error("Checksum mismatch! Expected: 0x{expected:02X}, Got: 0x{actual:02X}")]
    ChecksumMismatch {
        /// Calculated checksum
        expected: u8,
        /// Received checksum byte
        actual: u8,
    },

    /// Buffer filled up without a completed frame
    #[error("Frame buffer overflow after {0} bytes")]
    BufferOverflow(usize),

    /// Decoder was handed a frame of the wrong size
    #[error("Invalid {variant} packet size: {actual} (expected {expected})")]
    WrongLength {
        /// Active variant
        variant: ProtocolVariant,
        /// Required frame length
        expected: usize,
        /// Length actually received
        actual: usize,
    },

    /// Partial frame abandoned after a silent period
    #[error("Stale partial frame of {0} bytes dropped")]
    StaleFrame(usize),
}

impl FrameFault {
    /// Whether this fault latches the warning state
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::BufferOverflow(_) | Self::WrongLength { .. }
        )
    }
}
