//! Field decoding for completed frames

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FrameFault, ProtocolVariant, DSRF_TEMP_POSITIVE};
use crate::core::measurement::MeasurementKind;

/// Decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame length does not match the variant
    #[error("Invalid {variant} packet size: {actual} (expected {expected})")]
    WrongLength {
        /// Active variant
        variant: ProtocolVariant,
        /// Required frame length
        expected: usize,
        /// Length handed to the decoder
        actual: usize,
    },
}

impl From<DecodeError> for FrameFault {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::WrongLength {
                variant,
                expected,
                actual,
            } => FrameFault::WrongLength {
                variant,
                expected,
                actual,
            },
        }
    }
}

/// CO-100 reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoReading {
    /// Number of decimal places encoded in the raw value
    pub decimal_places: u8,
    /// Raw concentration
    pub raw_value: u16,
    /// Sensor full scale (diagnostic only)
    pub full_scale: u16,
    /// Concentration in ppm
    pub co_ppm: f32,
}

/// DS-RF reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiGasReading {
    /// Formaldehyde (HCHO) in ppb
    pub formaldehyde_ppb: u16,
    /// VOC in ppb (diagnostic only)
    pub voc_ppb: u16,
    /// Total VOC in ppb
    pub tvoc_ppb: u16,
    /// Temperature in °C
    pub temperature_c: f32,
    /// Relative humidity in %
    pub humidity_pct: f32,
}

/// One decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecodedReading {
    /// From a CO-100 frame
    #[serde(rename = "CO-100")]
    CarbonMonoxide(CoReading),
    /// From a DS-RF frame
    #[serde(rename = "DS-RF")]
    MultiGas(MultiGasReading),
}

impl DecodedReading {
    /// Variant that produced this reading
    pub fn variant(&self) -> ProtocolVariant {
        match self {
            Self::CarbonMonoxide(_) => ProtocolVariant::CoGasFrame,
            Self::MultiGas(_) => ProtocolVariant::MultiGasFrame,
        }
    }

    /// Values that are published to sinks, in publish order
    pub fn measurements(&self) -> Vec<(MeasurementKind, f32)> {
        match self {
            Self::CarbonMonoxide(co) => vec![(MeasurementKind::CarbonMonoxide, co.co_ppm)],
            Self::MultiGas(m) => vec![
                (MeasurementKind::Formaldehyde, f32::from(m.formaldehyde_ppb)),
                (MeasurementKind::Tvoc, f32::from(m.tvoc_ppb)),
                (MeasurementKind::Temperature, m.temperature_c),
                (MeasurementKind::Humidity, m.humidity_pct),
            ],
        }
    }
}

/// Decode a complete frame
///
/// `frame` must be exactly one frame of `variant`, start byte through
/// trailer. Framing and checksum are assumed to have been validated already.
pub fn decode(frame: &[u8], variant: ProtocolVariant) -> Result<DecodedReading, DecodeError> {
    if frame.len() != variant.frame_len() {
        return Err(DecodeError::WrongLength {
            variant,
            expected: variant.frame_len(),
            actual: frame.len(),
        });
    }

    let reading = match variant {
        ProtocolVariant::MultiGasFrame => {
            let sign = if frame[8] == DSRF_TEMP_POSITIVE { 1.0 } else { -1.0 };

            DecodedReading::MultiGas(MultiGasReading {
                formaldehyde_ppb: be_u16(frame, 2),
                voc_ppb: be_u16(frame, 4),
                tvoc_ppb: be_u16(frame, 6),
                temperature_c: sign * (f32::from(frame[9]) + f32::from(frame[10]) / 100.0),
                humidity_pct: f32::from(frame[11]) + f32::from(frame[12]) / 100.0,
            })
        }
        ProtocolVariant::CoGasFrame => {
            let decimal_places = frame[3];
            let raw_value = be_u16(frame, 4);

            let mut co_ppm = f32::from(raw_value);
            if decimal_places > 0 {
                co_ppm /= 10f32.powi(i32::from(decimal_places));
            }

            DecodedReading::CarbonMonoxide(CoReading {
                decimal_places,
                raw_value,
                full_scale: be_u16(frame, 6),
                co_ppm,
            })
        }
    };

    Ok(reading)
}

fn be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}
