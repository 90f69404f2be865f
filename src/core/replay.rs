//! Capture replay
//!
//! Replays recorded UART traffic through a [`ProsenseSensor`] with the
//! recorded timing, so that silence-based resynchronisation behaves as it
//! did on the wire.
//!
//! Text captures hold one chunk per line:
//!
//! ```text
//! # millis  bytes
//! 0     FF 19 02 00 00 32 B4 00
//! 1000  FF1902 0000 32B400
//! ```
//!
//! Binary captures are raw byte dumps and replay as a single chunk at t = 0.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

use super::protocol::DecodedReading;
use super::sensor::ProsenseSensor;
use super::transport::MemorySource;

/// Capture parse/load errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Timestamp field missing or not a number
    #[error("Line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// 1-based line number
        line: usize,
        /// Offending text
        value: String,
    },

    /// Hex payload could not be decoded
    #[error("Line {line}: invalid hex data: {source}")]
    InvalidHex {
        /// 1-based line number
        line: usize,
        /// Decoder error
        #[source]
        source: hex::FromHexError,
    },

    /// Timestamp earlier than the previous line
    #[error("Line {line}: timestamp {at_ms} is before previous timestamp {previous_ms}")]
    TimeWentBackwards {
        /// 1-based line number
        line: usize,
        /// Timestamp on this line
        at_ms: u32,
        /// Previous timestamp
        previous_ms: u32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bytes that arrived together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureChunk {
    /// Arrival time in milliseconds since capture start
    pub at_ms: u32,
    /// Received bytes
    pub data: Vec<u8>,
}

/// Recorded receive traffic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    chunks: Vec<CaptureChunk>,
}

impl Capture {
    /// Create empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text capture format
    pub fn parse_text(text: &str) -> Result<Self, CaptureError> {
        let mut capture = Self::new();
        let mut previous_ms = 0u32;

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw_line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let (stamp, payload) = content
                .split_once(char::is_whitespace)
                .unwrap_or((content, ""));

            let at_ms: u32 = stamp.parse().map_err(|_| CaptureError::InvalidTimestamp {
                line,
                value: stamp.to_string(),
            })?;
            if at_ms < previous_ms {
                return Err(CaptureError::TimeWentBackwards {
                    line,
                    at_ms,
                    previous_ms,
                });
            }
            previous_ms = at_ms;

            let digits: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            let data = hex::decode(&digits).map_err(|source| CaptureError::InvalidHex { line, source })?;
            capture.push(at_ms, data);
        }

        Ok(capture)
    }

    /// Treat a raw byte dump as a single chunk at t = 0
    pub fn from_binary(data: &[u8]) -> Self {
        let mut capture = Self::new();
        capture.push(0, data.to_vec());
        capture
    }

    /// Load a capture file
    pub fn load(path: impl AsRef<Path>, binary: bool) -> Result<Self, CaptureError> {
        if binary {
            Ok(Self::from_binary(&std::fs::read(path)?))
        } else {
            Self::parse_text(&std::fs::read_to_string(path)?)
        }
    }

    /// Append a chunk
    pub fn push(&mut self, at_ms: u32, data: Vec<u8>) {
        self.chunks.push(CaptureChunk { at_ms, data });
    }

    /// Recorded chunks
    pub fn chunks(&self) -> &[CaptureChunk] {
        &self.chunks
    }

    /// Total recorded bytes
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.data.len()).sum()
    }

    /// Timestamp of the last chunk
    pub fn duration_ms(&self) -> u32 {
        self.chunks.last().map_or(0, |c| c.at_ms)
    }

    /// Render in the text capture format
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            let _ = writeln!(out, "{} {}", chunk.at_ms, hex::encode_upper(&chunk.data));
        }
        out
    }
}

/// Reading produced during replay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayedReading {
    /// Capture time of the chunk that completed the frame
    pub at_ms: u32,
    /// Decoded reading
    pub reading: DecodedReading,
}

/// Feed a capture through `sensor`, one poll per chunk
pub fn replay(capture: &Capture, sensor: &mut ProsenseSensor) -> Vec<ReplayedReading> {
    let mut source = MemorySource::new();
    let mut readings = Vec::new();

    for chunk in capture.chunks() {
        source.push(&chunk.data);
        if let Some(reading) = sensor.poll_input(chunk.at_ms, &mut source) {
            readings.push(ReplayedReading {
                at_ms: chunk.at_ms,
                reading,
            });
        }
    }

    readings
}
