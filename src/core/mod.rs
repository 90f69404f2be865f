//! Core module containing the main functionality of Prosense
//!
//! This module provides:
//! - Wire protocol: framing rules, checksum and field decoding
//! - Streaming sensor receiver with resynchronisation
//! - Measurement kinds and sinks
//! - Byte sources
//! - Capture replay
//! - Virtual sensor simulation

pub mod measurement;
pub mod protocol;
pub mod replay;
pub mod sensor;
pub mod simulator;
pub mod transport;
