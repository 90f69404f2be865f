//! # Prosense Core Library
//!
//! Streaming decoder for Prosense UART gas sensors:
//! - CO-100 carbon monoxide sensor (8-byte frames)
//! - DS-RF formaldehyde / TVOC / temperature / humidity sensor (14-byte frames)
//!
//! ## Features
//!
//! - Byte-at-a-time frame accumulation with silence-based resynchronisation
//! - Positional byte validation and two's-complement checksum
//! - Per-measurement sinks
//! - TOML sensor configuration
//! - Capture replay and a fault-injecting sensor simulator
//! - CLI with exit codes and JSON output
//!
//! ## Example
//!
//! ```rust,no_run
//! use prosense_core::{MemorySource, MeasurementKind, ProsenseSensor, ProtocolVariant, SinkSet};
//!
//! let sinks = SinkSet::new().with(MeasurementKind::CarbonMonoxide, |ppm: f32| {
//!     println!("CO: {ppm} ppm");
//! });
//! let mut sensor = ProsenseSensor::with_sinks(ProtocolVariant::CoGasFrame, sinks);
//!
//! let mut uart = MemorySource::new();
//! uart.push(&[0xFF, 0x19, 0x02, 0x00, 0x00, 0x32, 0xB4, 0x00]);
//! sensor.poll_input(1000, &mut uart);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes, OutputFormat};
pub use crate::config::{ConfigError, ProsenseConfig, SensorSelection};
pub use crate::core::measurement::{MeasurementKind, MeasurementSink, RecordingSink, SinkSet};
pub use crate::core::protocol::{
    decode, lrc_checksum, DecodedReading, FrameFault, ProtocolVariant, ValidationOutcome,
};
pub use crate::core::replay::{replay, Capture, CaptureError};
pub use crate::core::sensor::{ProsenseSensor, SensorStats};
pub use crate::core::simulator::{FaultConfig, Simulator};
pub use crate::core::transport::{ByteSource, MemorySource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
