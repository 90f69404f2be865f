//! Virtual Prosense sensor
//!
//! Builds bit-exact CO-100 and DS-RF frames from readings and produces
//! timestamped captures, optionally with injected link faults. Used for
//! demos, benchmarks and for exercising the receiver against noisy input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::protocol::{
    lrc_checksum, MultiGasReading, ProtocolVariant, CO100_GAS_CO, CO100_PACKET_LENGTH,
    CO100_START_BYTE, CO100_UNIT_PPM, DSRF_PACKET_LENGTH, DSRF_RESERVED_BYTE, DSRF_START_BYTE,
    DSRF_TEMP_POSITIVE, RESYNC_TIMEOUT_MS,
};
use super::replay::Capture;

/// Trailer byte written after the checksum
const FRAME_TRAILER: u8 = 0x00;

/// Build a CO-100 frame
pub fn encode_co_frame(raw_value: u16, decimal_places: u8) -> [u8; CO100_PACKET_LENGTH] {
    let [hi, lo] = raw_value.to_be_bytes();
    let mut frame = [
        CO100_START_BYTE,
        CO100_GAS_CO,
        CO100_UNIT_PPM,
        decimal_places,
        hi,
        lo,
        0,
        FRAME_TRAILER,
    ];
    frame[6] = lrc_checksum(&frame[..6]);
    frame
}

/// Build a DS-RF frame
///
/// Temperature is rounded to hundredths and humidity truncated to whole
/// percent; the humidity hundredths byte is the checksum on the wire.
pub fn encode_multi_gas_frame(reading: &MultiGasReading) -> [u8; DSRF_PACKET_LENGTH] {
    let [hcho_hi, hcho_lo] = reading.formaldehyde_ppb.to_be_bytes();
    let [voc_hi, voc_lo] = reading.voc_ppb.to_be_bytes();
    let [tvoc_hi, tvoc_lo] = reading.tvoc_ppb.to_be_bytes();

    let sign = if reading.temperature_c < 0.0 { 0x01 } else { DSRF_TEMP_POSITIVE };
    let hundredths = (reading.temperature_c.abs() * 100.0).round().clamp(0.0, 25_599.0) as u16;
    let humidity = reading.humidity_pct.floor().clamp(0.0, 255.0) as u8;

    let mut frame = [
        DSRF_START_BYTE,
        DSRF_RESERVED_BYTE,
        hcho_hi,
        hcho_lo,
        voc_hi,
        voc_lo,
        tvoc_hi,
        tvoc_lo,
        sign,
        (hundredths / 100) as u8,
        (hundredths % 100) as u8,
        humidity,
        0,
        FRAME_TRAILER,
    ];
    frame[12] = lrc_checksum(&frame[..12]);
    frame
}

/// Fault probabilities, each in `0.0..=1.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Flip bits in the checksum byte
    pub corrupt_checksum: f64,
    /// Prepend line noise before the frame
    pub garbage: f64,
    /// Cut the frame short
    pub truncate: f64,
    /// Lose the frame entirely
    pub drop: f64,
}

impl FaultConfig {
    /// Any fault enabled?
    pub fn is_enabled(&self) -> bool {
        self.corrupt_checksum > 0.0 || self.garbage > 0.0 || self.truncate > 0.0 || self.drop > 0.0
    }
}

/// Fault applied to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectedFault {
    /// Checksum byte corrupted
    ChecksumCorrupted,
    /// Noise bytes before the frame
    Garbage,
    /// Frame cut short
    Truncated,
    /// Frame never sent
    Dropped,
}

impl InjectedFault {
    /// Does the receiver still decode the frame?
    pub fn frame_survives(&self) -> bool {
        matches!(self, Self::Garbage)
    }
}

/// Seeded fault injector
#[derive(Debug, Clone)]
pub struct FaultInjector {
    config: FaultConfig,
    rng: StdRng,
}

impl FaultInjector {
    /// Create an injector with a fixed seed
    pub fn new(config: FaultConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Maybe damage `frame`
    ///
    /// Returns the bytes to put on the wire and the fault applied, if any.
    /// At most one fault is applied per frame.
    pub fn apply(&mut self, frame: &[u8]) -> (Vec<u8>, Option<InjectedFault>) {
        if self.roll(self.config.drop) {
            return (Vec::new(), Some(InjectedFault::Dropped));
        }

        let mut bytes = frame.to_vec();

        if self.roll(self.config.corrupt_checksum) && bytes.len() >= 2 {
            let idx = bytes.len() - 2;
            bytes[idx] ^= self.rng.gen_range(1..=0xFF);
            return (bytes, Some(InjectedFault::ChecksumCorrupted));
        }

        if self.roll(self.config.truncate) && bytes.len() >= 2 {
            let keep = self.rng.gen_range(1..bytes.len());
            bytes.truncate(keep);
            return (bytes, Some(InjectedFault::Truncated));
        }

        if self.roll(self.config.garbage) {
            // Never a start marker, so the real frame still lines up
            let count = self.rng.gen_range(1..=4);
            let mut noisy: Vec<u8> = (0..count).map(|_| self.rng.gen_range(0..0xFF)).collect();
            noisy.extend_from_slice(&bytes);
            return (noisy, Some(InjectedFault::Garbage));
        }

        (bytes, None)
    }

    fn roll(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.rng.gen_bool(probability.min(1.0))
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationRun {
    /// Generated traffic
    pub capture: Capture,
    /// Frames generated, including damaged and dropped ones
    pub frames: usize,
    /// Faults by capture timestamp
    pub faults: Vec<(u32, InjectedFault)>,
}

impl SimulationRun {
    /// Number of frames a receiver should decode from the capture
    ///
    /// Only holds when [`Simulator::faults_recoverable`] was true for the run.
    pub fn expected_decodes(&self) -> usize {
        self.frames
            - self
                .faults
                .iter()
                .filter(|(_, f)| !f.frame_survives())
                .count()
    }
}

/// Simulated sensor emitting one frame per interval
#[derive(Debug, Clone)]
pub struct Simulator {
    variant: ProtocolVariant,
    interval_ms: u32,
    rng: StdRng,
    injector: Option<FaultInjector>,
}

impl Simulator {
    /// Create a clean simulator
    pub fn new(variant: ProtocolVariant, interval_ms: u32, seed: u64) -> Self {
        Self {
            variant,
            interval_ms,
            rng: StdRng::seed_from_u64(seed),
            injector: None,
        }
    }

    /// Enable fault injection
    #[must_use]
    pub fn with_faults(mut self, config: FaultConfig, seed: u64) -> Self {
        if config.is_enabled() {
            self.injector = Some(FaultInjector::new(config, seed));
        }
        self
    }

    /// Whether every injected fault is cleared before the next frame
    ///
    /// A truncated frame is only abandoned after the resync timeout, so
    /// truncation needs an interval of at least that long.
    pub fn faults_recoverable(&self) -> bool {
        match &self.injector {
            Some(injector) if injector.config.truncate > 0.0 => {
                self.interval_ms >= RESYNC_TIMEOUT_MS
            }
            _ => true,
        }
    }

    /// Next clean frame with plausible values
    pub fn next_frame(&mut self) -> Vec<u8> {
        match self.variant {
            ProtocolVariant::CoGasFrame => {
                let raw = self.rng.gen_range(0..=5000);
                encode_co_frame(raw, 1).to_vec()
            }
            ProtocolVariant::MultiGasFrame => {
                let reading = MultiGasReading {
                    formaldehyde_ppb: self.rng.gen_range(0..=200),
                    voc_ppb: self.rng.gen_range(0..=1000),
                    tvoc_ppb: self.rng.gen_range(0..=1500),
                    temperature_c: self.rng.gen_range(-10.0..40.0),
                    humidity_pct: self.rng.gen_range(20.0..90.0),
                };
                encode_multi_gas_frame(&reading).to_vec()
            }
        }
    }

    /// Generate `count` frames, one per interval starting at t = 0
    pub fn run(&mut self, count: usize) -> SimulationRun {
        let mut run = SimulationRun {
            frames: count,
            ..SimulationRun::default()
        };

        let mut at_ms = 0u32;
        for _ in 0..count {
            let frame = self.next_frame();
            let (bytes, fault) = match self.injector.as_mut() {
                Some(injector) => injector.apply(&frame),
                None => (frame, None),
            };

            if let Some(fault) = fault {
                run.faults.push((at_ms, fault));
            }
            if !bytes.is_empty() {
                run.capture.push(at_ms, bytes);
            }
            at_ms = at_ms.wrapping_add(self.interval_ms);
        }

        run
    }
}
