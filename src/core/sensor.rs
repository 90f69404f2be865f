//! Prosense sensor receiver
//!
//! Owns the frame buffer and timing state for one sensor and drives the
//! accumulate → validate → decode pipeline. The host calls
//! [`ProsenseSensor::poll_input`] periodically; each call only consumes bytes
//! that are already available and never blocks.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::measurement::SinkSet;
use super::protocol::{
    decode, validate, DecodedReading, FrameBuffer, FrameFault, ProtocolVariant,
    ValidationOutcome, FRAME_BUFFER_CAPACITY, RESYNC_TIMEOUT_MS,
};
use super::transport::ByteSource;

/// Receiver statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStats {
    /// Bytes read from the source
    pub bytes_received: u64,
    /// Frames decoded successfully
    pub frames_decoded: u64,
    /// Bytes rejected by a positional rule
    pub framing_rejects: u64,
    /// Frames dropped on a bad checksum
    pub checksum_errors: u64,
    /// Buffer overflows
    pub overflows: u64,
    /// Partial frames abandoned after silence
    pub stale_resyncs: u64,
    /// Complete frames with an unexpected length
    pub wrong_length: u64,
    /// Bytes thrown away after a completed frame
    pub discarded_bytes: u64,
}

/// Streaming receiver for one Prosense sensor
///
/// `N` is the receive buffer capacity.
#[derive(Debug)]
pub struct ProsenseSensor<const N: usize = FRAME_BUFFER_CAPACITY> {
    variant: ProtocolVariant,
    buffer: FrameBuffer<N>,
    last_transmission: u32,
    sinks: SinkSet,
    stats: SensorStats,
    warning: bool,
    last_fault: Option<FrameFault>,
}

impl ProsenseSensor {
    /// Create a receiver with no sinks attached
    pub fn new(variant: ProtocolVariant) -> Self {
        Self::with_sinks(variant, SinkSet::new())
    }

    /// Create a receiver publishing to `sinks`
    pub fn with_sinks(variant: ProtocolVariant, sinks: SinkSet) -> Self {
        ProsenseSensor::with_buffer(variant, sinks)
    }
}

impl<const N: usize> ProsenseSensor<N> {
    /// Create a receiver with an `N`-byte receive buffer
    pub fn with_buffer(variant: ProtocolVariant, sinks: SinkSet) -> Self {
        Self {
            variant,
            buffer: FrameBuffer::new(),
            last_transmission: 0,
            sinks,
            stats: SensorStats::default(),
            warning: false,
            last_fault: None,
        }
    }

    /// Active protocol variant
    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Current write position in the frame buffer
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Attached sinks
    pub fn sinks_mut(&mut self) -> &mut SinkSet {
        &mut self.sinks
    }

    /// Statistics since creation
    pub fn stats(&self) -> SensorStats {
        self.stats
    }

    /// Is the warning latched?
    ///
    /// Set by checksum errors, overflows and bad frame lengths; cleared by
    /// the next successful decode.
    pub fn has_warning(&self) -> bool {
        self.warning
    }

    /// Most recent fault that latched the warning, kept after it clears
    pub fn last_fault(&self) -> Option<FrameFault> {
        self.last_fault
    }

    /// Drain available input
    ///
    /// `now` is a millisecond counter that may wrap. Returns the reading
    /// decoded during this call, if any; it has already been published to
    /// the configured sinks.
    pub fn poll_input<S>(&mut self, now: u32, source: &mut S) -> Option<DecodedReading>
    where
        S: ByteSource + ?Sized,
    {
        if now.wrapping_sub(self.last_transmission) >= RESYNC_TIMEOUT_MS {
            // last transmission too long ago
            if self.buffer.position() > 0 {
                self.record_fault(FrameFault::StaleFrame(self.buffer.position()));
            }
            self.buffer.reset();
        }

        if source.available() == 0 {
            return None;
        }

        self.last_transmission = now;
        while source.available() != 0 {
            if self.buffer.is_full() {
                self.record_fault(FrameFault::BufferOverflow(self.buffer.capacity()));
                self.buffer.reset();
                return None;
            }

            let Some(byte) = source.read_byte() else {
                break;
            };
            self.stats.bytes_received += 1;
            let stored = self.buffer.write(byte);
            debug_assert!(stored, "write into a full frame buffer");

            match validate(self.buffer.frame(), self.buffer.position(), self.variant) {
                ValidationOutcome::Continue => self.buffer.advance(),
                ValidationOutcome::Reject(fault) => {
                    self.record_fault(fault);
                    self.buffer.reset();
                }
                ValidationOutcome::FrameComplete => {
                    let reading = self.parse_frame();
                    self.buffer.reset();

                    let dropped = source.discard_available();
                    if dropped > 0 {
                        trace!(dropped, "Cleared RX buffer after frame");
                    }
                    self.stats.discarded_bytes += dropped as u64;
                    return reading;
                }
            }
        }

        None
    }

    /// Log the active configuration
    pub fn dump_config(&self) {
        info!("Prosense:");
        info!("  Type: {}", self.variant);
        for kind in self.sinks.configured() {
            info!("  {} sensor ({})", kind, kind.unit());
        }
    }

    fn parse_frame(&mut self) -> Option<DecodedReading> {
        let reading = match decode(self.buffer.frame(), self.variant) {
            Ok(reading) => reading,
            Err(err) => {
                self.record_fault(err.into());
                return None;
            }
        };

        match &reading {
            DecodedReading::MultiGas(m) => debug!(
                "Got DS-RF - HCHO: {} ppb, VOC: {} ppb, TVOC: {} ppb, Temperature: {:.2}°C, Humidity: {:.2}%",
                m.formaldehyde_ppb, m.voc_ppb, m.tvoc_ppb, m.temperature_c, m.humidity_pct
            ),
            DecodedReading::CarbonMonoxide(co) => debug!(
                "Got CO: {:.3} ppm (full scale: {}, raw: {}, decimal places: {})",
                co.co_ppm, co.full_scale, co.raw_value, co.decimal_places
            ),
        }

        for (kind, value) in reading.measurements() {
            self.sinks.publish(kind, value);
        }

        self.stats.frames_decoded += 1;
        self.warning = false;
        Some(reading)
    }

    fn record_fault(&mut self, fault: FrameFault) {
        match fault {
            FrameFault::UnexpectedByte { position: 0, .. } => {
                self.stats.framing_rejects += 1;
                trace!("{}", fault);
            }
            FrameFault::UnexpectedByte { .. } => {
                self.stats.framing_rejects += 1;
                debug!("{}", fault);
            }
            FrameFault::ChecksumMismatch { .. } => {
                self.stats.checksum_errors += 1;
                warn!("{}", fault);
            }
            FrameFault::BufferOverflow(_) => {
                self.stats.overflows += 1;
                warn!("{}", fault);
            }
            FrameFault::WrongLength { .. } => {
                self.stats.wrong_length += 1;
                warn!("{}", fault);
            }
            FrameFault::StaleFrame(_) => {
                self.stats.stale_resyncs += 1;
                trace!("{}", fault);
            }
        }

        if fault.is_warning() {
            self.warning = true;
            self.last_fault = Some(fault);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::measurement::{MeasurementKind, RecordingSink};
    use crate::core::protocol::lrc_checksum;
    use crate::core::transport::MemorySource;

    fn co_frame(decimals: u8, raw: u16) -> Vec<u8> {
        let [hi, lo] = raw.to_be_bytes();
        let mut frame = vec![0xFF, 0x19, 0x02, decimals, hi, lo];
        frame.push(lrc_checksum(&frame));
        frame.push(0x00);
        frame
    }

    fn co_sensor() -> (ProsenseSensor, RecordingSink) {
        let recorder = RecordingSink::new();
        let sinks = SinkSet::new().with(MeasurementKind::CarbonMonoxide, recorder.clone());
        (ProsenseSensor::with_sinks(ProtocolVariant::CoGasFrame, sinks), recorder)
    }

    #[test]
    fn test_decodes_frame_in_one_poll() {
        let (mut sensor, recorder) = co_sensor();
        let mut source = MemorySource::from_bytes(&co_frame(0, 50));

        let reading = sensor.poll_input(1000, &mut source);
        assert!(reading.is_some());
        assert_eq!(recorder.values(), vec![50.0]);
        assert_eq!(sensor.position(), 0);
        assert_eq!(sensor.stats().frames_decoded, 1);
        assert_eq!(sensor.stats().bytes_received, 8);
    }

    #[test]
    fn test_no_input_has_no_side_effects() {
        let (mut sensor, recorder) = co_sensor();
        let mut source = MemorySource::new();
        assert!(sensor.poll_input(10, &mut source).is_none());
        assert_eq!(sensor.stats(), SensorStats::default());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_frame_split_across_polls() {
        let (mut sensor, recorder) = co_sensor();
        let frame = co_frame(1, 123);
        let mut source = MemorySource::new();

        source.push(&frame[..3]);
        assert!(sensor.poll_input(1000, &mut source).is_none());
        assert_eq!(sensor.position(), 3);

        source.push(&frame[3..]);
        assert!(sensor.poll_input(1100, &mut source).is_some());
        assert!((recorder.last().unwrap() - 12.3).abs() < 1e-4);
    }

    #[test]
    fn test_trailing_bytes_discarded_after_frame() {
        let (mut sensor, recorder) = co_sensor();
        let mut data = co_frame(0, 7);
        data.extend_from_slice(&co_frame(0, 8));
        let mut source = MemorySource::from_bytes(&data);

        sensor.poll_input(1000, &mut source);
        assert_eq!(recorder.values(), vec![7.0]);
        assert_eq!(source.available(), 0);
        assert_eq!(sensor.stats().discarded_bytes, 8);
    }

    #[test]
    fn test_checksum_mismatch_latches_warning() {
        let (mut sensor, recorder) = co_sensor();
        let mut bad = co_frame(0, 50);
        bad[6] ^= 0x55;
        let mut source = MemorySource::from_bytes(&bad);

        assert!(sensor.poll_input(1000, &mut source).is_none());
        assert!(recorder.is_empty());
        assert!(sensor.has_warning());
        assert_eq!(sensor.stats().checksum_errors, 1);
        assert!(matches!(sensor.last_fault(), Some(FrameFault::ChecksumMismatch { .. })));

        source.push(&co_frame(0, 51));
        assert!(sensor.poll_input(1010, &mut source).is_some());
        assert!(!sensor.has_warning());
        assert_eq!(recorder.values(), vec![51.0]);
        assert!(sensor.last_fault().is_some());
    }

    #[test]
    fn test_stale_prefix_abandoned() {
        let (mut sensor, recorder) = co_sensor();
        let frame = co_frame(0, 50);
        let mut source = MemorySource::from_bytes(&frame[..4]);
        sensor.poll_input(1000, &mut source);
        assert_eq!(sensor.position(), 4);

        // Nothing arrives, but the silence check still runs
        sensor.poll_input(1499, &mut source);
        assert_eq!(sensor.position(), 4);
        sensor.poll_input(1500, &mut source);
        assert_eq!(sensor.position(), 0);
        assert_eq!(sensor.stats().stale_resyncs, 1);

        source.push(&frame[4..]);
        assert!(sensor.poll_input(1501, &mut source).is_none());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_timestamp_wraparound() {
        let (mut sensor, recorder) = co_sensor();
        let frame = co_frame(0, 9);
        let mut source = MemorySource::from_bytes(&frame[..4]);
        sensor.poll_input(u32::MAX - 100, &mut source);

        source.push(&frame[4..]);
        // 201 ms later across the wrap
        assert!(sensor.poll_input(100, &mut source).is_some());
        assert_eq!(recorder.values(), vec![9.0]);
    }

    #[test]
    fn test_overflow_resets_and_stops_poll() {
        let recorder = RecordingSink::new();
        let sinks = SinkSet::new().with(MeasurementKind::Temperature, recorder.clone());
        let mut sensor = ProsenseSensor::<8>::with_buffer(ProtocolVariant::MultiGasFrame, sinks);

        // 14-byte frame into an 8-byte buffer: every byte passes its rule
        let mut frame = vec![0xFF, 0x05, 0, 1, 0, 2, 0, 3, 0, 20, 0, 40];
        frame.push(lrc_checksum(&frame));
        frame.push(0x00);
        let mut source = MemorySource::from_bytes(&frame);

        assert!(sensor.poll_input(1000, &mut source).is_none());
        assert_eq!(sensor.stats().overflows, 1);
        assert_eq!(sensor.stats().bytes_received, 8);
        assert!(sensor.has_warning());
        assert_eq!(sensor.last_fault(), Some(FrameFault::BufferOverflow(8)));
        assert_eq!(sensor.position(), 0);
        assert_eq!(source.available(), 6);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_noise_never_advances_position() {
        let (mut sensor, _) = co_sensor();
        let mut source = MemorySource::from_bytes(&[0x00; 200]);
        sensor.poll_input(1000, &mut source);
        assert_eq!(sensor.position(), 0);
        assert_eq!(sensor.stats().framing_rejects, 200);
        assert_eq!(sensor.stats().overflows, 0);
        assert!(!sensor.has_warning());
    }
}
