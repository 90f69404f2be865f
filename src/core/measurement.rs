//! Measurement kinds and output sinks
//!
//! Every decoded value is published to at most one sink per measurement
//! kind. Sinks are optional; a value with no sink is simply dropped.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::protocol::ProtocolVariant;

/// Measurement kinds a Prosense sensor can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Carbon monoxide (CO-100)
    CarbonMonoxide,
    /// Temperature (DS-RF)
    Temperature,
    /// Relative humidity (DS-RF)
    Humidity,
    /// Total volatile organic compounds (DS-RF)
    Tvoc,
    /// Formaldehyde, HCHO (DS-RF)
    Formaldehyde,
}

impl MeasurementKind {
    /// Get all measurement kinds
    pub fn all() -> &'static [MeasurementKind] {
        &[
            MeasurementKind::CarbonMonoxide,
            MeasurementKind::Temperature,
            MeasurementKind::Humidity,
            MeasurementKind::Tvoc,
            MeasurementKind::Formaldehyde,
        ]
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            MeasurementKind::CarbonMonoxide => "CO",
            MeasurementKind::Temperature => "Temperature",
            MeasurementKind::Humidity => "Humidity",
            MeasurementKind::Tvoc => "TVOC",
            MeasurementKind::Formaldehyde => "Formaldehyde",
        }
    }

    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            MeasurementKind::CarbonMonoxide => "carbon_monoxide",
            MeasurementKind::Temperature => "temperature",
            MeasurementKind::Humidity => "humidity",
            MeasurementKind::Tvoc => "tvoc",
            MeasurementKind::Formaldehyde => "formaldehyde",
        }
    }

    /// Unit of measurement
    pub fn unit(&self) -> &'static str {
        match self {
            MeasurementKind::CarbonMonoxide => "ppm",
            MeasurementKind::Temperature => "°C",
            MeasurementKind::Humidity => "%",
            MeasurementKind::Tvoc | MeasurementKind::Formaldehyde => "ppb",
        }
    }

    /// Decimals shown when formatting a value
    pub fn accuracy_decimals(&self) -> usize {
        match self {
            MeasurementKind::Temperature | MeasurementKind::Humidity => 2,
            _ => 0,
        }
    }

    /// Variant whose frames carry this measurement
    pub fn source_variant(&self) -> ProtocolVariant {
        match self {
            MeasurementKind::CarbonMonoxide => ProtocolVariant::CoGasFrame,
            _ => ProtocolVariant::MultiGasFrame,
        }
    }

    /// Format a value with unit and configured precision
    pub fn format_value(&self, value: f32) -> String {
        format!("{:.*} {}", self.accuracy_decimals(), value, self.unit())
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Consumer of one decoded measurement value
pub trait MeasurementSink: Send {
    /// Receive a new value
    fn publish(&mut self, value: f32);
}

impl<F> MeasurementSink for F
where
    F: FnMut(f32) + Send,
{
    fn publish(&mut self, value: f32) {
        self(value)
    }
}

/// One optional sink per measurement kind
#[derive(Default)]
pub struct SinkSet {
    co: Option<Box<dyn MeasurementSink>>,
    temperature: Option<Box<dyn MeasurementSink>>,
    humidity: Option<Box<dyn MeasurementSink>>,
    tvoc: Option<Box<dyn MeasurementSink>>,
    formaldehyde: Option<Box<dyn MeasurementSink>>,
}

impl SinkSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink, replacing any previous one for `kind`
    pub fn set(&mut self, kind: MeasurementKind, sink: impl MeasurementSink + 'static) {
        self.set_boxed(kind, Box::new(sink));
    }

    /// Attach an already boxed sink
    pub fn set_boxed(&mut self, kind: MeasurementKind, sink: Box<dyn MeasurementSink>) {
        *self.slot_mut(kind) = Some(sink);
    }

    /// Attach a sink (builder style)
    #[must_use]
    pub fn with(mut self, kind: MeasurementKind, sink: impl MeasurementSink + 'static) -> Self {
        self.set(kind, sink);
        self
    }

    /// Detach the sink for `kind`
    pub fn clear(&mut self, kind: MeasurementKind) {
        *self.slot_mut(kind) = None;
    }

    /// Is a sink attached for `kind`?
    pub fn is_configured(&self, kind: MeasurementKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Kinds with an attached sink
    pub fn configured(&self) -> Vec<MeasurementKind> {
        MeasurementKind::all()
            .iter()
            .copied()
            .filter(|k| self.is_configured(*k))
            .collect()
    }

    /// Publish to the sink for `kind`, if any
    ///
    /// Returns whether a sink received the value.
    pub fn publish(&mut self, kind: MeasurementKind, value: f32) -> bool {
        match self.slot_mut(kind) {
            Some(sink) => {
                sink.publish(value);
                true
            }
            None => false,
        }
    }

    fn slot(&self, kind: MeasurementKind) -> &Option<Box<dyn MeasurementSink>> {
        match kind {
            MeasurementKind::CarbonMonoxide => &self.co,
            MeasurementKind::Temperature => &self.temperature,
            MeasurementKind::Humidity => &self.humidity,
            MeasurementKind::Tvoc => &self.tvoc,
            MeasurementKind::Formaldehyde => &self.formaldehyde,
        }
    }

    fn slot_mut(&mut self, kind: MeasurementKind) -> &mut Option<Box<dyn MeasurementSink>> {
        match kind {
            MeasurementKind::CarbonMonoxide => &mut self.co,
            MeasurementKind::Temperature => &mut self.temperature,
            MeasurementKind::Humidity => &mut self.humidity,
            MeasurementKind::Tvoc => &mut self.tvoc,
            MeasurementKind::Formaldehyde => &mut self.formaldehyde,
        }
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSet")
            .field("configured", &self.configured())
            .finish()
    }
}

/// Sink that records every value it receives
///
/// Clones share the same storage, so one clone can be handed to a
/// [`SinkSet`] while another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    values: Arc<Mutex<Vec<f32>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Values received so far
    pub fn values(&self) -> Vec<f32> {
        self.values.lock().clone()
    }

    /// Most recent value
    pub fn last(&self) -> Option<f32> {
        self.values.lock().last().copied()
    }

    /// Number of values received
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Nothing received yet?
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Take and clear the recorded values
    pub fn drain(&self) -> Vec<f32> {
        std::mem::take(&mut *self.values.lock())
    }
}

impl MeasurementSink for RecordingSink {
    fn publish(&mut self, value: f32) {
        self.values.lock().push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_metadata() {
        assert_eq!(MeasurementKind::CarbonMonoxide.unit(), "ppm");
        assert_eq!(MeasurementKind::Temperature.format_value(21.456), "21.46 °C");
        assert_eq!(MeasurementKind::Tvoc.format_value(300.0), "300 ppb");
        assert_eq!(
            MeasurementKind::CarbonMonoxide.source_variant(),
            ProtocolVariant::CoGasFrame
        );
        assert!(MeasurementKind::all()
            .iter()
            .filter(|k| **k != MeasurementKind::CarbonMonoxide)
            .all(|k| k.source_variant() == ProtocolVariant::MultiGasFrame));
    }

    #[test]
    fn test_unconfigured_sink_is_noop() {
        let mut sinks = SinkSet::new();
        assert!(!sinks.publish(MeasurementKind::Humidity, 40.0));
        assert!(sinks.configured().is_empty());
    }

    #[test]
    fn test_recording_sink_shares_storage() {
        let recorder = RecordingSink::new();
        let mut sinks = SinkSet::new().with(MeasurementKind::Temperature, recorder.clone());

        assert!(sinks.publish(MeasurementKind::Temperature, 21.5));
        assert!(sinks.publish(MeasurementKind::Temperature, 22.0));
        assert!(!sinks.publish(MeasurementKind::Humidity, 50.0));

        assert_eq!(recorder.values(), vec![21.5, 22.0]);
        assert_eq!(recorder.last(), Some(22.0));
        assert_eq!(recorder.drain().len(), 2);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_closure_sink_and_clear() {
        let total = Arc::new(Mutex::new(0.0f32));
        let shared = Arc::clone(&total);
        let mut sinks = SinkSet::new();
        sinks.set(MeasurementKind::CarbonMonoxide, move |v: f32| *shared.lock() += v);

        sinks.publish(MeasurementKind::CarbonMonoxide, 1.5);
        sinks.publish(MeasurementKind::CarbonMonoxide, 2.0);
        assert_eq!(*total.lock(), 3.5);

        sinks.clear(MeasurementKind::CarbonMonoxide);
        assert!(!sinks.is_configured(MeasurementKind::CarbonMonoxide));
    }
}
