//! Sensor configuration

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::measurement::{MeasurementKind, MeasurementSink, SinkSet};
use crate::core::protocol::ProtocolVariant;
use crate::core::sensor::ProsenseSensor;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Output enabled for a sensor type that does not produce it
    #[error("{variant} does not have {} sensor!", kind.key())]
    UnsupportedSensor {
        /// Configured type
        variant: ProtocolVariant,
        /// Offending output
        kind: MeasurementKind,
    },

    /// Config directory could not be determined
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// TOML parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which outputs are enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorSelection {
    /// CO concentration (CO-100)
    pub carbon_monoxide: bool,
    /// Temperature (DS-RF)
    pub temperature: bool,
    /// Relative humidity (DS-RF)
    pub humidity: bool,
    /// TVOC (DS-RF)
    pub tvoc: bool,
    /// Formaldehyde (DS-RF)
    pub formaldehyde: bool,
}

impl SensorSelection {
    /// Every output the given variant produces
    pub fn all_for(variant: ProtocolVariant) -> Self {
        let mut selection = Self::default();
        for kind in MeasurementKind::all() {
            if kind.source_variant() == variant {
                selection.set(*kind, true);
            }
        }
        selection
    }

    /// Is `kind` enabled?
    pub fn is_enabled(&self, kind: MeasurementKind) -> bool {
        match kind {
            MeasurementKind::CarbonMonoxide => self.carbon_monoxide,
            MeasurementKind::Temperature => self.temperature,
            MeasurementKind::Humidity => self.humidity,
            MeasurementKind::Tvoc => self.tvoc,
            MeasurementKind::Formaldehyde => self.formaldehyde,
        }
    }

    /// Enable or disable `kind`
    pub fn set(&mut self, kind: MeasurementKind, enabled: bool) {
        let flag = match kind {
            MeasurementKind::CarbonMonoxide => &mut self.carbon_monoxide,
            MeasurementKind::Temperature => &mut self.temperature,
            MeasurementKind::Humidity => &mut self.humidity,
            MeasurementKind::Tvoc => &mut self.tvoc,
            MeasurementKind::Formaldehyde => &mut self.formaldehyde,
        };
        *flag = enabled;
    }

    /// Enabled outputs
    pub fn enabled(&self) -> Vec<MeasurementKind> {
        MeasurementKind::all()
            .iter()
            .copied()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }
}

/// Configuration of one Prosense sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProsenseConfig {
    /// Sensor type
    #[serde(rename = "type", deserialize_with = "deserialize_variant")]
    pub variant: ProtocolVariant,
    /// Enabled outputs
    #[serde(default)]
    pub sensors: SensorSelection,
}

fn deserialize_variant<'de, D>(deserializer: D) -> Result<ProtocolVariant, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl ProsenseConfig {
    /// Config for `variant` with every output it supports enabled
    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            variant,
            sensors: SensorSelection::all_for(variant),
        }
    }

    /// Parse and validate TOML
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the default location, if present
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let path = super::default_config_path().ok_or(ConfigError::NoConfigDir)?;
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Pick the config for a run
    ///
    /// An explicit `variant` wins and enables every output it supports;
    /// otherwise `path` is loaded, then the default file. `None` when
    /// nothing applies.
    pub fn resolve(
        variant: Option<ProtocolVariant>,
        path: Option<&Path>,
    ) -> Result<Option<Self>, ConfigError> {
        if let Some(variant) = variant {
            return Ok(Some(Self::new(variant)));
        }
        match path {
            Some(path) => Ok(Some(Self::load(path)?)),
            None => Self::load_default(),
        }
    }

    /// Save config to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject outputs the configured type cannot produce
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in self.sensors.enabled() {
            if kind.source_variant() != self.variant {
                return Err(ConfigError::UnsupportedSensor {
                    variant: self.variant,
                    kind,
                });
            }
        }
        Ok(())
    }

    /// Build a receiver, asking `make_sink` for a sink per enabled output
    pub fn build_sensor<F>(&self, mut make_sink: F) -> Result<ProsenseSensor, ConfigError>
    where
        F: FnMut(MeasurementKind) -> Box<dyn MeasurementSink>,
    {
        self.validate()?;

        let mut sinks = SinkSet::new();
        for kind in self.sensors.enabled() {
            sinks.set_boxed(kind, make_sink(kind));
        }
        Ok(ProsenseSensor::with_sinks(self.variant, sinks))
    }
}
