//! Output formatting for decoded readings

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde_json::{json, Map, Value};

use crate::core::replay::ReplayedReading;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Render one reading
///
/// Text: `[<millis> ms] <type>: <name>=<value> <unit>, ...`
/// JSON: `{"at_ms", "decoded_at", "type", "values": {<key>: <value>}}`
pub fn format_reading(
    replayed: &ReplayedReading,
    format: OutputFormat,
    decoded_at: DateTime<Utc>,
) -> String {
    let measurements = replayed.reading.measurements();
    match format {
        OutputFormat::Text => {
            let fields: Vec<String> = measurements
                .iter()
                .map(|(kind, value)| format!("{}={}", kind.key(), kind.format_value(*value)))
                .collect();
            format!(
                "[{} ms] {}: {}",
                replayed.at_ms,
                replayed.reading.variant(),
                fields.join(", ")
            )
        }
        OutputFormat::Json => {
            let values: Map<String, Value> = measurements
                .iter()
                .map(|(kind, value)| (kind.key().to_string(), json!(value)))
                .collect();
            json!({
                "at_ms": replayed.at_ms,
                "decoded_at": decoded_at.to_rfc3339(),
                "type": replayed.reading.variant().name(),
                "values": values,
            })
            .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::{CoReading, DecodedReading};

    fn co_reading() -> ReplayedReading {
        ReplayedReading {
            at_ms: 1500,
            reading: DecodedReading::CarbonMonoxide(CoReading {
                decimal_places: 2,
                raw_value: 1225,
                full_scale: 0xB300,
                co_ppm: 12.25,
            }),
        }
    }

    #[test]
    fn test_text_format() {
        let line = format_reading(&co_reading(), OutputFormat::Text, Utc::now());
        assert_eq!(line, "[1500 ms] CO-100: carbon_monoxide=12 ppm");
    }

    #[test]
    fn test_json_format() {
        let line = format_reading(&co_reading(), OutputFormat::Json, Utc::now());
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["at_ms"], 1500);
        assert_eq!(value["type"], "CO-100");
        assert_eq!(value["values"]["carbon_monoxide"], 12.25);
        assert!(value["decoded_at"].is_string());
    }
}
