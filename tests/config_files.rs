//! Config files and capture files on disk

use std::io::Write;

use prosense_core::config::{ConfigError, ProsenseConfig};
use prosense_core::core::measurement::{MeasurementKind, RecordingSink};
use prosense_core::core::protocol::ProtocolVariant;
use prosense_core::core::replay::{replay, Capture, CaptureError};
use prosense_core::core::simulator::Simulator;

#[test]
fn config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prosense.toml");

    let mut config = ProsenseConfig::new(ProtocolVariant::MultiGasFrame);
    config.sensors.set(MeasurementKind::Formaldehyde, false);
    config.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("type = \"DS-RF\""));

    let loaded = ProsenseConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn config_with_foreign_sensor_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "type = \"DS-RF\"").unwrap();
    writeln!(file, "[sensors]").unwrap();
    writeln!(file, "carbon_monoxide = true").unwrap();

    let err = ProsenseConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedSensor { .. }));
    assert_eq!(err.to_string(), "DS-RF does not have carbon_monoxide sensor!");
}

#[test]
fn missing_config_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProsenseConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn configured_sinks_receive_replayed_values() {
    let mut config = ProsenseConfig::new(ProtocolVariant::CoGasFrame);
    config.sensors.set(MeasurementKind::CarbonMonoxide, true);

    let recorder = RecordingSink::new();
    let mut sensor = config
        .build_sensor(|_| Box::new(recorder.clone()))
        .unwrap();

    let run = Simulator::new(ProtocolVariant::CoGasFrame, 1000, 5).run(6);
    let readings = replay(&run.capture, &mut sensor);

    assert_eq!(readings.len(), 6);
    assert_eq!(recorder.len(), 6);
}

#[test]
fn capture_files_text_and_binary() {
    let dir = tempfile::tempdir().unwrap();
    let run = Simulator::new(ProtocolVariant::MultiGasFrame, 1000, 9).run(3);

    let text_path = dir.path().join("capture.txt");
    std::fs::write(&text_path, run.capture.to_text()).unwrap();
    let loaded = Capture::load(&text_path, false).unwrap();
    assert_eq!(loaded, run.capture);

    // A raw dump is one burst, so only the first frame survives
    let bin_path = dir.path().join("capture.bin");
    let raw: Vec<u8> = run.capture.chunks().iter().flat_map(|c| c.data.clone()).collect();
    std::fs::write(&bin_path, &raw).unwrap();
    let burst = Capture::load(&bin_path, true).unwrap();
    let mut sensor = prosense_core::core::sensor::ProsenseSensor::new(ProtocolVariant::MultiGasFrame);
    assert_eq!(replay(&burst, &mut sensor).len(), 1);
}

#[test]
fn capture_with_bad_hex_reports_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# recorded on bench").unwrap();
    writeln!(file, "0 FF05").unwrap();
    writeln!(file, "100 FZ").unwrap();

    let err = Capture::load(file.path(), false).unwrap_err();
    assert!(matches!(err, CaptureError::InvalidHex { line: 3, .. }));
}
