//! Prosense CLI - decode, simulate and inspect Prosense sensor traffic

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use prosense_core::cli::{
    format_reading, io_error_code, print_exit_codes, CliResult, ExitCodes, OutputFormat,
};
use prosense_core::config::{ConfigError, ProsenseConfig};
use prosense_core::core::protocol::{
    lrc_checksum, sum8_checksum, ProtocolVariant, RESYNC_TIMEOUT_MS,
};
use prosense_core::core::replay::{replay, Capture, CaptureError};
use prosense_core::core::sensor::SensorStats;
use prosense_core::core::simulator::{FaultConfig, Simulator};

/// Prosense CLI
#[derive(Parser, Debug)]
#[command(
    name = "prosense",
    version,
    about = "Decoder for Prosense CO-100 and DS-RF UART sensors",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a recorded capture
    Decode {
        /// Sensor type (CO-100, DS-RF)
        #[arg(short, long)]
        r#type: Option<ProtocolVariant>,

        /// Sensor config file, ignored when --type is given (defaults to the user config)
        #[arg(short, long, env = "PROSENSE_CONFIG")]
        config: Option<PathBuf>,

        /// Capture file
        capture: PathBuf,

        /// Capture is a raw byte dump
        #[arg(short, long)]
        binary: bool,
    },

    /// Generate a text capture from a simulated sensor
    Simulate {
        /// Sensor type (CO-100, DS-RF)
        #[arg(short, long)]
        r#type: ProtocolVariant,

        /// Number of frames
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Milliseconds between frames
        #[arg(long, default_value = "1000")]
        interval_ms: u32,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Probability of a corrupted checksum
        #[arg(long, default_value = "0")]
        corrupt: f64,

        /// Probability of line noise before a frame
        #[arg(long, default_value = "0")]
        garbage: f64,

        /// Probability of a truncated frame
        #[arg(long, default_value = "0")]
        truncate: f64,

        /// Probability of a lost frame
        #[arg(long, default_value = "0")]
        drop: f64,
    },

    /// Compute the checksum of hex bytes
    Checksum {
        /// Bytes covered by the checksum (e.g. "FF 19 02 02 04 D2")
        data: String,
    },

    /// Validate a sensor config file
    CheckConfig {
        /// Config file
        file: PathBuf,
    },

    /// Show exit codes
    ExitCodes,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match run(&cli) {
        Ok(result) => result,
        Err(err) => error_result(err),
    };

    match &result {
        CliResult::Success(Some(msg)) if !cli.quiet => println!("{}", msg),
        CliResult::Error(_, msg) => eprintln!("Error: {}", msg),
        _ => {}
    }

    result.to_exit_code()
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<CliResult> {
    match &cli.command {
        Commands::Decode {
            r#type,
            config,
            capture,
            binary,
        } => decode_capture(cli, *r#type, config.as_ref(), capture, *binary),
        Commands::Simulate {
            r#type,
            count,
            interval_ms,
            seed,
            corrupt,
            garbage,
            truncate,
            drop,
        } => {
            let faults = FaultConfig {
                corrupt_checksum: *corrupt,
                garbage: *garbage,
                truncate: *truncate,
                drop: *drop,
            };
            simulate(cli, *r#type, *count, *interval_ms, *seed, faults)
        }
        Commands::Checksum { data } => checksum(cli, data),
        Commands::CheckConfig { file } => check_config(cli, file),
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(CliResult::success())
        }
    }
}

fn decode_capture(
    cli: &Cli,
    variant: Option<ProtocolVariant>,
    config_path: Option<&PathBuf>,
    path: &PathBuf,
    binary: bool,
) -> anyhow::Result<CliResult> {
    let Some(config) = ProsenseConfig::resolve(variant, config_path.map(PathBuf::as_path))
        .context("Failed to load sensor config")?
    else {
        return Ok(CliResult::error(
            ExitCodes::INVALID_ARGS,
            "No sensor type given and no config file found (use --type or --config)",
        ));
    };
    if !path.exists() {
        return Ok(CliResult::file_not_found(&path.display().to_string()));
    }

    let capture = Capture::load(path, binary)
        .with_context(|| format!("Failed to read capture {}", path.display()))?;
    info!(
        chunks = capture.chunks().len(),
        bytes = capture.total_bytes(),
        "Loaded capture"
    );

    let mut sensor = config.build_sensor(|kind| {
        Box::new(move |value: f32| debug!("{} -> {}", kind, kind.format_value(value)))
    })?;
    sensor.dump_config();

    let readings = replay(&capture, &mut sensor);
    for replayed in &readings {
        println!("{}", format_reading(replayed, cli.format, Utc::now()));
    }

    let stats = sensor.stats();
    if !cli.quiet {
        print_stats(cli, &stats);
    }

    if readings.is_empty() {
        return Ok(CliResult::validation_failed(format!(
            "No valid {} frame in {}",
            sensor.variant(),
            path.display()
        )));
    }
    Ok(CliResult::success())
}

fn print_stats(cli: &Cli, stats: &SensorStats) {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", json!({ "stats": stats }));
        }
        OutputFormat::Text => {
            println!();
            println!("Bytes received:    {}", stats.bytes_received);
            println!("Frames decoded:    {}", stats.frames_decoded);
            println!("Framing rejects:   {}", stats.framing_rejects);
            println!("Checksum errors:   {}", stats.checksum_errors);
            println!("Buffer overflows:  {}", stats.overflows);
            println!("Stale resyncs:     {}", stats.stale_resyncs);
            println!("Wrong length:      {}", stats.wrong_length);
            println!("Discarded bytes:   {}", stats.discarded_bytes);
        }
    }
}

fn simulate(
    cli: &Cli,
    variant: ProtocolVariant,
    count: usize,
    interval_ms: u32,
    seed: u64,
    faults: FaultConfig,
) -> anyhow::Result<CliResult> {
    for p in [faults.corrupt_checksum, faults.garbage, faults.truncate, faults.drop] {
        if !(0.0..=1.0).contains(&p) {
            return Ok(CliResult::error(
                ExitCodes::INVALID_ARGS,
                format!("Fault probability {} is outside 0..1", p),
            ));
        }
    }

    let mut simulator = Simulator::new(variant, interval_ms, seed).with_faults(faults, seed.wrapping_add(1));
    if !simulator.faults_recoverable() {
        return Ok(CliResult::error(
            ExitCodes::INVALID_ARGS,
            format!(
                "--truncate needs --interval-ms of at least {} so the receiver can resync",
                RESYNC_TIMEOUT_MS
            ),
        ));
    }
    let run = simulator.run(count);

    match cli.format {
        OutputFormat::Json => {
            let out = json!({
                "type": variant.name(),
                "frames": run.frames,
                "expected_decodes": run.expected_decodes(),
                "faults": run.faults,
                "chunks": run.capture.chunks(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("# {} simulation, seed {}", variant, seed);
                println!(
                    "# frames: {}, faults: {}, expected decodes: {}",
                    run.frames,
                    run.faults.len(),
                    run.expected_decodes()
                );
            }
            print!("{}", run.capture.to_text());
        }
    }

    Ok(CliResult::success())
}

fn checksum(cli: &Cli, data: &str) -> anyhow::Result<CliResult> {
    let digits: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match hex::decode(&digits) {
        Ok(bytes) => bytes,
        Err(err) => {
            return Ok(CliResult::error(
                ExitCodes::INVALID_ARGS,
                format!("Invalid hex data: {}", err),
            ))
        }
    };

    let lrc = lrc_checksum(&bytes);
    match cli.format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "bytes": bytes.len(),
                "sum": format!("{:02X}", sum8_checksum(&bytes)),
                "checksum": format!("{:02X}", lrc),
            })
        ),
        OutputFormat::Text => println!("0x{:02X}", lrc),
    }
    Ok(CliResult::success())
}

fn check_config(cli: &Cli, file: &PathBuf) -> anyhow::Result<CliResult> {
    let config = match ProsenseConfig::load(file) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CliResult::file_not_found(&file.display().to_string()));
        }
        Err(err) => return Ok(err.into()),
    };

    match cli.format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "valid": true,
                "type": config.variant.name(),
                "sensors": config.sensors.enabled().iter().map(|k| k.key()).collect::<Vec<_>>(),
            })
        ),
        OutputFormat::Text => {
            let kinds: Vec<String> = config.sensors.enabled().iter().map(ToString::to_string).collect();
            return Ok(CliResult::success_with_message(format!(
                "{}: OK ({}, sensors: {})",
                file.display(),
                config.variant,
                if kinds.is_empty() { "none".to_string() } else { kinds.join(", ") }
            )));
        }
    }
    Ok(CliResult::success())
}

fn error_result(err: anyhow::Error) -> CliResult {
    let message = format!("{:#}", err);
    let code = if let Some(io) = err.downcast_ref::<std::io::Error>() {
        io_error_code(io.kind())
    } else if let Some(capture) = err.downcast_ref::<CaptureError>() {
        match capture {
            CaptureError::Io(io) => io_error_code(io.kind()),
            _ => ExitCodes::PROTOCOL_ERROR,
        }
    } else if let Some(config) = err.downcast_ref::<ConfigError>() {
        match config {
            ConfigError::Io(io) => io_error_code(io.kind()),
            _ => ExitCodes::CONFIG_ERROR,
        }
    } else {
        ExitCodes::ERROR
    };
    CliResult::error(code, message)
}
